//! Symbolic stack interpreter
//!
//! `StatementReader` walks a straight-line run of instructions, keeping a
//! virtual operand stack of expression nodes, and emits statements into the
//! tree. Reading stops at a return, at the end of the body, or at a
//! conditional jump, which is handed to the control flow reconstruction in
//! `control_flow`.

pub mod control_flow;
pub mod locals;
pub mod stack;

pub use locals::{Load, LocalTable};
pub use stack::VirtualStack;

use crate::error::{LiftError, LiftResult};
use crate::lift::{LiftContext, lift_body};
use crate::tree::{
    Arguments, Expression, Literal, NestedClosure, NodeId, Number, Operator, Statement, Tree,
};
use quarry_bytecode::{
    ArithmeticOp, ClosureFactory, FieldRef, Instruction, InstructionCursor, InvokeKind, Label,
    MethodRef, TypeRef,
};
use smallvec::smallvec;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub struct StatementReader<'b, 'c> {
    cursor: InstructionCursor<'b>,
    locals: LocalTable,
    stack: VirtualStack,
    statements: Vec<NodeId>,
    context: &'c LiftContext<'c>,
    branch_depth: usize,
}

impl<'b, 'c> StatementReader<'b, 'c> {
    pub fn new(
        cursor: InstructionCursor<'b>,
        locals: LocalTable,
        context: &'c LiftContext<'c>,
    ) -> Self {
        Self {
            cursor,
            locals,
            stack: VirtualStack::new(),
            statements: Vec::new(),
            context,
            branch_depth: 0,
        }
    }

    /// Read statements until a return, a branch or the end of the body.
    pub fn read(mut self, tree: &mut Tree) -> LiftResult<Vec<NodeId>> {
        while let Some(instruction) = self.cursor.next() {
            let position = self.cursor.current_index().unwrap_or_default();
            trace!(position, %instruction, depth = self.stack.depth(), "reading instruction");
            let flow = self
                .step(tree, instruction, position)
                .map_err(|err| err.at(position))?;
            if flow == Flow::Stop {
                break;
            }
        }
        Ok(self.statements)
    }

    fn step(
        &mut self,
        tree: &mut Tree,
        instruction: &Instruction,
        position: usize,
    ) -> LiftResult<Flow> {
        match instruction {
            Instruction::Nop | Instruction::CheckCast(_) => {}

            Instruction::Const(constant) => {
                let literal = tree.add_literal(Literal::from_constant(constant));
                self.stack.push(literal);
            }

            Instruction::Load { slot, .. } => {
                let id = match self.locals.resolve(self.cursor.body(), *slot, position)? {
                    Load::Bound(id) => id,
                    Load::Capture { index, ty } => {
                        tree.add_expression(Expression::Capture { index, ty })
                    }
                    Load::Local { slot, name, ty } => {
                        tree.add_expression(Expression::Local { slot, name, ty })
                    }
                };
                self.stack.push(id);
            }

            Instruction::Store { slot, .. } => {
                let value = self.stack.pop(instruction)?;
                self.locals.bind(*slot, value);
            }

            Instruction::GetField(field) => {
                let source = self.stack.pop(instruction)?;
                self.push_field_access(tree, source, field);
            }

            Instruction::GetStatic(field) => {
                let source = class_literal(tree, &field.owner);
                self.push_field_access(tree, source, field);
            }

            Instruction::PutField(field) | Instruction::PutStatic(field) => {
                let value = self.stack.pop(instruction)?;
                let source = if matches!(instruction, Instruction::PutStatic(_)) {
                    class_literal(tree, &field.owner)
                } else {
                    self.stack.pop(instruction)?
                };
                let value = cast_literal(tree, value, &field.ty)?;
                let target = tree.add_expression(Expression::FieldAccess {
                    source,
                    field: field.clone(),
                });
                let assign = tree.add_statement(Statement::Assign { target, value });
                self.statements.push(assign);
            }

            Instruction::Invoke { kind, method } => {
                self.invoke(tree, instruction, *kind, method, position)?;
            }

            Instruction::InvokeDynamic(factory) => {
                self.nested_closure(tree, instruction, factory, position)?;
            }

            Instruction::Arithmetic { op, .. } => {
                let right = self.stack.pop(instruction)?;
                let left = self.stack.pop(instruction)?;
                let operation = arithmetic(tree, *op, left, right)?;
                self.stack.push(operation);
            }

            Instruction::Negate(_) => {
                let operand = self.stack.pop(instruction)?;
                let negated = match tree.literal(operand) {
                    Some(Literal::Number(number)) => {
                        let number = number.negated();
                        tree.add_literal(Literal::Number(number))
                    }
                    _ => {
                        let kind = tree
                            .expression(operand)
                            .map_or("statement", Expression::kind_name);
                        return Err(LiftError::unsupported(
                            format!("arithmetic negation of a {}", kind),
                            Some(position),
                        ));
                    }
                };
                self.stack.push(negated);
            }

            Instruction::Convert { to, .. } => {
                let operand = self.stack.pop(instruction)?;
                let converted = cast_literal(tree, operand, to)?;
                self.stack.push(converted);
            }

            Instruction::Compare(_) => {
                let right = self.stack.pop(instruction)?;
                let left = self.stack.pop(instruction)?;
                let compare = tree.add_operation(Operator::Compare, smallvec![left, right]);
                self.stack.push(compare);
            }

            Instruction::Jump { op, target } => {
                let branch = self.read_branch(tree, instruction, *op, *target, position)?;
                self.statements.push(branch);
                return Ok(Flow::Stop);
            }

            Instruction::Goto(label) => {
                self.jump_forward(*label, position)?;
            }

            Instruction::Return(Some(_)) => {
                let value = self.stack.pop(instruction)?;
                let return_type = &self.cursor.body().descriptor.return_type;
                let value = cast_literal(tree, value, return_type)?;
                let ret = tree.add_statement(Statement::Return(value));
                self.statements.push(ret);
                return Ok(Flow::Stop);
            }

            Instruction::Return(None) => {
                let leftovers: Vec<NodeId> = self.stack.drain().collect();
                for value in leftovers {
                    let stmt = tree.add_statement(Statement::Expression(value));
                    self.statements.push(stmt);
                }
                return Ok(Flow::Stop);
            }

            Instruction::NewArray(element) => {
                let length = self.stack.pop(instruction)?;
                let length = match tree.literal(length) {
                    Some(Literal::Number(Number::Int(n)))
                        if *n >= 0 && (*n as usize) <= self.context.config.max_instructions =>
                    {
                        *n as usize
                    }
                    _ => {
                        return Err(LiftError::unsupported(
                            "array creation with a non-constant length",
                            Some(position),
                        ));
                    }
                };
                let elements = (0..length)
                    .map(|_| tree.add_literal(Literal::default_for(element)))
                    .collect();
                let array = tree.add_expression(Expression::ArrayLiteral {
                    element: element.clone(),
                    elements,
                });
                self.stack.push(array);
            }

            Instruction::ArrayLoad(kind) => {
                let index = self.stack.pop(instruction)?;
                let array = self.stack.pop(instruction)?;
                let ty = match tree.type_of(array) {
                    TypeRef::Array(element) => *element,
                    _ => kind.type_ref(),
                };
                let element = tree.add_expression(Expression::ArrayElement { array, index, ty });
                self.stack.push(element);
            }

            Instruction::ArrayStore(kind) => {
                let value = self.stack.pop(instruction)?;
                let index = self.stack.pop(instruction)?;
                let array = self.stack.pop(instruction)?;
                self.array_store(tree, array, index, value, kind.type_ref())?;
            }

            Instruction::New(class) => {
                let new = tree.add_expression(Expression::New {
                    class: class.clone(),
                    arguments: None,
                });
                self.stack.push(new);
            }

            Instruction::InstanceOf(ty) => {
                let source = self.stack.pop(instruction)?;
                let test = tree.add_expression(Expression::InstanceOf {
                    source,
                    ty: ty.clone(),
                });
                self.stack.push(test);
            }

            Instruction::Dup => {
                let top = self.stack.peek().ok_or_else(|| {
                    LiftError::structural(format!("`{}` on an empty operand stack", instruction))
                })?;
                self.stack.push(top);
            }

            Instruction::Pop => {
                let value = self.stack.pop(instruction)?;
                if matches!(
                    tree.expression(value),
                    Some(Expression::MethodInvocation { .. } | Expression::New { .. })
                ) {
                    let stmt = tree.add_statement(Statement::Expression(value));
                    self.statements.push(stmt);
                }
            }

            Instruction::Unsupported(opcode) => {
                return Err(LiftError::unsupported(opcode.mnemonic(), Some(position)));
            }
        }
        Ok(Flow::Continue)
    }

    /// Move the cursor to `label`. Backward jumps form loops, which have no
    /// expression form.
    fn jump_forward(&mut self, label: Label, position: usize) -> LiftResult<()> {
        let target = self
            .cursor
            .body()
            .label_position(label)
            .map_err(|err| LiftError::structural(err.to_string()))?;
        if target <= position {
            return Err(LiftError::unsupported(
                format!("backward jump to {}", label),
                Some(position),
            ));
        }
        self.cursor
            .move_to(label)
            .map_err(|err| LiftError::structural(err.to_string()))
    }

    fn push_field_access(&mut self, tree: &mut Tree, source: NodeId, field: &FieldRef) {
        let access = tree.add_expression(Expression::FieldAccess {
            source,
            field: field.clone(),
        });
        self.stack.push(access);
    }

    fn invoke(
        &mut self,
        tree: &mut Tree,
        instruction: &Instruction,
        kind: InvokeKind,
        method: &MethodRef,
        position: usize,
    ) -> LiftResult<()> {
        let popped = self
            .stack
            .pop_many(method.parameter_count(), instruction)?;
        let arguments: Arguments = popped
            .into_iter()
            .zip(&method.descriptor.parameters)
            .map(|(argument, ty)| cast_literal(tree, argument, ty))
            .collect::<LiftResult<_>>()?;
        let source = match kind {
            InvokeKind::Static => class_literal(tree, &method.owner),
            _ => self.stack.pop(instruction)?,
        };

        if method.is_constructor() {
            let pending = matches!(
                tree.expression(source),
                Some(Expression::New {
                    arguments: None,
                    ..
                })
            );
            if kind != InvokeKind::Special || !pending {
                return Err(LiftError::unsupported(
                    format!("constructor call {} on an existing object", method),
                    Some(position),
                ));
            }
            return tree.complete_new(source, arguments);
        }

        let invocation = tree.add_expression(Expression::MethodInvocation {
            source,
            method: method.clone(),
            arguments,
        });
        if method.descriptor.return_type == TypeRef::Void {
            let stmt = tree.add_statement(Statement::Expression(invocation));
            self.statements.push(stmt);
        } else {
            self.stack.push(invocation);
        }
        Ok(())
    }

    fn nested_closure(
        &mut self,
        tree: &mut Tree,
        instruction: &Instruction,
        factory: &ClosureFactory,
        position: usize,
    ) -> LiftResult<()> {
        let popped = self.stack.pop_many(factory.captured.len(), instruction)?;
        let mut captures = Vec::with_capacity(popped.len());
        for id in popped {
            match tree.expression(id) {
                Some(Expression::Capture { index, .. }) => captures.push(*index),
                other => {
                    let kind = other.map_or("statement", Expression::kind_name);
                    return Err(LiftError::unsupported(
                        format!("closure capturing a {}", kind),
                        Some(position),
                    ));
                }
            }
        }

        let context = self.context.nested(position)?;
        let body = self.context.loader.load(&factory.site)?;
        let lifted = lift_body(&body, &factory.captured, &context)?;
        let closure = tree.add_expression(Expression::Closure(Box::new(NestedClosure {
            site: factory.site.clone(),
            tree: lifted.tree,
            arguments: lifted.arguments,
            captures,
            resolved: false,
        })));
        self.stack.push(closure);
        Ok(())
    }

    fn array_store(
        &mut self,
        tree: &mut Tree,
        array: NodeId,
        index: NodeId,
        value: NodeId,
        kind_type: TypeRef,
    ) -> LiftResult<()> {
        let element_type = match tree.expression(array) {
            Some(Expression::ArrayLiteral { element, .. }) => Some(element.clone()),
            _ => None,
        };
        let literal_index = match tree.literal(index) {
            Some(Literal::Number(Number::Int(i))) if *i >= 0 => Some(*i as usize),
            _ => None,
        };

        if let (Some(element), Some(slot)) = (element_type.as_ref(), literal_index) {
            let value = cast_literal(tree, value, element)?;
            return tree.set_array_element(array, slot, value);
        }

        let ty = match (element_type, tree.type_of(array)) {
            (Some(element), _) => element,
            (None, TypeRef::Array(element)) => *element,
            (None, _) => kind_type,
        };
        let value = cast_literal(tree, value, &ty)?;
        let target = tree.add_expression(Expression::ArrayElement { array, index, ty });
        let assign = tree.add_statement(Statement::Assign { target, value });
        self.statements.push(assign);
        Ok(())
    }
}

fn class_literal(tree: &mut Tree, owner: &str) -> NodeId {
    tree.add_literal(Literal::Class(TypeRef::object(owner)))
}

/// Numeric literal converted to `ty`; any other node is returned unchanged.
pub(crate) fn cast_literal(tree: &mut Tree, id: NodeId, ty: &TypeRef) -> LiftResult<NodeId> {
    let cast = match tree.literal(id) {
        Some(literal @ Literal::Number(_)) => literal.cast(ty)?,
        _ => return Ok(id),
    };
    if tree.literal(id) == Some(&cast) {
        Ok(id)
    } else {
        Ok(tree.add_literal(cast))
    }
}

fn arithmetic(
    tree: &mut Tree,
    op: ArithmeticOp,
    left: NodeId,
    right: NodeId,
) -> LiftResult<NodeId> {
    let bitwise = matches!(op, ArithmeticOp::And | ArithmeticOp::Or | ArithmeticOp::Xor);
    let (left, right) = if bitwise {
        match (
            tree.type_of(left).is_boolean(),
            tree.type_of(right).is_boolean(),
        ) {
            (true, false) => (left, cast_literal(tree, right, &TypeRef::Boolean)?),
            (false, true) => (cast_literal(tree, left, &TypeRef::Boolean)?, right),
            _ => (left, right),
        }
    } else {
        (left, right)
    };
    let boolean = tree.type_of(left).is_boolean() && tree.type_of(right).is_boolean();

    let operator = match op {
        ArithmeticOp::Add => Operator::Add,
        ArithmeticOp::Sub => Operator::Subtract,
        ArithmeticOp::Mul => Operator::Multiply,
        ArithmeticOp::Div => Operator::Divide,
        ArithmeticOp::Rem => Operator::Remainder,
        ArithmeticOp::Shl => Operator::ShiftLeft,
        ArithmeticOp::Shr => Operator::ShiftRight,
        ArithmeticOp::Ushr => Operator::UnsignedShiftRight,
        ArithmeticOp::And if boolean => Operator::And,
        ArithmeticOp::Or if boolean => Operator::Or,
        ArithmeticOp::Xor if boolean => Operator::Xor,
        ArithmeticOp::And => Operator::BitAnd,
        ArithmeticOp::Or => Operator::BitOr,
        ArithmeticOp::Xor => Operator::BitXor,
    };
    Ok(tree.add_operation(operator, smallvec![left, right]))
}
