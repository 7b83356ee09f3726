//! If-statement reconstruction.
//!
//! A conditional jump ends the current statement run. The condition is
//! written in source form, which is the negation of the jump: the fall-through
//! path becomes the then-branch and the jump target the else-branch. Each
//! branch is read by a forked reader with its own cursor and an empty stack.

use super::{StatementReader, cast_literal};
use crate::error::{LiftError, LiftResult};
use crate::tree::{Expression, Literal, NodeId, Operator, Statement, Tree};
use quarry_bytecode::{Instruction, InstructionCursor, JumpOp, Label};
use smallvec::smallvec;
use tracing::debug;

/// Operator of the source condition that leads to the fall-through path.
pub fn source_operator(op: JumpOp) -> Operator {
    match op {
        JumpOp::Ifeq | JumpOp::IfIcmpeq | JumpOp::IfAcmpeq | JumpOp::Ifnull => Operator::NotEquals,
        JumpOp::Ifne | JumpOp::IfIcmpne | JumpOp::IfAcmpne | JumpOp::Ifnonnull => Operator::Equals,
        JumpOp::Iflt | JumpOp::IfIcmplt => Operator::GreaterOrEqual,
        JumpOp::Ifge | JumpOp::IfIcmpge => Operator::Less,
        JumpOp::Ifgt | JumpOp::IfIcmpgt => Operator::LessOrEqual,
        JumpOp::Ifle | JumpOp::IfIcmple => Operator::Greater,
    }
}

impl<'b, 'c> StatementReader<'b, 'c> {
    pub(super) fn read_branch(
        &mut self,
        tree: &mut Tree,
        instruction: &Instruction,
        op: JumpOp,
        target: Label,
        position: usize,
    ) -> LiftResult<NodeId> {
        if self.branch_depth >= self.context.config.max_branch_depth {
            return Err(LiftError::unsupported(
                format!(
                    "branches nested deeper than {}",
                    self.context.config.max_branch_depth
                ),
                Some(position),
            ));
        }

        let condition = self.branch_condition(tree, instruction, op)?;
        if !self.stack.is_empty() {
            return Err(LiftError::unsupported(
                "operand stack carried across a branch",
                Some(position),
            ));
        }

        let target_position = self
            .cursor
            .body()
            .label_position(target)
            .map_err(|err| LiftError::structural(err.to_string()))?;
        if target_position <= position {
            return Err(LiftError::unsupported(
                format!("backward jump to {}", target),
                Some(position),
            ));
        }

        let then_branch = self.fork(self.cursor.duplicate()).read(tree)?;
        let mut jumped = self.cursor.duplicate();
        jumped
            .move_to(target)
            .map_err(|err| LiftError::structural(err.to_string()))?;
        let else_branch = self.fork(jumped).read(tree)?;

        debug!(
            position,
            depth = self.branch_depth,
            then_len = then_branch.len(),
            else_len = else_branch.len(),
            "reconstructed if-statement"
        );
        Ok(tree.add_statement(Statement::If {
            condition,
            then_branch,
            else_branch,
        }))
    }

    /// Source-form condition of a conditional jump, popped from the stack.
    fn branch_condition(
        &mut self,
        tree: &mut Tree,
        instruction: &Instruction,
        op: JumpOp,
    ) -> LiftResult<NodeId> {
        let (left, right) = if op.operand_count() == 1 {
            let value = self.stack.pop(instruction)?;
            match tree.expression(value) {
                Some(Expression::Operation {
                    operator: Operator::Compare,
                    operands,
                }) if operands.len() == 2 => (operands[0], operands[1]),
                _ => {
                    let implicit = match op {
                        JumpOp::Ifnull | JumpOp::Ifnonnull => Literal::Null,
                        _ => Literal::branch_default(&tree.type_of(value)),
                    };
                    (value, tree.add_literal(implicit))
                }
            }
        } else {
            let right = self.stack.pop(instruction)?;
            let left = self.stack.pop(instruction)?;
            (left, right)
        };

        let (left, right) = align_literal_types(tree, left, right)?;
        let operator = source_operator(op);

        if matches!(operator, Operator::Equals | Operator::NotEquals) {
            for (literal, other) in [(left, right), (right, left)] {
                if tree.literal(literal) == Some(&Literal::Boolean(false)) {
                    return Ok(match operator {
                        Operator::NotEquals => other,
                        _ => tree.negate(other),
                    });
                }
            }
        }
        Ok(tree.add_operation(operator, smallvec![left, right]))
    }

    fn fork(&self, cursor: InstructionCursor<'b>) -> StatementReader<'b, 'c> {
        StatementReader {
            cursor,
            locals: self.locals.clone(),
            stack: Default::default(),
            statements: Vec::new(),
            context: self.context,
            branch_depth: self.branch_depth + 1,
        }
    }
}

/// A numeric literal compared against a typed operand takes that operand's
/// type, so `flag != 0` reads as `flag != false`.
fn align_literal_types(
    tree: &mut Tree,
    left: NodeId,
    right: NodeId,
) -> LiftResult<(NodeId, NodeId)> {
    let is_literal = |tree: &Tree, id| tree.literal(id).is_some();
    Ok(match (is_literal(tree, left), is_literal(tree, right)) {
        (false, true) => {
            let ty = tree.type_of(left);
            (left, cast_literal(tree, right, &ty)?)
        }
        (true, false) => {
            let ty = tree.type_of(right);
            (cast_literal(tree, left, &ty)?, right)
        }
        _ => (left, right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_operator_negates_jump() {
        assert_eq!(source_operator(JumpOp::IfIcmple), Operator::Greater);
        assert_eq!(source_operator(JumpOp::Iflt), Operator::GreaterOrEqual);
        assert_eq!(source_operator(JumpOp::Ifnull), Operator::NotEquals);
        assert_eq!(source_operator(JumpOp::IfAcmpne), Operator::Equals);
    }

    #[test]
    fn test_literal_takes_operand_type() {
        let mut tree = Tree::new();
        let flag = tree.add_expression(Expression::Capture {
            index: 0,
            ty: quarry_bytecode::TypeRef::Boolean,
        });
        let zero = tree.add_literal(Literal::Number(crate::tree::Number::Int(0)));
        let (_, right) = align_literal_types(&mut tree, flag, zero).unwrap();
        assert_eq!(tree.literal(right), Some(&Literal::Boolean(false)));
    }
}
