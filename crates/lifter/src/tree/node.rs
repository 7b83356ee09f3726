//! Node definitions for the lifted expression tree.

use super::Tree;
use crate::error::{LiftError, LiftResult};
use ordered_float::OrderedFloat;
use quarry_bytecode::{
    CLASS_CLASS, ClosureSite, Constant, FieldRef, MethodRef, OBJECT_CLASS, ObjectRef, TypeRef,
    Value,
};
use smallvec::SmallVec;
use std::fmt;

/// Index of a node in its `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

pub type Operands = SmallVec<[NodeId; 2]>;
pub type Arguments = SmallVec<[NodeId; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Xor,
    Not,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    /// Three-way comparison, consumed by the following branch.
    Compare,
}

impl Operator {
    /// Operand order does not matter; operands are kept in canonical order.
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::And
                | Operator::Or
                | Operator::Xor
                | Operator::Add
                | Operator::Multiply
                | Operator::BitAnd
                | Operator::BitOr
                | Operator::BitXor
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::Less
                | Operator::LessOrEqual
                | Operator::Greater
                | Operator::GreaterOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Xor | Operator::Not)
    }

    /// The comparison that holds exactly when `self` does not.
    pub fn inverse_comparison(self) -> Option<Operator> {
        match self {
            Operator::Equals => Some(Operator::NotEquals),
            Operator::NotEquals => Some(Operator::Equals),
            Operator::Less => Some(Operator::GreaterOrEqual),
            Operator::GreaterOrEqual => Some(Operator::Less),
            Operator::Greater => Some(Operator::LessOrEqual),
            Operator::LessOrEqual => Some(Operator::Greater),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Xor => "^",
            Operator::Not => "!",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Remainder => "%",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::UnsignedShiftRight => ">>>",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::Compare => "<=>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
}

impl Number {
    pub fn zero(ty: &TypeRef) -> Option<Number> {
        match ty {
            TypeRef::Byte => Some(Number::Byte(0)),
            TypeRef::Short => Some(Number::Short(0)),
            TypeRef::Int => Some(Number::Int(0)),
            TypeRef::Long => Some(Number::Long(0)),
            TypeRef::Float => Some(Number::Float(OrderedFloat(0.0))),
            TypeRef::Double => Some(Number::Double(OrderedFloat(0.0))),
            _ => None,
        }
    }

    pub fn type_ref(self) -> TypeRef {
        match self {
            Number::Byte(_) => TypeRef::Byte,
            Number::Short(_) => TypeRef::Short,
            Number::Int(_) => TypeRef::Int,
            Number::Long(_) => TypeRef::Long,
            Number::Float(_) => TypeRef::Float,
            Number::Double(_) => TypeRef::Double,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Number::Byte(v) => v as i64,
            Number::Short(v) => v as i64,
            Number::Int(v) => v as i64,
            Number::Long(v) => v,
            Number::Float(v) => v.0 as i64,
            Number::Double(v) => v.0 as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Float(v) => v.0 as f64,
            Number::Double(v) => v.0,
            other => other.as_i64() as f64,
        }
    }

    pub fn negated(self) -> Number {
        match self {
            Number::Byte(v) => Number::Byte(v.wrapping_neg()),
            Number::Short(v) => Number::Short(v.wrapping_neg()),
            Number::Int(v) => Number::Int(v.wrapping_neg()),
            Number::Long(v) => Number::Long(v.wrapping_neg()),
            Number::Float(v) => Number::Float(OrderedFloat(-v.0)),
            Number::Double(v) => Number::Double(OrderedFloat(-v.0)),
        }
    }

    /// Convert to `ty` with primitive conversion semantics. Int-like numbers
    /// become booleans (non-zero is `true`) and chars. `None` when `ty` is not
    /// a primitive.
    ///
    /// A char in the surrogate range has no `char` form and is unsupported.
    pub fn cast(self, ty: &TypeRef) -> LiftResult<Option<Literal>> {
        let number = match ty {
            TypeRef::Boolean => return Ok(Some(Literal::Boolean(self.as_i64() != 0))),
            TypeRef::Char => {
                let unit = self.as_i64() as u16;
                return char::from_u32(u32::from(unit))
                    .map(|c| Some(Literal::Char(c)))
                    .ok_or_else(|| {
                        LiftError::unsupported(
                            format!("char constant \\u{:04X} in the surrogate range", unit),
                            None,
                        )
                    });
            }
            TypeRef::Byte => Number::Byte(self.as_i64() as i8),
            TypeRef::Short => Number::Short(self.as_i64() as i16),
            TypeRef::Int => Number::Int(self.as_i64() as i32),
            TypeRef::Long => Number::Long(self.as_i64()),
            TypeRef::Float => Number::Float(OrderedFloat(self.as_f64() as f32)),
            TypeRef::Double => Number::Double(OrderedFloat(self.as_f64())),
            _ => return Ok(None),
        };
        Ok(Some(Literal::Number(number)))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Byte(v) => write!(f, "{}", v),
            Number::Short(v) => write!(f, "{}", v),
            Number::Int(v) => write!(f, "{}", v),
            Number::Long(v) => write!(f, "{}L", v),
            Number::Float(v) => write!(f, "{}F", v),
            Number::Double(v) => write!(f, "{:?}", v.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Boolean(bool),
    Char(char),
    Number(Number),
    String(String),
    Null,
    Class(TypeRef),
    Enum { class: String, constant: String },
    Object(ObjectRef),
}

impl Literal {
    pub fn from_constant(constant: &Constant) -> Literal {
        match constant {
            Constant::Null => Literal::Null,
            Constant::Int(v) => Literal::Number(Number::Int(*v)),
            Constant::Long(v) => Literal::Number(Number::Long(*v)),
            Constant::Float(v) => Literal::Number(Number::Float(*v)),
            Constant::Double(v) => Literal::Number(Number::Double(*v)),
            Constant::String(s) => Literal::String(s.clone()),
            Constant::Class(ty) => Literal::Class(ty.clone()),
        }
    }

    /// Scalar values only; arrays and closures have no literal form.
    pub fn from_value(value: &Value) -> Option<Literal> {
        Some(match value {
            Value::Null => Literal::Null,
            Value::Boolean(b) => Literal::Boolean(*b),
            Value::Char(c) => Literal::Char(*c),
            Value::Byte(v) => Literal::Number(Number::Byte(*v)),
            Value::Short(v) => Literal::Number(Number::Short(*v)),
            Value::Int(v) => Literal::Number(Number::Int(*v)),
            Value::Long(v) => Literal::Number(Number::Long(*v)),
            Value::Float(v) => Literal::Number(Number::Float(*v)),
            Value::Double(v) => Literal::Number(Number::Double(*v)),
            Value::String(s) => Literal::String(s.clone()),
            Value::Class(name) => Literal::Class(TypeRef::object(name.as_str())),
            Value::Enum { class, constant } => Literal::Enum {
                class: class.clone(),
                constant: constant.clone(),
            },
            Value::Object(object) => Literal::Object(object.clone()),
            Value::Array { .. } | Value::Closure(_) => return None,
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Char(c) => Value::Char(*c),
            Literal::Number(Number::Byte(v)) => Value::Byte(*v),
            Literal::Number(Number::Short(v)) => Value::Short(*v),
            Literal::Number(Number::Int(v)) => Value::Int(*v),
            Literal::Number(Number::Long(v)) => Value::Long(*v),
            Literal::Number(Number::Float(v)) => Value::Float(*v),
            Literal::Number(Number::Double(v)) => Value::Double(*v),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Null => Value::Null,
            Literal::Class(ty) => Value::Class(
                ty.class_name()
                    .map_or_else(|| ty.descriptor(), str::to_string),
            ),
            Literal::Enum { class, constant } => {
                Value::enum_constant(class.as_str(), constant.as_str())
            }
            Literal::Object(object) => Value::Object(object.clone()),
        }
    }

    /// Default element of a freshly created array of `ty`.
    pub fn default_for(ty: &TypeRef) -> Literal {
        match ty {
            TypeRef::Boolean => Literal::Boolean(false),
            TypeRef::Char => Literal::Char('\0'),
            other => Number::zero(other).map_or(Literal::Null, Literal::Number),
        }
    }

    /// Implicit left operand of a single-operand jump over a value of `ty`.
    pub fn branch_default(ty: &TypeRef) -> Literal {
        match ty {
            TypeRef::Boolean | TypeRef::Char => Literal::Boolean(false),
            other => Number::zero(other).map_or(Literal::Null, Literal::Number),
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        match self {
            Literal::Boolean(_) => TypeRef::Boolean,
            Literal::Char(_) => TypeRef::Char,
            Literal::Number(n) => n.type_ref(),
            Literal::String(_) => TypeRef::string(),
            Literal::Null => TypeRef::object(OBJECT_CLASS),
            Literal::Class(_) => TypeRef::object(CLASS_CLASS),
            Literal::Enum { class, .. } => TypeRef::object(class.as_str()),
            Literal::Object(object) => TypeRef::object(object.class_name()),
        }
    }

    /// Numeric literals are converted; everything else is returned as is.
    pub fn cast(&self, ty: &TypeRef) -> LiftResult<Literal> {
        match self {
            Literal::Number(n) => Ok(n.cast(ty)?.unwrap_or_else(|| self.clone())),
            _ => Ok(self.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Argument variable of a lifted closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Argument {
    pub slot: u16,
    pub name: String,
    pub ty: TypeRef,
}

/// A closure created inside the lifted body, with its own lifted tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedClosure {
    pub site: ClosureSite,
    pub tree: Tree,
    pub arguments: Vec<Argument>,
    /// Capture indices of the enclosing closure that were passed in.
    pub captures: Vec<usize>,
    /// Set once the rewrite pipeline has run on `tree`.
    pub resolved: bool,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Capture {
        index: usize,
        ty: TypeRef,
    },
    Local {
        slot: u16,
        name: String,
        ty: TypeRef,
    },
    FieldAccess {
        source: NodeId,
        field: FieldRef,
    },
    MethodInvocation {
        source: NodeId,
        method: MethodRef,
        arguments: Arguments,
    },
    Operation {
        operator: Operator,
        operands: Operands,
    },
    InstanceOf {
        source: NodeId,
        ty: TypeRef,
    },
    ArrayLiteral {
        element: TypeRef,
        elements: Vec<NodeId>,
    },
    ArrayElement {
        array: NodeId,
        index: NodeId,
        ty: TypeRef,
    },
    /// Instantiation; `arguments` stay `None` until the constructor call is read.
    New {
        class: String,
        arguments: Option<Arguments>,
    },
    Closure(Box<NestedClosure>),
}

impl Expression {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "literal",
            Expression::Capture { .. } => "captured variable",
            Expression::Local { .. } => "local variable",
            Expression::FieldAccess { .. } => "field access",
            Expression::MethodInvocation { .. } => "method invocation",
            Expression::Operation { .. } => "operation",
            Expression::InstanceOf { .. } => "instanceof test",
            Expression::ArrayLiteral { .. } => "array literal",
            Expression::ArrayElement { .. } => "array element",
            Expression::New { .. } => "instantiation",
            Expression::Closure(_) => "closure",
        }
    }

    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            Expression::Literal(_)
            | Expression::Capture { .. }
            | Expression::Local { .. }
            | Expression::Closure(_) => {}
            Expression::FieldAccess { source, .. } | Expression::InstanceOf { source, .. } => {
                out.push(*source)
            }
            Expression::MethodInvocation {
                source, arguments, ..
            } => {
                out.push(*source);
                out.extend(arguments.iter().copied());
            }
            Expression::Operation { operands, .. } => out.extend(operands.iter().copied()),
            Expression::ArrayLiteral { elements, .. } => out.extend(elements.iter().copied()),
            Expression::ArrayElement { array, index, .. } => {
                out.push(*array);
                out.push(*index);
            }
            Expression::New { arguments, .. } => {
                if let Some(arguments) = arguments {
                    out.extend(arguments.iter().copied());
                }
            }
        }
        out
    }

    pub(crate) fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut NodeId)) {
        match self {
            Expression::Literal(_)
            | Expression::Capture { .. }
            | Expression::Local { .. }
            | Expression::Closure(_) => {}
            Expression::FieldAccess { source, .. } | Expression::InstanceOf { source, .. } => {
                f(source)
            }
            Expression::MethodInvocation {
                source, arguments, ..
            } => {
                f(source);
                arguments.iter_mut().for_each(f);
            }
            Expression::Operation { operands, .. } => operands.iter_mut().for_each(f),
            Expression::ArrayLiteral { elements, .. } => elements.iter_mut().for_each(f),
            Expression::ArrayElement { array, index, .. } => {
                f(array);
                f(index);
            }
            Expression::New { arguments, .. } => {
                if let Some(arguments) = arguments {
                    arguments.iter_mut().for_each(f);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    Return(NodeId),
    Expression(NodeId),
    /// `target` is a field access or an array element.
    Assign {
        target: NodeId,
        value: NodeId,
    },
    If {
        condition: NodeId,
        then_branch: Vec<NodeId>,
        else_branch: Vec<NodeId>,
    },
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Return(_) => "return",
            Statement::Expression(_) => "expression statement",
            Statement::Assign { .. } => "assignment",
            Statement::If { .. } => "if",
        }
    }

    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            Statement::Return(value) | Statement::Expression(value) => out.push(*value),
            Statement::Assign { target, value } => {
                out.push(*target);
                out.push(*value);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.extend(then_branch.iter().copied());
                out.extend(else_branch.iter().copied());
            }
        }
        out
    }

    pub(crate) fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut NodeId)) {
        match self {
            Statement::Return(value) | Statement::Expression(value) => f(value),
            Statement::Assign { target, value } => {
                f(target);
                f(value);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                f(condition);
                then_branch.iter_mut().for_each(&mut f);
                else_branch.iter_mut().for_each(f);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Expression(Expression),
    Statement(Statement),
}

impl Node {
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        match self {
            Node::Expression(expr) => expr.children(),
            Node::Statement(stmt) => stmt.children(),
        }
    }

    pub(crate) fn for_each_child_mut(&mut self, f: impl FnMut(&mut NodeId)) {
        match self {
            Node::Expression(expr) => expr.for_each_child_mut(f),
            Node::Statement(stmt) => stmt.for_each_child_mut(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_casts() {
        assert_eq!(
            Number::Int(1).cast(&TypeRef::Boolean),
            Ok(Some(Literal::Boolean(true)))
        );
        assert_eq!(
            Number::Int(5).cast(&TypeRef::Long),
            Ok(Some(Literal::Number(Number::Long(5))))
        );
        assert_eq!(
            Number::Int(65).cast(&TypeRef::Char),
            Ok(Some(Literal::Char('A')))
        );
        assert_eq!(
            Number::Int(0x1_0041).cast(&TypeRef::Char),
            Ok(Some(Literal::Char('A')))
        );
        assert_eq!(
            Number::Double(OrderedFloat(2.9)).cast(&TypeRef::Int),
            Ok(Some(Literal::Number(Number::Int(2))))
        );
        assert_eq!(Number::Int(1).cast(&TypeRef::string()), Ok(None));
    }

    #[test]
    fn test_surrogate_char_is_unsupported() {
        for unit in [0xD800, 0xDBFF, 0xDFFF] {
            assert!(matches!(
                Number::Int(unit).cast(&TypeRef::Char),
                Err(LiftError::UnsupportedConstruct { position: None, .. })
            ));
        }
        let err = Literal::Number(Number::Int(0xD83D))
            .cast(&TypeRef::Char)
            .unwrap_err();
        assert!(err.to_string().contains("\\uD83D"), "{}", err);
        assert_eq!(
            Number::Int(0xE000).cast(&TypeRef::Char),
            Ok(Some(Literal::Char('\u{E000}')))
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Literal::default_for(&TypeRef::Char), Literal::Char('\0'));
        assert_eq!(Literal::branch_default(&TypeRef::Char), Literal::Boolean(false));
        assert_eq!(
            Literal::branch_default(&TypeRef::Long),
            Literal::Number(Number::Long(0))
        );
        assert_eq!(Literal::branch_default(&TypeRef::string()), Literal::Null);
    }

    #[test]
    fn test_operator_inverse() {
        assert_eq!(
            Operator::Greater.inverse_comparison(),
            Some(Operator::LessOrEqual)
        );
        assert_eq!(Operator::Add.inverse_comparison(), None);
        assert!(Operator::BitXor.is_commutative());
        assert!(!Operator::Less.is_commutative());
    }
}
