//! Bytecode instruction definitions
//!
//! An `Instruction` is one decoded element of a method body. Instructions are
//! grouped by category rather than by raw opcode: the operand kind (int,
//! long, reference, ...) is carried as data so that the lifter can match on
//! the category once. `Instruction::opcode` recovers the concrete opcode.

use crate::body::ClosureSite;
use crate::descriptor::{MethodDescriptor, OBJECT_CLASS, TypeRef};
use crate::error::BytecodeResult;
use crate::opcode::Opcode;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Jump target. Bound to an instruction position by the owning `MethodBody`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Operand kind of loads, stores, returns and array accesses.
///
/// `Byte`, `Char` and `Short` only appear on array instructions; the local
/// variable instructions use `Int` for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
    Byte,
    Char,
    Short,
}

impl ValueKind {
    pub fn type_ref(self) -> TypeRef {
        match self {
            ValueKind::Int => TypeRef::Int,
            ValueKind::Long => TypeRef::Long,
            ValueKind::Float => TypeRef::Float,
            ValueKind::Double => TypeRef::Double,
            ValueKind::Reference => TypeRef::object(OBJECT_CLASS),
            ValueKind::Byte => TypeRef::Byte,
            ValueKind::Char => TypeRef::Char,
            ValueKind::Short => TypeRef::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    Int,
    Long,
    Float,
    Double,
}

impl NumericKind {
    pub fn type_ref(self) -> TypeRef {
        match self {
            NumericKind::Int => TypeRef::Int,
            NumericKind::Long => TypeRef::Long,
            NumericKind::Float => TypeRef::Float,
            NumericKind::Double => TypeRef::Double,
        }
    }

    fn pick(self, family: [Opcode; 4]) -> Opcode {
        match self {
            NumericKind::Int => family[0],
            NumericKind::Long => family[1],
            NumericKind::Float => family[2],
            NumericKind::Double => family[3],
        }
    }
}

/// Constant pushed by `aconst_null`, `iconst_*`, `bipush`, `ldc` and friends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
    Class(TypeRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
}

/// Three-way comparisons; their int result feeds a single-operand jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Lcmp,
    Fcmpl,
    Fcmpg,
    Dcmpl,
    Dcmpg,
}

/// Conditional jump opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpOp {
    Ifeq,
    Ifne,
    Iflt,
    Ifge,
    Ifgt,
    Ifle,
    IfIcmpeq,
    IfIcmpne,
    IfIcmplt,
    IfIcmpge,
    IfIcmpgt,
    IfIcmple,
    IfAcmpeq,
    IfAcmpne,
    Ifnull,
    Ifnonnull,
}

impl JumpOp {
    /// Number of stack operands the jump consumes.
    pub fn operand_count(self) -> usize {
        match self {
            JumpOp::Ifeq
            | JumpOp::Ifne
            | JumpOp::Iflt
            | JumpOp::Ifge
            | JumpOp::Ifgt
            | JumpOp::Ifle
            | JumpOp::Ifnull
            | JumpOp::Ifnonnull => 1,
            _ => 2,
        }
    }

    pub fn opcode(self) -> Opcode {
        match self {
            JumpOp::Ifeq => Opcode::Ifeq,
            JumpOp::Ifne => Opcode::Ifne,
            JumpOp::Iflt => Opcode::Iflt,
            JumpOp::Ifge => Opcode::Ifge,
            JumpOp::Ifgt => Opcode::Ifgt,
            JumpOp::Ifle => Opcode::Ifle,
            JumpOp::IfIcmpeq => Opcode::IfIcmpeq,
            JumpOp::IfIcmpne => Opcode::IfIcmpne,
            JumpOp::IfIcmplt => Opcode::IfIcmplt,
            JumpOp::IfIcmpge => Opcode::IfIcmpge,
            JumpOp::IfIcmpgt => Opcode::IfIcmpgt,
            JumpOp::IfIcmple => Opcode::IfIcmple,
            JumpOp::IfAcmpeq => Opcode::IfAcmpeq,
            JumpOp::IfAcmpne => Opcode::IfAcmpne,
            JumpOp::Ifnull => Opcode::Ifnull,
            JumpOp::Ifnonnull => Opcode::Ifnonnull,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub ty: TypeRef,
}

impl FieldRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: MethodDescriptor,
}

impl MethodRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: &str,
    ) -> BytecodeResult<Self> {
        Ok(Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: MethodDescriptor::parse(descriptor)?,
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn parameter_count(&self) -> usize {
        self.descriptor.parameters.len()
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Operand of `invokedynamic` when it builds a closure: the body backing the
/// new closure and the types of the values it captures from the stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClosureFactory {
    pub site: ClosureSite,
    pub captured: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Nop,
    Const(Constant),
    Load { kind: ValueKind, slot: u16 },
    Store { kind: ValueKind, slot: u16 },

    GetField(FieldRef),
    GetStatic(FieldRef),
    PutField(FieldRef),
    PutStatic(FieldRef),
    Invoke { kind: InvokeKind, method: MethodRef },
    InvokeDynamic(ClosureFactory),

    Arithmetic { op: ArithmeticOp, kind: NumericKind },
    Negate(NumericKind),
    Convert { from: NumericKind, to: TypeRef },
    Compare(CompareOp),

    Jump { op: JumpOp, target: Label },
    Goto(Label),
    Return(Option<ValueKind>),

    NewArray(TypeRef),
    ArrayLoad(ValueKind),
    ArrayStore(ValueKind),
    New(String),
    InstanceOf(TypeRef),
    CheckCast(TypeRef),

    Dup,
    Pop,

    /// A decoded opcode the lifter does not model.
    Unsupported(Opcode),
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Const(constant) => constant_opcode(constant),
            Instruction::Load { kind, .. } => match kind {
                ValueKind::Long => Opcode::Lload,
                ValueKind::Float => Opcode::Fload,
                ValueKind::Double => Opcode::Dload,
                ValueKind::Reference => Opcode::Aload,
                _ => Opcode::Iload,
            },
            Instruction::Store { kind, .. } => match kind {
                ValueKind::Long => Opcode::Lstore,
                ValueKind::Float => Opcode::Fstore,
                ValueKind::Double => Opcode::Dstore,
                ValueKind::Reference => Opcode::Astore,
                _ => Opcode::Istore,
            },
            Instruction::GetField(_) => Opcode::Getfield,
            Instruction::GetStatic(_) => Opcode::Getstatic,
            Instruction::PutField(_) => Opcode::Putfield,
            Instruction::PutStatic(_) => Opcode::Putstatic,
            Instruction::Invoke { kind, .. } => match kind {
                InvokeKind::Virtual => Opcode::Invokevirtual,
                InvokeKind::Special => Opcode::Invokespecial,
                InvokeKind::Static => Opcode::Invokestatic,
                InvokeKind::Interface => Opcode::Invokeinterface,
            },
            Instruction::InvokeDynamic(_) => Opcode::Invokedynamic,
            Instruction::Arithmetic { op, kind } => {
                use Opcode::*;
                let family = match op {
                    ArithmeticOp::Add => [Iadd, Ladd, Fadd, Dadd],
                    ArithmeticOp::Sub => [Isub, Lsub, Fsub, Dsub],
                    ArithmeticOp::Mul => [Imul, Lmul, Fmul, Dmul],
                    ArithmeticOp::Div => [Idiv, Ldiv, Fdiv, Ddiv],
                    ArithmeticOp::Rem => [Irem, Lrem, Frem, Drem],
                    ArithmeticOp::Shl => [Ishl, Lshl, Ishl, Lshl],
                    ArithmeticOp::Shr => [Ishr, Lshr, Ishr, Lshr],
                    ArithmeticOp::Ushr => [Iushr, Lushr, Iushr, Lushr],
                    ArithmeticOp::And => [Iand, Land, Iand, Land],
                    ArithmeticOp::Or => [Ior, Lor, Ior, Lor],
                    ArithmeticOp::Xor => [Ixor, Lxor, Ixor, Lxor],
                };
                kind.pick(family)
            }
            Instruction::Negate(kind) => {
                kind.pick([Opcode::Ineg, Opcode::Lneg, Opcode::Fneg, Opcode::Dneg])
            }
            Instruction::Convert { from, to } => conversion_opcode(*from, to),
            Instruction::Compare(op) => match op {
                CompareOp::Lcmp => Opcode::Lcmp,
                CompareOp::Fcmpl => Opcode::Fcmpl,
                CompareOp::Fcmpg => Opcode::Fcmpg,
                CompareOp::Dcmpl => Opcode::Dcmpl,
                CompareOp::Dcmpg => Opcode::Dcmpg,
            },
            Instruction::Jump { op, .. } => op.opcode(),
            Instruction::Goto(_) => Opcode::Goto,
            Instruction::Return(kind) => match kind {
                None => Opcode::Return,
                Some(ValueKind::Long) => Opcode::Lreturn,
                Some(ValueKind::Float) => Opcode::Freturn,
                Some(ValueKind::Double) => Opcode::Dreturn,
                Some(ValueKind::Reference) => Opcode::Areturn,
                Some(_) => Opcode::Ireturn,
            },
            Instruction::NewArray(element) => {
                if element.is_reference() {
                    Opcode::Anewarray
                } else {
                    Opcode::Newarray
                }
            }
            Instruction::ArrayLoad(kind) => match kind {
                ValueKind::Int => Opcode::Iaload,
                ValueKind::Long => Opcode::Laload,
                ValueKind::Float => Opcode::Faload,
                ValueKind::Double => Opcode::Daload,
                ValueKind::Reference => Opcode::Aaload,
                ValueKind::Byte => Opcode::Baload,
                ValueKind::Char => Opcode::Caload,
                ValueKind::Short => Opcode::Saload,
            },
            Instruction::ArrayStore(kind) => match kind {
                ValueKind::Int => Opcode::Iastore,
                ValueKind::Long => Opcode::Lastore,
                ValueKind::Float => Opcode::Fastore,
                ValueKind::Double => Opcode::Dastore,
                ValueKind::Reference => Opcode::Aastore,
                ValueKind::Byte => Opcode::Bastore,
                ValueKind::Char => Opcode::Castore,
                ValueKind::Short => Opcode::Sastore,
            },
            Instruction::New(_) => Opcode::New,
            Instruction::InstanceOf(_) => Opcode::Instanceof,
            Instruction::CheckCast(_) => Opcode::Checkcast,
            Instruction::Dup => Opcode::Dup,
            Instruction::Pop => Opcode::Pop,
            Instruction::Unsupported(opcode) => *opcode,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Instruction::Return(_))
    }

    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Instruction::Jump { target, .. } | Instruction::Goto(target) => Some(*target),
            _ => None,
        }
    }
}

fn constant_opcode(constant: &Constant) -> Opcode {
    match constant {
        Constant::Null => Opcode::AconstNull,
        Constant::Int(value) => match *value {
            -1 => Opcode::IconstM1,
            0 => Opcode::Iconst0,
            1 => Opcode::Iconst1,
            2 => Opcode::Iconst2,
            3 => Opcode::Iconst3,
            4 => Opcode::Iconst4,
            5 => Opcode::Iconst5,
            v if i8::try_from(v).is_ok() => Opcode::Bipush,
            v if i16::try_from(v).is_ok() => Opcode::Sipush,
            _ => Opcode::Ldc,
        },
        Constant::Long(0) => Opcode::Lconst0,
        Constant::Long(1) => Opcode::Lconst1,
        Constant::Double(v) if v.0 == 0.0 => Opcode::Dconst0,
        Constant::Double(v) if v.0 == 1.0 => Opcode::Dconst1,
        Constant::Long(_) | Constant::Double(_) => Opcode::Ldc2W,
        Constant::Float(v) if v.0 == 0.0 => Opcode::Fconst0,
        Constant::Float(v) if v.0 == 1.0 => Opcode::Fconst1,
        Constant::Float(v) if v.0 == 2.0 => Opcode::Fconst2,
        Constant::Float(_) | Constant::String(_) | Constant::Class(_) => Opcode::Ldc,
    }
}

fn conversion_opcode(from: NumericKind, to: &TypeRef) -> Opcode {
    use Opcode::*;
    match (from, to) {
        (NumericKind::Int, TypeRef::Long) => I2l,
        (NumericKind::Int, TypeRef::Float) => I2f,
        (NumericKind::Int, TypeRef::Double) => I2d,
        (NumericKind::Int, TypeRef::Byte) => I2b,
        (NumericKind::Int, TypeRef::Char) => I2c,
        (NumericKind::Int, TypeRef::Short) => I2s,
        (NumericKind::Long, TypeRef::Float) => L2f,
        (NumericKind::Long, TypeRef::Double) => L2d,
        (NumericKind::Long, _) => L2i,
        (NumericKind::Float, TypeRef::Long) => F2l,
        (NumericKind::Float, TypeRef::Double) => F2d,
        (NumericKind::Float, _) => F2i,
        (NumericKind::Double, TypeRef::Long) => D2l,
        (NumericKind::Double, TypeRef::Float) => D2f,
        (NumericKind::Double, _) => D2i,
        (NumericKind::Int, _) => Nop,
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = self.opcode();
        match self {
            Instruction::Const(constant) => match constant {
                Constant::Null => write!(f, "{}", opcode),
                Constant::Int(v) => write!(f, "{} {}", opcode, v),
                Constant::Long(v) => write!(f, "{} {}L", opcode, v),
                Constant::Float(v) => write!(f, "{} {}F", opcode, v),
                Constant::Double(v) => write!(f, "{} {}D", opcode, v),
                Constant::String(s) => write!(f, "{} {:?}", opcode, s),
                Constant::Class(ty) => write!(f, "{} {}.class", opcode, ty),
            },
            Instruction::Load { slot, .. } | Instruction::Store { slot, .. } => {
                write!(f, "{} {}", opcode, slot)
            }
            Instruction::GetField(field)
            | Instruction::GetStatic(field)
            | Instruction::PutField(field)
            | Instruction::PutStatic(field) => write!(
                f,
                "{} {}.{}:{}",
                opcode,
                field.owner,
                field.name,
                field.ty.descriptor()
            ),
            Instruction::Invoke { method, .. } => write!(f, "{} {}", opcode, method),
            Instruction::InvokeDynamic(factory) => write!(f, "{} {}", opcode, factory.site),
            Instruction::Jump { target, .. } | Instruction::Goto(target) => {
                write!(f, "{} {}", opcode, target)
            }
            Instruction::NewArray(ty)
            | Instruction::InstanceOf(ty)
            | Instruction::CheckCast(ty) => write!(f, "{} {}", opcode, ty),
            Instruction::New(class) => write!(f, "{} {}", opcode, class),
            _ => write!(f, "{}", opcode),
        }
    }
}
