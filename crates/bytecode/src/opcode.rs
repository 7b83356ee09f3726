//! Opcode definitions for the closure instruction set
//!
//! Opcode numbers follow the JVM specification. The set covers:
//! - Constants and local variable access
//! - Field access and method invocation
//! - Integer/floating arithmetic, conversions and three-way comparisons
//! - Conditional and unconditional jumps, returns
//! - Array creation and element access, object creation and type tests
//!
//! Opcodes the lifter recognises but refuses to decompile (switches, throws,
//! monitors, subroutines, `iinc`) are listed as well so that they can be
//! reported by name.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[repr(u8)]
pub enum Opcode {
    // Constants (0-20)
    Nop = 0,
    AconstNull = 1,
    IconstM1 = 2,
    Iconst0 = 3,
    Iconst1 = 4,
    Iconst2 = 5,
    Iconst3 = 6,
    Iconst4 = 7,
    Iconst5 = 8,
    Lconst0 = 9,
    Lconst1 = 10,
    Fconst0 = 11,
    Fconst1 = 12,
    Fconst2 = 13,
    Dconst0 = 14,
    Dconst1 = 15,
    Bipush = 16,
    Sipush = 17,
    Ldc = 18,
    Ldc2W = 20,

    // Loads and stores (21-86)
    Iload = 21,
    Lload = 22,
    Fload = 23,
    Dload = 24,
    Aload = 25,
    Iaload = 46,
    Laload = 47,
    Faload = 48,
    Daload = 49,
    Aaload = 50,
    Baload = 51,
    Caload = 52,
    Saload = 53,
    Istore = 54,
    Lstore = 55,
    Fstore = 56,
    Dstore = 57,
    Astore = 58,
    Iastore = 79,
    Lastore = 80,
    Fastore = 81,
    Dastore = 82,
    Aastore = 83,
    Bastore = 84,
    Castore = 85,
    Sastore = 86,

    // Stack (87-95)
    Pop = 87,
    Pop2 = 88,
    Dup = 89,
    DupX1 = 90,
    DupX2 = 91,
    Dup2 = 92,
    Swap = 95,

    // Arithmetic (96-132)
    Iadd = 96,
    Ladd = 97,
    Fadd = 98,
    Dadd = 99,
    Isub = 100,
    Lsub = 101,
    Fsub = 102,
    Dsub = 103,
    Imul = 104,
    Lmul = 105,
    Fmul = 106,
    Dmul = 107,
    Idiv = 108,
    Ldiv = 109,
    Fdiv = 110,
    Ddiv = 111,
    Irem = 112,
    Lrem = 113,
    Frem = 114,
    Drem = 115,
    Ineg = 116,
    Lneg = 117,
    Fneg = 118,
    Dneg = 119,
    Ishl = 120,
    Lshl = 121,
    Ishr = 122,
    Lshr = 123,
    Iushr = 124,
    Lushr = 125,
    Iand = 126,
    Land = 127,
    Ior = 128,
    Lor = 129,
    Ixor = 130,
    Lxor = 131,
    Iinc = 132,

    // Conversions (133-147)
    I2l = 133,
    I2f = 134,
    I2d = 135,
    L2i = 136,
    L2f = 137,
    L2d = 138,
    F2i = 139,
    F2l = 140,
    F2d = 141,
    D2i = 142,
    D2l = 143,
    D2f = 144,
    I2b = 145,
    I2c = 146,
    I2s = 147,

    // Comparisons and jumps (148-171)
    Lcmp = 148,
    Fcmpl = 149,
    Fcmpg = 150,
    Dcmpl = 151,
    Dcmpg = 152,
    Ifeq = 153,
    Ifne = 154,
    Iflt = 155,
    Ifge = 156,
    Ifgt = 157,
    Ifle = 158,
    IfIcmpeq = 159,
    IfIcmpne = 160,
    IfIcmplt = 161,
    IfIcmpge = 162,
    IfIcmpgt = 163,
    IfIcmple = 164,
    IfAcmpeq = 165,
    IfAcmpne = 166,
    Goto = 167,
    Jsr = 168,
    Ret = 169,
    Tableswitch = 170,
    Lookupswitch = 171,

    // Returns (172-177)
    Ireturn = 172,
    Lreturn = 173,
    Freturn = 174,
    Dreturn = 175,
    Areturn = 176,
    Return = 177,

    // Fields and invocation (178-186)
    Getstatic = 178,
    Putstatic = 179,
    Getfield = 180,
    Putfield = 181,
    Invokevirtual = 182,
    Invokespecial = 183,
    Invokestatic = 184,
    Invokeinterface = 185,
    Invokedynamic = 186,

    // Objects and arrays (187-199)
    New = 187,
    Newarray = 188,
    Anewarray = 189,
    Arraylength = 190,
    Athrow = 191,
    Checkcast = 192,
    Instanceof = 193,
    Monitorenter = 194,
    Monitorexit = 195,
    Multianewarray = 197,
    Ifnull = 198,
    Ifnonnull = 199,
}

/// Coarse grouping used when reporting unsupported input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeCategory {
    Constant,
    Local,
    Stack,
    Arithmetic,
    Conversion,
    Comparison,
    Branch,
    Switch,
    Return,
    Field,
    Invoke,
    Object,
    Array,
    Exception,
    Monitor,
    Subroutine,
}

impl Opcode {
    pub fn category(self) -> OpcodeCategory {
        use Opcode::*;
        match self {
            Nop | AconstNull | IconstM1 | Iconst0 | Iconst1 | Iconst2 | Iconst3 | Iconst4
            | Iconst5 | Lconst0 | Lconst1 | Fconst0 | Fconst1 | Fconst2 | Dconst0 | Dconst1
            | Bipush | Sipush | Ldc | Ldc2W => OpcodeCategory::Constant,
            Iload | Lload | Fload | Dload | Aload | Istore | Lstore | Fstore | Dstore
            | Astore | Iinc => OpcodeCategory::Local,
            Iaload | Laload | Faload | Daload | Aaload | Baload | Caload | Saload | Iastore
            | Lastore | Fastore | Dastore | Aastore | Bastore | Castore | Sastore | Newarray
            | Anewarray | Arraylength | Multianewarray => OpcodeCategory::Array,
            Pop | Pop2 | Dup | DupX1 | DupX2 | Dup2 | Swap => OpcodeCategory::Stack,
            Iadd | Ladd | Fadd | Dadd | Isub | Lsub | Fsub | Dsub | Imul | Lmul | Fmul
            | Dmul | Idiv | Ldiv | Fdiv | Ddiv | Irem | Lrem | Frem | Drem | Ineg | Lneg
            | Fneg | Dneg | Ishl | Lshl | Ishr | Lshr | Iushr | Lushr | Iand | Land | Ior
            | Lor | Ixor | Lxor => OpcodeCategory::Arithmetic,
            I2l | I2f | I2d | L2i | L2f | L2d | F2i | F2l | F2d | D2i | D2l | D2f | I2b
            | I2c | I2s | Checkcast => OpcodeCategory::Conversion,
            Lcmp | Fcmpl | Fcmpg | Dcmpl | Dcmpg => OpcodeCategory::Comparison,
            Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle | IfIcmpeq | IfIcmpne | IfIcmplt
            | IfIcmpge | IfIcmpgt | IfIcmple | IfAcmpeq | IfAcmpne | Goto | Ifnull
            | Ifnonnull => OpcodeCategory::Branch,
            Tableswitch | Lookupswitch => OpcodeCategory::Switch,
            Jsr | Ret => OpcodeCategory::Subroutine,
            Ireturn | Lreturn | Freturn | Dreturn | Areturn | Return => OpcodeCategory::Return,
            Getstatic | Putstatic | Getfield | Putfield => OpcodeCategory::Field,
            Invokevirtual | Invokespecial | Invokestatic | Invokeinterface | Invokedynamic => {
                OpcodeCategory::Invoke
            }
            New | Instanceof => OpcodeCategory::Object,
            Athrow => OpcodeCategory::Exception,
            Monitorenter | Monitorexit => OpcodeCategory::Monitor,
        }
    }

    /// Lower-case assembler mnemonic, e.g. `if_icmple`.
    pub fn mnemonic(self) -> String {
        let name = format!("{:?}", self);
        let mut out = String::with_capacity(name.len() + 2);
        for (i, ch) in name.char_indices() {
            let after_const = name[..i].ends_with("const");
            if i > 0 && (ch.is_ascii_uppercase() || (ch.is_ascii_digit() && after_const)) {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        }
        out
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
