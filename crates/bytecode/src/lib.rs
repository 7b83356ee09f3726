//! # Quarry Bytecode
//!
//! Input model for the quarry closure lifter.
//!
//! ## Contents
//!
//! 1. **Descriptors**: JVM type and method descriptors (`TypeRef`, `MethodDescriptor`)
//! 2. **Instructions**: categorized instructions with their canonical `Opcode`
//! 3. **Method bodies**: instruction list, local variable table and label index,
//!    assembled with `BodyBuilder`
//! 4. **Cursor**: bidirectional traversal over a body
//! 5. **Values**: runtime values captured by closures
//! 6. **Host traits**: `MethodBodyLoader` and `MemberResolver`
//!
//! ## Usage
//!
//! ```rust
//! use quarry_bytecode::{BodyBuilder, Constant, Instruction, InstructionCursor, ValueKind};
//!
//! let mut builder = BodyBuilder::new("com/acme/Filters", "lambda$0", "()I").unwrap();
//! builder
//!     .push(Instruction::Const(Constant::Int(42)))
//!     .push(Instruction::Return(Some(ValueKind::Int)));
//! let body = builder.build().unwrap();
//!
//! let mut cursor = InstructionCursor::new(&body);
//! assert_eq!(cursor.next(), Some(&Instruction::Const(Constant::Int(42))));
//! ```

pub mod body;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod instruction;
pub mod opcode;
pub mod value;

pub use body::{BodyBuilder, ClosureSite, LocalVariable, MethodBody};
pub use cursor::InstructionCursor;
pub use descriptor::{CLASS_CLASS, MethodDescriptor, OBJECT_CLASS, STRING_CLASS, TypeRef};
pub use error::{BytecodeError, BytecodeResult, ResolveError};
pub use host::{InMemoryLoader, MemberResolver, MethodBodyLoader, Receiver, StaticRegistry};
pub use instruction::{
    ArithmeticOp, ClosureFactory, CompareOp, Constant, FieldRef, Instruction, InvokeKind, JumpOp,
    Label, MethodRef, NumericKind, ValueKind,
};
pub use opcode::{Opcode, OpcodeCategory};
pub use value::{CapturedClosure, HostObject, ObjectRef, Value};
