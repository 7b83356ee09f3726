//! Method body representation
//!
//! A closure is backed by one compiled method body containing:
//! - Method identity (owner class, name, descriptor)
//! - The instruction list
//! - The local variable table
//! - The label index mapping jump targets to instruction positions

use crate::descriptor::{MethodDescriptor, TypeRef};
use crate::error::{BytecodeError, BytecodeResult};
use crate::instruction::{Instruction, Label};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the compiled body backing a closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClosureSite {
    pub owner: String,
    pub method: String,
    pub descriptor: String,
}

impl ClosureSite {
    pub fn new(
        owner: impl Into<String>,
        method: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            method: method.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for ClosureSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.owner, self.method, self.descriptor)
    }
}

/// Entry of the local variable table. A missing range covers the whole body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVariable {
    pub slot: u16,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub range: Option<(Label, Label)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodBody {
    pub owner: String,
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub is_static: bool,
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub locals: Vec<LocalVariable>,
    #[serde(default)]
    pub labels: IndexMap<Label, usize>,
}

impl MethodBody {
    pub fn site(&self) -> ClosureSite {
        ClosureSite::new(&self.owner, &self.name, self.descriptor.descriptor())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn label_position(&self, label: Label) -> BytecodeResult<usize> {
        self.labels
            .get(&label)
            .copied()
            .ok_or(BytecodeError::UnknownLabel(label))
    }

    /// The local variable entry for `slot` live at instruction `position`.
    pub fn local_at(&self, slot: u16, position: usize) -> Option<&LocalVariable> {
        self.locals.iter().find(|local| {
            if local.slot != slot {
                return false;
            }
            match local.range {
                None => true,
                Some((start, end)) => {
                    let start = self.labels.get(&start).copied().unwrap_or(0);
                    let end = self.labels.get(&end).copied().unwrap_or(usize::MAX);
                    (start..=end).contains(&position)
                }
            }
        })
    }

    /// Slot of the first declared parameter. Instance bodies reserve slot 0
    /// for the receiver.
    pub fn first_parameter_slot(&self) -> u16 {
        if self.is_static { 0 } else { 1 }
    }
}

/// Incremental assembler for `MethodBody`.
///
/// Labels are bound to the position of the next pushed instruction:
///
/// ```
/// use quarry_bytecode::{BodyBuilder, Constant, Instruction, ValueKind};
///
/// let mut builder = BodyBuilder::new("com/acme/Filters", "lambda$0", "()Z").unwrap();
/// let done = builder.new_label();
/// builder.push(Instruction::Goto(done));
/// builder.bind(done);
/// builder.push(Instruction::Const(Constant::Int(1)));
/// builder.push(Instruction::Return(Some(ValueKind::Int)));
/// let body = builder.build().unwrap();
/// assert_eq!(body.label_position(done).unwrap(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct BodyBuilder {
    body: MethodBody,
    next_label: u32,
}

impl BodyBuilder {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: &str,
    ) -> BytecodeResult<Self> {
        Ok(Self {
            body: MethodBody {
                owner: owner.into(),
                name: name.into(),
                descriptor: MethodDescriptor::parse(descriptor)?,
                is_static: true,
                instructions: Vec::new(),
                locals: Vec::new(),
                labels: IndexMap::new(),
            },
            next_label: 0,
        })
    }

    /// Mark the body as an instance method; slot 0 then holds the receiver.
    pub fn instance(mut self) -> Self {
        self.body.is_static = false;
        self
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn bind(&mut self, label: Label) -> &mut Self {
        self.body.labels.insert(label, self.body.instructions.len());
        self
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.body.instructions.push(instruction);
        self
    }

    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) -> &mut Self {
        self.body.instructions.extend(instructions);
        self
    }

    pub fn local(&mut self, slot: u16, name: impl Into<String>, ty: TypeRef) -> &mut Self {
        self.body.locals.push(LocalVariable {
            slot,
            name: name.into(),
            ty,
            range: None,
        });
        self
    }

    /// Finish the body. Every jump target must have been bound.
    pub fn build(self) -> BytecodeResult<MethodBody> {
        for instruction in &self.body.instructions {
            if let Some(target) = instruction.jump_target()
                && !self.body.labels.contains_key(&target)
            {
                return Err(BytecodeError::UnknownLabel(target));
            }
        }
        Ok(self.body)
    }
}
