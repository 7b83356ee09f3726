//! Bidirectional cursor over a method body's instruction list.

use crate::body::MethodBody;
use crate::error::BytecodeResult;
use crate::instruction::{Instruction, Label};

/// A cursor sits between two instructions. `next` returns the instruction
/// after the gap and moves past it; `previous` moves back over the one before.
#[derive(Debug, Clone)]
pub struct InstructionCursor<'b> {
    body: &'b MethodBody,
    position: usize,
    current: Option<usize>,
}

impl<'b> InstructionCursor<'b> {
    pub fn new(body: &'b MethodBody) -> Self {
        InstructionCursor {
            body,
            position: 0,
            current: None,
        }
    }

    pub fn body(&self) -> &'b MethodBody {
        self.body
    }

    pub fn has_next(&self) -> bool {
        self.position < self.body.instructions.len()
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0
    }

    pub fn previous(&mut self) -> Option<&'b Instruction> {
        if !self.has_previous() {
            return None;
        }
        self.position -= 1;
        self.current = Some(self.position);
        self.body.instructions.get(self.position)
    }

    /// The most recently visited instruction, `None` before the first move.
    pub fn current(&self) -> Option<&'b Instruction> {
        self.current.and_then(|index| self.body.instructions.get(index))
    }

    /// Index of the most recently visited instruction.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Index of the instruction `next` would return.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Step until the labelled instruction is the next one.
    pub fn move_to(&mut self, label: Label) -> BytecodeResult<()> {
        let target = self.body.label_position(label)?;
        while self.position < target {
            self.next();
        }
        while self.position > target {
            self.previous();
        }
        Ok(())
    }

    /// An independent cursor at the same position.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}

impl<'b> Iterator for InstructionCursor<'b> {
    type Item = &'b Instruction;

    fn next(&mut self) -> Option<Self::Item> {
        let instruction = self.body.instructions.get(self.position)?;
        self.current = Some(self.position);
        self.position += 1;
        Some(instruction)
    }
}
