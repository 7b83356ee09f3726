//! Virtual operand stack of the symbolic interpreter.

use crate::error::{LiftError, LiftResult};
use crate::tree::NodeId;
use quarry_bytecode::Instruction;
use smallvec::SmallVec;

/// Stack of expression nodes standing in for runtime operands.
#[derive(Debug, Clone, Default)]
pub struct VirtualStack {
    elements: SmallVec<[NodeId; 8]>,
}

impl VirtualStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn push(&mut self, id: NodeId) {
        self.elements.push(id);
    }

    /// Pop an operand for `instruction`; an empty stack means the body is malformed.
    pub fn pop(&mut self, instruction: &Instruction) -> LiftResult<NodeId> {
        self.elements.pop().ok_or_else(|| {
            LiftError::structural(format!("`{}` popped an empty operand stack", instruction))
        })
    }

    /// Pop `count` operands, returned in push order.
    pub fn pop_many(
        &mut self,
        count: usize,
        instruction: &Instruction,
    ) -> LiftResult<SmallVec<[NodeId; 4]>> {
        if self.elements.len() < count {
            return Err(LiftError::structural(format!(
                "`{}` needs {} operands, stack holds {}",
                instruction,
                count,
                self.elements.len()
            )));
        }
        let split = self.elements.len() - count;
        Ok(self.elements.drain(split..).collect())
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.elements.last().copied()
    }

    /// Remove everything, bottom first.
    pub fn drain(&mut self) -> impl Iterator<Item = NodeId> + '_ {
        self.elements.drain(..)
    }
}
