//! Lifter configuration

use serde::{Deserialize, Serialize};

/// Limits and opt-in passes for one lift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    /// Maximum nesting of reconstructed if-statements.
    pub max_branch_depth: usize,
    /// Maximum nesting of closures lifted inside closures.
    pub max_nested_closure_depth: usize,
    /// Run the branch folding pass after the standard pipeline.
    pub fold_boolean_branches: bool,
    /// Bodies longer than this are rejected before reading.
    pub max_instructions: usize,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            max_branch_depth: 8,
            max_nested_closure_depth: 4,
            fold_boolean_branches: false,
            max_instructions: 4096,
        }
    }
}

impl LiftConfig {
    pub fn with_max_branch_depth(mut self, depth: usize) -> Self {
        self.max_branch_depth = depth;
        self
    }

    pub fn with_max_nested_closure_depth(mut self, depth: usize) -> Self {
        self.max_nested_closure_depth = depth;
        self
    }

    pub fn with_boolean_branch_folding(mut self, enabled: bool) -> Self {
        self.fold_boolean_branches = enabled;
        self
    }

    pub fn with_max_instructions(mut self, limit: usize) -> Self {
        self.max_instructions = limit;
        self
    }
}
