//! Removal of repeated operands in logical operations.

use super::{RewriteContext, RewritePass};
use crate::error::LiftResult;
use crate::tree::{Expression, NodeId, Operator, Tree};

/// Drops operands of `&&` and `||` that are structurally equal to an earlier
/// operand. A two-operand operation collapses to the survivor. `^` is left
/// alone since `a ^ a` is `false`, not `a`.
pub struct DuplicateOperandRemoval;

impl RewritePass for DuplicateOperandRemoval {
    fn name(&self) -> &'static str {
        "duplicate-operand-removal"
    }

    fn run(&self, tree: &mut Tree, _context: &RewriteContext<'_>) -> LiftResult<usize> {
        let mut removed = 0;
        for id in tree.post_order() {
            while tree.is_live(id) {
                let Some(duplicate) = first_duplicate(tree, id) else {
                    break;
                };
                tree.remove(duplicate)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn first_duplicate(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let Some(Expression::Operation { operator, operands }) = tree.expression(id) else {
        return None;
    };
    if !matches!(operator, Operator::And | Operator::Or) {
        return None;
    }
    operands.iter().enumerate().find_map(|(i, candidate)| {
        operands[..i]
            .iter()
            .any(|earlier| tree.subtree_eq(*earlier, tree, *candidate))
            .then_some(*candidate)
    })
}
