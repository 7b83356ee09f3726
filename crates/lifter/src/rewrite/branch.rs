//! Folding of if-statements that only choose a boolean result.

use super::{RewriteContext, RewritePass};
use crate::error::LiftResult;
use crate::tree::{NodeId, Operator, Statement, Tree};
use quarry_bytecode::TypeRef;
use smallvec::smallvec;

/// Rewrites `if (c) return x; else return y;` into a single return when one
/// side is a boolean literal:
///
/// | then     | else     | result          |
/// |----------|----------|-----------------|
/// | `true`   | `false`  | `return c`      |
/// | `false`  | `true`   | `return !c`     |
/// | `b`      | `false`  | `return c && b` |
/// | `true`   | `b`      | `return c \|\| b` |
///
/// When `b` is `c` itself both logical forms reduce to `return c`.
pub struct BranchFolding;

impl RewritePass for BranchFolding {
    fn name(&self) -> &'static str {
        "branch-folding"
    }

    fn run(&self, tree: &mut Tree, _context: &RewriteContext<'_>) -> LiftResult<usize> {
        let mut folded = 0;
        for id in tree.post_order() {
            if !tree.is_live(id) {
                continue;
            }
            if let Some(value) = fold(tree, id) {
                let ret = tree.add_statement(Statement::Return(value));
                tree.replace_element(id, ret)?;
                folded += 1;
            }
        }
        Ok(folded)
    }
}

fn single_return(tree: &Tree, branch: &[NodeId]) -> Option<NodeId> {
    match branch {
        [only] => match tree.statement(*only)? {
            Statement::Return(value) => Some(*value),
            _ => None,
        },
        _ => None,
    }
}

fn fold(tree: &mut Tree, id: NodeId) -> Option<NodeId> {
    let Some(Statement::If {
        condition,
        then_branch,
        else_branch,
    }) = tree.statement(id)
    else {
        return None;
    };
    let condition = *condition;
    let then_value = single_return(tree, then_branch)?;
    let else_value = single_return(tree, else_branch)?;

    let as_bool = |tree: &Tree, id| tree.literal(id).and_then(|literal| literal.as_bool());
    let is_boolean = |tree: &Tree, id| tree.type_of(id) == TypeRef::Boolean;

    match (as_bool(tree, then_value), as_bool(tree, else_value)) {
        (Some(true), Some(false)) => Some(condition),
        (Some(false), Some(true)) => Some(tree.negate(condition)),
        (None, Some(false)) if is_boolean(tree, then_value) => {
            Some(logical(tree, Operator::And, condition, then_value))
        }
        (Some(true), None) if is_boolean(tree, else_value) => {
            Some(logical(tree, Operator::Or, condition, else_value))
        }
        _ => None,
    }
}

fn logical(tree: &mut Tree, operator: Operator, condition: NodeId, value: NodeId) -> NodeId {
    if tree.subtree_eq(condition, tree, value) {
        condition
    } else {
        tree.add_operation(operator, smallvec![condition, value])
    }
}
