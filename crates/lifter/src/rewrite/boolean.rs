//! Comparisons against boolean literals.

use super::{RewriteContext, RewritePass};
use crate::error::LiftResult;
use crate::tree::{Expression, NodeId, Operator, Tree};

/// `x == true` and `x != false` become `x`; `x == false` and `x != true`
/// become the negation of `x`. Two literal operands fold to a literal.
pub struct BooleanSimplification;

impl RewritePass for BooleanSimplification {
    fn name(&self) -> &'static str {
        "boolean-simplification"
    }

    fn run(&self, tree: &mut Tree, _context: &RewriteContext<'_>) -> LiftResult<usize> {
        let mut simplified = 0;
        for id in tree.post_order() {
            if !tree.is_live(id) {
                continue;
            }
            if let Some(replacement) = simplify(tree, id) {
                tree.replace_element(id, replacement)?;
                simplified += 1;
            }
        }
        Ok(simplified)
    }
}

fn simplify(tree: &mut Tree, id: NodeId) -> Option<NodeId> {
    let (operator, left, right) = match tree.expression(id)? {
        Expression::Operation { operator, operands }
            if matches!(operator, Operator::Equals | Operator::NotEquals)
                && operands.len() == 2 =>
        {
            (*operator, operands[0], operands[1])
        }
        _ => return None,
    };
    let as_bool = |tree: &Tree, id| tree.literal(id).and_then(|literal| literal.as_bool());

    let (literal, other) = match (as_bool(tree, left), as_bool(tree, right)) {
        (Some(a), Some(b)) => {
            let equal = a == b;
            return Some(tree.add_boolean(equal == (operator == Operator::Equals)));
        }
        (Some(a), None) => (a, right),
        (None, Some(b)) => (b, left),
        (None, None) => return None,
    };

    // `x == true` keeps x, as does `x != false`.
    if literal == (operator == Operator::Equals) {
        Some(other)
    } else {
        Some(tree.negate(other))
    }
}
