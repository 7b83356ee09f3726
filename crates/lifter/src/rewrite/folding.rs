//! Evaluation of member reads on constant receivers.

use super::{RewriteContext, RewritePass, value_node};
use crate::error::{LiftError, LiftResult};
use crate::tree::{Expression, Literal, NodeId, Tree};
use quarry_bytecode::{Receiver, TypeRef, Value};
use tracing::trace;

/// Field reads and zero-argument calls on a class literal or a resolved
/// object are evaluated through the member resolver and replaced by their
/// result.
pub struct ConstantFolding;

impl RewritePass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn run(&self, tree: &mut Tree, context: &RewriteContext<'_>) -> LiftResult<usize> {
        let mut folded = 0;
        for id in tree.post_order() {
            if !tree.is_live(id) {
                continue;
            }
            let Some(value) = evaluate(tree, id, context)? else {
                continue;
            };
            trace!(node = %id, value = %value, "folded member read");
            let node = value_node(tree, &value, context)?;
            tree.replace_element(id, node)?;
            folded += 1;
        }
        Ok(folded)
    }
}

fn evaluate(tree: &Tree, id: NodeId, context: &RewriteContext<'_>) -> LiftResult<Option<Value>> {
    let result = match tree.expression(id) {
        Some(Expression::FieldAccess { source, field }) => {
            let Some(receiver) = receiver(tree, *source) else {
                return Ok(None);
            };
            context.resolver.read_field(receiver, field)
        }
        Some(Expression::MethodInvocation {
            source,
            method,
            arguments,
        }) if arguments.is_empty() && method.descriptor.return_type != TypeRef::Void => {
            let Some(receiver) = receiver(tree, *source) else {
                return Ok(None);
            };
            context.resolver.invoke(receiver, method, &[])
        }
        _ => return Ok(None),
    };
    result.map(Some).map_err(LiftError::resolution)
}

fn receiver(tree: &Tree, id: NodeId) -> Option<Receiver<'_>> {
    match tree.literal(id)? {
        Literal::Class(ty) => ty.class_name().map(Receiver::Class),
        Literal::Object(object) => Some(Receiver::Object(object)),
        _ => None,
    }
}
