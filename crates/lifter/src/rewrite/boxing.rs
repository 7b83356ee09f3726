//! Removal of compiler-inserted boxing and unboxing calls.

use super::{RewriteContext, RewritePass};
use crate::error::LiftResult;
use crate::tree::{Expression, Literal, NodeId, Tree};
use quarry_bytecode::{MethodRef, TypeRef};

/// Each wrapper class with its primitive and unwrap method.
const WRAPPERS: &[(&str, TypeRef, &str)] = &[
    ("java/lang/Integer", TypeRef::Int, "intValue"),
    ("java/lang/Long", TypeRef::Long, "longValue"),
    ("java/lang/Short", TypeRef::Short, "shortValue"),
    ("java/lang/Byte", TypeRef::Byte, "byteValue"),
    ("java/lang/Character", TypeRef::Char, "charValue"),
    ("java/lang/Boolean", TypeRef::Boolean, "booleanValue"),
    ("java/lang/Float", TypeRef::Float, "floatValue"),
    ("java/lang/Double", TypeRef::Double, "doubleValue"),
];

fn primitive_of(owner: &str) -> Option<(&'static TypeRef, &'static str)> {
    WRAPPERS
        .iter()
        .find(|(wrapper, ..)| *wrapper == owner)
        .map(|(_, primitive, unwrap)| (primitive, *unwrap))
}

/// Removes boxing calls whose result has the type of their operand:
/// `Integer.valueOf(int)` and `Integer.intValue()`, and the same pair on the
/// other wrappers. Narrowing or widening unwraps such as `Long.intValue()`
/// change the value's type and are kept.
pub struct BoxingElimination;

impl RewritePass for BoxingElimination {
    fn name(&self) -> &'static str {
        "boxing-elimination"
    }

    fn run(&self, tree: &mut Tree, _context: &RewriteContext<'_>) -> LiftResult<usize> {
        let mut eliminated = 0;
        for id in tree.post_order() {
            if !tree.is_live(id) {
                continue;
            }
            if let Some(inner) = unboxed(tree, id) {
                tree.replace_element(id, inner)?;
                eliminated += 1;
            }
        }
        Ok(eliminated)
    }
}

/// The boxed or unboxed operand of a boxing call at `id`.
fn unboxed(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let Some(Expression::MethodInvocation {
        source,
        method,
        arguments,
    }) = tree.expression(id)
    else {
        return None;
    };

    if is_unwrap(method) && arguments.is_empty() {
        return Some(*source);
    }
    let on_class = matches!(tree.literal(*source), Some(Literal::Class(_)));
    if on_class && is_value_of(method) && arguments.len() == 1 {
        return Some(arguments[0]);
    }
    None
}

fn is_unwrap(method: &MethodRef) -> bool {
    primitive_of(&method.owner).is_some_and(|(primitive, unwrap)| {
        method.name == unwrap
            && method.descriptor.parameters.is_empty()
            && method.descriptor.return_type == *primitive
    })
}

fn is_value_of(method: &MethodRef) -> bool {
    primitive_of(&method.owner).is_some_and(|(primitive, _)| {
        method.name == "valueOf"
            && matches!(method.descriptor.parameters.as_slice(), [only] if only == primitive)
    })
}
