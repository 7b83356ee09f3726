//! Substitution of captured values.

use super::{RewriteContext, RewritePass, RewritePipeline, value_node};
use crate::error::{LiftError, LiftResult};
use crate::tree::{Expression, Tree};
use quarry_bytecode::Value;

/// Replaces every `Capture` with the captured value and rewrites closures
/// created from captures with the values they were handed.
pub struct CaptureResolution;

impl RewritePass for CaptureResolution {
    fn name(&self) -> &'static str {
        "capture-resolution"
    }

    fn run(&self, tree: &mut Tree, context: &RewriteContext<'_>) -> LiftResult<usize> {
        let mut resolved = 0;
        for id in tree.post_order() {
            if !tree.is_live(id) {
                continue;
            }
            match tree.expression(id) {
                Some(Expression::Capture { index, .. }) => {
                    let value = captured(context, *index)?;
                    let node = value_node(tree, value, context)?;
                    tree.replace_element(id, node)?;
                    resolved += 1;
                }
                Some(Expression::Closure(nested)) if !nested.resolved => {
                    let mut nested = nested.as_ref().clone();
                    let values = nested
                        .captures
                        .iter()
                        .map(|index| captured(context, *index).cloned())
                        .collect::<LiftResult<Vec<_>>>()?;
                    RewritePipeline::for_config(context.config)
                        .run(&mut nested.tree, &context.with_captured(&values))?;
                    nested.captures.clear();
                    nested.resolved = true;
                    let node = tree.add_expression(Expression::Closure(Box::new(nested)));
                    tree.replace_element(id, node)?;
                    resolved += 1;
                }
                _ => {}
            }
        }
        Ok(resolved)
    }
}

fn captured<'v>(context: &RewriteContext<'v>, index: usize) -> LiftResult<&'v Value> {
    context.captured.get(index).ok_or_else(|| {
        LiftError::structural(format!(
            "capture {} referenced but only {} values were captured",
            index,
            context.captured.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LiftConfig;
    use crate::tree::{Operator, Statement};
    use quarry_bytecode::{FieldRef, StaticRegistry, TypeRef};
    use smallvec::smallvec;

    #[test]
    fn test_string_capture_replaced_by_literal() {
        let mut tree = Tree::new();
        let person = tree.add_expression(Expression::Local {
            slot: 1,
            name: "p".into(),
            ty: TypeRef::object("com/acme/Person"),
        });
        let name = tree.add_expression(Expression::FieldAccess {
            source: person,
            field: FieldRef::new("com/acme/Person", "name", TypeRef::string()),
        });
        let capture = tree.add_expression(Expression::Capture {
            index: 0,
            ty: TypeRef::string(),
        });
        let eq = tree.add_operation(Operator::Equals, smallvec![name, capture]);
        let ret = tree.add_statement(Statement::Return(eq));
        tree.push_root(ret).unwrap();

        let resolver = StaticRegistry::new();
        let config = LiftConfig::default();
        let values = [Value::from("foo")];
        let context = RewriteContext::new(&values, &resolver, &config);
        assert_eq!(CaptureResolution.run(&mut tree, &context).unwrap(), 1);
        assert_eq!(tree.capture_count(), 0);
        let rendered = tree.render();
        assert!(rendered.contains("p.name"));
        assert!(rendered.contains("\"foo\""));
        assert_eq!(CaptureResolution.run(&mut tree, &context).unwrap(), 0);
    }

    #[test]
    fn test_missing_value_is_structural() {
        let mut tree = Tree::new();
        let capture = tree.add_expression(Expression::Capture {
            index: 2,
            ty: TypeRef::Int,
        });
        let ret = tree.add_statement(Statement::Return(capture));
        tree.push_root(ret).unwrap();

        let resolver = StaticRegistry::new();
        let config = LiftConfig::default();
        let context = RewriteContext::new(&[], &resolver, &config);
        assert!(matches!(
            CaptureResolution.run(&mut tree, &context),
            Err(LiftError::StructuralInconsistency(_))
        ));
    }
}
