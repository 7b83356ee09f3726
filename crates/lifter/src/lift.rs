//! Lifting entry points
//!
//! `lift_body` turns one method body into a raw tree: statements read by the
//! symbolic interpreter, with captured values still represented by `Capture`
//! nodes. Substituting values and simplifying is left to the rewrite pipeline.

use crate::config::LiftConfig;
use crate::error::{LiftError, LiftResult};
use crate::reader::{LocalTable, StatementReader};
use crate::tree::{Argument, Tree};
use quarry_bytecode::{
    ClosureSite, InstructionCursor, MethodBody, MethodBodyLoader, TypeRef, Value,
};
use tracing::debug;

/// Lifted body of a closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub tree: Tree,
    pub arguments: Vec<Argument>,
}

/// Shared state of one lift, handed down to nested closures.
#[derive(Clone, Copy)]
pub struct LiftContext<'l> {
    pub loader: &'l dyn MethodBodyLoader,
    pub config: &'l LiftConfig,
    pub closure_depth: usize,
}

impl<'l> LiftContext<'l> {
    pub fn new(loader: &'l dyn MethodBodyLoader, config: &'l LiftConfig) -> Self {
        Self {
            loader,
            config,
            closure_depth: 0,
        }
    }

    /// Context for a closure created at `position` inside the current body.
    pub fn nested(&self, position: usize) -> LiftResult<Self> {
        if self.closure_depth >= self.config.max_nested_closure_depth {
            return Err(LiftError::unsupported(
                format!(
                    "closures nested deeper than {}",
                    self.config.max_nested_closure_depth
                ),
                Some(position),
            ));
        }
        Ok(Self {
            closure_depth: self.closure_depth + 1,
            ..*self
        })
    }
}

/// Lift `body`, whose first slots hold values of `capture_types`.
pub fn lift_body(
    body: &MethodBody,
    capture_types: &[TypeRef],
    context: &LiftContext<'_>,
) -> LiftResult<Analysis> {
    if body.len() > context.config.max_instructions {
        return Err(LiftError::unsupported(
            format!(
                "body of {} instructions, limit is {}",
                body.len(),
                context.config.max_instructions
            ),
            None,
        ));
    }

    let locals = LocalTable::new(body, capture_types)?;
    let arguments = locals.arguments().to_vec();
    let mut tree = Tree::new();
    let statements =
        StatementReader::new(InstructionCursor::new(body), locals, context).read(&mut tree)?;
    for statement in statements {
        tree.push_root(statement)?;
    }

    debug!(
        site = %body.site(),
        statements = tree.roots().len(),
        nodes = tree.len(),
        depth = context.closure_depth,
        "lifted body"
    );
    Ok(Analysis { tree, arguments })
}

/// Load the body at `site` and lift it.
pub fn lift(
    site: &ClosureSite,
    capture_types: &[TypeRef],
    loader: &dyn MethodBodyLoader,
    config: &LiftConfig,
) -> LiftResult<Analysis> {
    let body = loader.load(site)?;
    lift_body(&body, capture_types, &LiftContext::new(loader, config))
}

/// Types of the captured slots of `body` for the given values.
///
/// Declared parameters are used where the descriptor has them; the receiver
/// of an instance body and any surplus values take the value's own type.
pub fn capture_types(body: &MethodBody, captured: &[Value]) -> Vec<TypeRef> {
    let offset = usize::from(!body.is_static);
    captured
        .iter()
        .enumerate()
        .map(|(i, value)| {
            if i < offset {
                return TypeRef::object(body.owner.as_str());
            }
            body.descriptor
                .parameters
                .get(i - offset)
                .cloned()
                .unwrap_or_else(|| value.type_ref())
        })
        .collect()
}

/// Analyzes closure values found among captured values.
pub trait ClosureAnalyzer: Send + Sync {
    fn analyze_closure(&self, site: &ClosureSite, captured: &[Value]) -> LiftResult<Analysis>;
}
