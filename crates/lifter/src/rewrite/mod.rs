//! Rewrite pipeline over lifted trees
//!
//! A raw lift still holds `Capture` nodes and bytecode-level noise such as
//! boxing calls and `x == true` comparisons. The pipeline substitutes the
//! captured values and simplifies the tree in a fixed order of passes. Every
//! pass reports how many rewrites it made and is a no-op on its own output.

pub mod boolean;
pub mod boxing;
pub mod branch;
pub mod capture;
pub mod dedup;
pub mod folding;

pub use boolean::BooleanSimplification;
pub use boxing::BoxingElimination;
pub use branch::BranchFolding;
pub use capture::CaptureResolution;
pub use dedup::DuplicateOperandRemoval;
pub use folding::ConstantFolding;

use crate::config::LiftConfig;
use crate::error::{LiftError, LiftResult};
use crate::lift::ClosureAnalyzer;
use crate::tree::{Expression, Literal, NestedClosure, NodeId, Tree};
use quarry_bytecode::{MemberResolver, Value};
use tracing::debug;

/// Everything a pass may consult besides the tree.
#[derive(Clone, Copy)]
pub struct RewriteContext<'r> {
    pub captured: &'r [Value],
    pub resolver: &'r dyn MemberResolver,
    pub analyzer: Option<&'r dyn ClosureAnalyzer>,
    pub config: &'r LiftConfig,
}

impl<'r> RewriteContext<'r> {
    pub fn new(
        captured: &'r [Value],
        resolver: &'r dyn MemberResolver,
        config: &'r LiftConfig,
    ) -> Self {
        Self {
            captured,
            resolver,
            analyzer: None,
            config,
        }
    }

    pub fn with_analyzer(mut self, analyzer: &'r dyn ClosureAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Same collaborators, different captured values.
    pub fn with_captured<'n>(&self, captured: &'n [Value]) -> RewriteContext<'n>
    where
        'r: 'n,
    {
        RewriteContext {
            captured,
            resolver: self.resolver,
            analyzer: self.analyzer,
            config: self.config,
        }
    }
}

pub trait RewritePass: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite `tree` in place, returning the number of rewrites made.
    fn run(&self, tree: &mut Tree, context: &RewriteContext<'_>) -> LiftResult<usize>;
}

/// Rewrites made per pass, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub per_pass: Vec<(&'static str, usize)>,
}

impl RewriteStats {
    pub fn total(&self) -> usize {
        self.per_pass.iter().map(|(_, count)| count).sum()
    }

    pub fn get(&self, pass: &str) -> Option<usize> {
        self.per_pass
            .iter()
            .find(|(name, _)| *name == pass)
            .map(|(_, count)| *count)
    }
}

pub struct RewritePipeline {
    passes: Vec<Box<dyn RewritePass>>,
}

impl RewritePipeline {
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Capture resolution, boxing elimination, constant folding, boolean
    /// simplification and duplicate operand removal.
    pub fn standard() -> Self {
        Self::empty()
            .with_pass(CaptureResolution)
            .with_pass(BoxingElimination)
            .with_pass(ConstantFolding)
            .with_pass(BooleanSimplification)
            .with_pass(DuplicateOperandRemoval)
    }

    /// The standard pipeline plus the opt-in passes enabled in `config`.
    pub fn for_config(config: &LiftConfig) -> Self {
        let pipeline = Self::standard();
        if config.fold_boolean_branches {
            pipeline.with_pass(BranchFolding)
        } else {
            pipeline
        }
    }

    pub fn with_pass(mut self, pass: impl RewritePass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn run(&self, tree: &mut Tree, context: &RewriteContext<'_>) -> LiftResult<RewriteStats> {
        let mut stats = RewriteStats::default();
        for pass in &self.passes {
            let count = pass.run(tree, context)?;
            debug!(pass = pass.name(), rewrites = count, "rewrite pass finished");
            stats.per_pass.push((pass.name(), count));
        }
        Ok(stats)
    }
}

impl Default for RewritePipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Expression node standing for a runtime value.
pub(crate) fn value_node(
    tree: &mut Tree,
    value: &Value,
    context: &RewriteContext<'_>,
) -> LiftResult<NodeId> {
    if let Some(literal) = Literal::from_value(value) {
        return Ok(tree.add_literal(literal));
    }
    match value {
        Value::Array { element, items } => {
            let elements = items
                .iter()
                .map(|item| value_node(tree, item, context))
                .collect::<LiftResult<Vec<_>>>()?;
            Ok(tree.add_expression(Expression::ArrayLiteral {
                element: element.clone(),
                elements,
            }))
        }
        Value::Closure(closure) => {
            let analyzer = context.analyzer.ok_or_else(|| {
                LiftError::unsupported(
                    format!("captured closure {} without a closure analyzer", closure.site),
                    None,
                )
            })?;
            let analysis = analyzer.analyze_closure(&closure.site, &closure.captured)?;
            Ok(tree.add_expression(Expression::Closure(Box::new(NestedClosure {
                site: closure.site.clone(),
                tree: analysis.tree,
                arguments: analysis.arguments,
                captures: Vec::new(),
                resolved: true,
            }))))
        }
        other => Err(LiftError::structural(format!(
            "value {} has no expression form",
            other
        ))),
    }
}
