//! # Quarry Lifter
//!
//! Turns the bytecode body of a closure into an expression/statement tree.
//!
//! ## Stages
//!
//! 1. **Reading** (`reader`): a symbolic stack interpreter walks the
//!    instructions, keeping expression nodes instead of runtime values, and
//!    rebuilds if-statements from conditional jumps
//! 2. **Tree** (`tree`): arena of nodes with a parent table, canonical
//!    operand order and structural equality
//! 3. **Rewriting** (`rewrite`): captured values are substituted and the
//!    tree is simplified by a pipeline of passes
//!
//! ## Usage
//!
//! ```rust
//! use quarry_bytecode::{BodyBuilder, Constant, InMemoryLoader, Instruction, StaticRegistry, ValueKind};
//! use quarry_lifter::{LiftConfig, RewriteContext, RewritePipeline, lift};
//!
//! let mut builder = BodyBuilder::new("com/acme/Filters", "lambda$0", "()Z").unwrap();
//! builder
//!     .push(Instruction::Const(Constant::Int(1)))
//!     .push(Instruction::Return(Some(ValueKind::Int)));
//! let mut loader = InMemoryLoader::new();
//! let site = loader.insert(builder.build().unwrap());
//!
//! let config = LiftConfig::default();
//! let mut analysis = lift(&site, &[], &loader, &config).unwrap();
//! let resolver = StaticRegistry::new();
//! RewritePipeline::standard()
//!     .run(&mut analysis.tree, &RewriteContext::new(&[], &resolver, &config))
//!     .unwrap();
//! assert_eq!(analysis.tree.render(), "return true;\n");
//! ```

pub mod config;
pub mod error;
pub mod lift;
pub mod reader;
pub mod rewrite;
pub mod tree;
pub mod visitor;

pub use config::LiftConfig;
pub use error::{LiftError, LiftResult};
pub use lift::{Analysis, ClosureAnalyzer, LiftContext, capture_types, lift, lift_body};
pub use rewrite::{RewriteContext, RewritePass, RewritePipeline, RewriteStats};
pub use tree::{
    Argument, Expression, Literal, NestedClosure, Node, NodeId, Number, Operator, Statement, Tree,
};
pub use visitor::Visitor;
