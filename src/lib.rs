//! # Quarry
//!
//! Lifts the compiled body of a closure into a structured expression tree,
//! with the values the closure captured substituted in and the result
//! simplified.
//!
//! The work is split across the workspace:
//!
//! - `quarry_bytecode`: instruction model, method bodies, runtime values and
//!   the host traits for loading bodies and resolving members
//! - `quarry_lifter`: symbolic interpreter, branch reconstruction, the tree
//!   and the rewrite passes
//! - this crate: the [`Analyzer`] facade and its [`AnalysisCache`]
//!
//! ## Usage
//!
//! ```rust
//! use quarry::{Analyzer, BodyBuilder, InMemoryLoader, Instruction, InvokeKind, MethodRef, TypeRef, Value, ValueKind};
//! use std::sync::Arc;
//!
//! // (s) -> s.equals(captured)
//! let mut builder = BodyBuilder::new("com/acme/Filters", "lambda$0", "(Ljava/lang/String;Ljava/lang/String;)Z").unwrap();
//! builder
//!     .local(1, "s", TypeRef::string())
//!     .push(Instruction::Load { kind: ValueKind::Reference, slot: 1 })
//!     .push(Instruction::Load { kind: ValueKind::Reference, slot: 0 })
//!     .push(Instruction::Invoke {
//!         kind: InvokeKind::Virtual,
//!         method: MethodRef::new("java/lang/String", "equals", "(Ljava/lang/Object;)Z").unwrap(),
//!     })
//!     .push(Instruction::Return(Some(ValueKind::Int)));
//! let mut loader = InMemoryLoader::new();
//! let site = loader.insert(builder.build().unwrap());
//!
//! let analyzer = Analyzer::new(Arc::new(loader));
//! let analysis = analyzer.analyze(&site, &[Value::from("foo")]).unwrap();
//! assert_eq!(analysis.tree.render(), "return s.equals(\"foo\");\n");
//! assert_eq!(analyzer.cache().cache_misses(), 1);
//! ```

pub mod analyzer;
pub mod cache;

pub use analyzer::{Analyzer, AnalyzerBuilder, BuildError};
pub use cache::{AnalysisCache, CacheListener, CachedLift, ListenerId};

pub use quarry_bytecode::{
    BodyBuilder, BytecodeError, ClosureSite, Constant, FieldRef, HostObject, InMemoryLoader,
    Instruction, InvokeKind, JumpOp, MemberResolver, MethodBody, MethodBodyLoader, MethodRef,
    ResolveError, StaticRegistry, TypeRef, Value, ValueKind,
};
pub use quarry_lifter::{
    Analysis, Argument, Expression, LiftConfig, LiftError, LiftResult, Literal, NodeId, Operator,
    RewritePipeline, Statement, Tree, Visitor,
};
