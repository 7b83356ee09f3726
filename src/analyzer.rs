//! Closure analysis facade

use crate::cache::{AnalysisCache, CachedLift};
use quarry_bytecode::{ClosureSite, MemberResolver, MethodBodyLoader, StaticRegistry, Value};
use quarry_lifter::{
    Analysis, ClosureAnalyzer, LiftConfig, LiftContext, LiftError, LiftResult, RewriteContext,
    RewritePipeline, capture_types, lift_body,
};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Analyzer needs a method body loader")]
    MissingLoader,
}

/// Lifts closure bodies, caches the raw lifts and rewrites them for the
/// captured values of each call.
pub struct Analyzer {
    loader: Arc<dyn MethodBodyLoader>,
    resolver: Arc<dyn MemberResolver>,
    config: LiftConfig,
    pipeline: RewritePipeline,
    cache: AnalysisCache,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Analyzer with the default configuration and an empty `StaticRegistry`.
    pub fn new(loader: Arc<dyn MethodBodyLoader>) -> Self {
        Self::with_parts(
            loader,
            Arc::new(StaticRegistry::new()),
            LiftConfig::default(),
        )
    }

    fn with_parts(
        loader: Arc<dyn MethodBodyLoader>,
        resolver: Arc<dyn MemberResolver>,
        config: LiftConfig,
    ) -> Self {
        Self {
            loader,
            resolver,
            pipeline: RewritePipeline::for_config(&config),
            config,
            cache: AnalysisCache::new(),
        }
    }

    /// Analyze the closure at `site` for the values it captured.
    #[tracing::instrument(level = "debug", skip(self, site, captured), fields(site = %site, captures = captured.len()))]
    pub fn analyze(&self, site: &ClosureSite, captured: &[Value]) -> LiftResult<Analysis> {
        let lifted = self.cache.get_or_lift(site, || self.lift(site, captured))?;
        if lifted.capture_count != captured.len() {
            return Err(LiftError::structural(format!(
                "{} was lifted with {} captured values, called with {}",
                site,
                lifted.capture_count,
                captured.len()
            )));
        }

        let mut analysis = lifted.analysis.clone();
        let context = RewriteContext::new(captured, self.resolver.as_ref(), &self.config)
            .with_analyzer(self);
        let stats = self.pipeline.run(&mut analysis.tree, &context)?;
        debug!(rewrites = stats.total(), "analyzed closure");
        Ok(analysis)
    }

    /// Analyze every `(site, captured)` pair in parallel. Results keep the
    /// order of `requests`.
    pub fn analyze_all(&self, requests: &[(ClosureSite, Vec<Value>)]) -> Vec<LiftResult<Analysis>> {
        requests
            .par_iter()
            .map(|(site, captured)| self.analyze(site, captured))
            .collect()
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn config(&self) -> &LiftConfig {
        &self.config
    }

    fn lift(&self, site: &ClosureSite, captured: &[Value]) -> LiftResult<CachedLift> {
        let body = self.loader.load(site)?;
        let types = capture_types(&body, captured);
        let context = LiftContext::new(self.loader.as_ref(), &self.config);
        let analysis = lift_body(&body, &types, &context)?;
        Ok(CachedLift {
            analysis,
            capture_count: types.len(),
        })
    }
}

impl ClosureAnalyzer for Analyzer {
    fn analyze_closure(&self, site: &ClosureSite, captured: &[Value]) -> LiftResult<Analysis> {
        self.analyze(site, captured)
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("passes", &self.pipeline.pass_names())
            .field("cache", &self.cache)
            .finish()
    }
}

#[derive(Default)]
pub struct AnalyzerBuilder {
    loader: Option<Arc<dyn MethodBodyLoader>>,
    resolver: Option<Arc<dyn MemberResolver>>,
    config: LiftConfig,
}

impl AnalyzerBuilder {
    pub fn loader(mut self, loader: Arc<dyn MethodBodyLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Defaults to an empty `StaticRegistry`.
    pub fn resolver(mut self, resolver: Arc<dyn MemberResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(mut self, config: LiftConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Analyzer, BuildError> {
        let loader = self.loader.ok_or(BuildError::MissingLoader)?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(StaticRegistry::new()));
        Ok(Analyzer::with_parts(loader, resolver, self.config))
    }
}
