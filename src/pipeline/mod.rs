//! Dispatch pipeline
//!
//! An ordered, immutable chain of stages routes a resolution to the one
//! adapter that owns the name. Validation always runs first and rejects
//! malformed input before any RPC is issued; adapter stages are tried in
//! registration order and the first match wins; an optional observer wraps
//! the whole chain for logging and always re-raises the outcome unchanged.
//! Execution across adapters is strictly sequential, never parallel.

use crate::models::{RecordMap, ResolutionContext};
use crate::services::NamingServiceAdapter;
use crate::shared::error::{ResolutionError, Result};
use crate::shared::validation::DomainValidator;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One stage of the dispatch chain.
///
/// A stage either produces a result itself or defers to the remainder of
/// the chain through `next`; it must never do both.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Handle the context or delegate via `next.run(ctx)`.
    async fn handle(&self, ctx: &ResolutionContext, next: Next<'_>) -> Result<RecordMap>;
}

/// Continuation over the remaining stages of the chain.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
}

impl<'a> Next<'a> {
    /// Run the remaining stages; an exhausted chain means no adapter
    /// claimed the domain.
    pub async fn run(self, ctx: &ResolutionContext) -> Result<RecordMap> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(ctx, Next { stages: rest }).await,
            None => Err(ResolutionError::UnsupportedDomain {
                domain: ctx.domain.clone(),
            }),
        }
    }
}

/// Syntax gate: rejects malformed domains with `InvalidDomainAddress`
/// without invoking any adapter, guaranteeing zero RPC calls for bad input.
pub struct ValidationStage;

#[async_trait]
impl Stage for ValidationStage {
    async fn handle(&self, ctx: &ResolutionContext, next: Next<'_>) -> Result<RecordMap> {
        if !DomainValidator::is_valid_syntax(&ctx.domain) {
            return Err(ResolutionError::InvalidDomainAddress {
                domain: ctx.domain.clone(),
            });
        }
        next.run(ctx).await
    }
}

/// Adapter stage: claims the domain when the backend owns its suffix,
/// otherwise defers. A claiming stage terminates the chain.
pub struct AdapterStage {
    adapter: Arc<NamingServiceAdapter>,
}

impl AdapterStage {
    /// Wrap an adapter as a pipeline stage.
    pub fn new(adapter: Arc<NamingServiceAdapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl Stage for AdapterStage {
    async fn handle(&self, ctx: &ResolutionContext, next: Next<'_>) -> Result<RecordMap> {
        if self.adapter.is_supported_domain(&ctx.domain) {
            return self.adapter.resolve(ctx).await;
        }
        next.run(ctx).await
    }
}

/// Observer stage: logs the settled outcome and forwards it unchanged.
/// Never swallows a failure.
pub struct ObserverStage;

#[async_trait]
impl Stage for ObserverStage {
    async fn handle(&self, ctx: &ResolutionContext, next: Next<'_>) -> Result<RecordMap> {
        let request_id = Uuid::new_v4();
        debug!(request_id = %request_id, domain = %ctx.domain, "Dispatching resolution");

        let outcome = next.run(ctx).await;
        match &outcome {
            Ok(result) => info!(
                request_id = %request_id,
                domain = %ctx.domain,
                records = result.records.len(),
                "Resolution completed"
            ),
            Err(error) => warn!(
                request_id = %request_id,
                domain = %ctx.domain,
                error = %error,
                "Resolution failed"
            ),
        }
        outcome
    }
}

/// Immutable stage chain. Built once; no stage may be added after build.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    adapters: Vec<Arc<NamingServiceAdapter>>,
}

impl Pipeline {
    /// Start building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder {
            adapters: Vec::new(),
            observe: false,
        }
    }

    /// Resolve a context through the chain.
    pub async fn resolve(&self, ctx: &ResolutionContext) -> Result<RecordMap> {
        Next {
            stages: &self.stages,
        }
        .run(ctx)
        .await
    }

    /// The adapter that owns a domain, if any, honoring registration order.
    pub fn owning_adapter(&self, domain: &str) -> Option<&NamingServiceAdapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.is_supported_domain(domain))
            .map(|adapter| adapter.as_ref())
    }

    /// Registered adapters in priority order.
    pub fn adapters(&self) -> &[Arc<NamingServiceAdapter>] {
        &self.adapters
    }
}

/// Builder for [`Pipeline`]; ordering of `adapter` calls is priority order.
pub struct PipelineBuilder {
    adapters: Vec<Arc<NamingServiceAdapter>>,
    observe: bool,
}

impl PipelineBuilder {
    /// Register an adapter. Registration order is dispatch priority.
    pub fn adapter(mut self, adapter: NamingServiceAdapter) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Wrap the chain in a logging observer.
    pub fn with_observer(mut self) -> Self {
        self.observe = true;
        self
    }

    /// Freeze the chain: observer (optional) → validation → adapters.
    pub fn build(self) -> Pipeline {
        let mut stages: Vec<Arc<dyn Stage>> = Vec::new();
        if self.observe {
            stages.push(Arc::new(ObserverStage));
        }
        stages.push(Arc::new(ValidationStage));
        for adapter in &self.adapters {
            stages.push(Arc::new(AdapterStage::new(adapter.clone())));
        }
        Pipeline {
            stages,
            adapters: self.adapters,
        }
    }
}
