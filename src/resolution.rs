//! Public resolution API
//!
//! [`Resolution`] wires the dispatch pipeline, the TTL cache and the
//! configured naming services behind the accessor surface embedders call.

use crate::cache::TtlCache;
use crate::config::ResolutionConfig;
use crate::models::{RecordField, RecordMap, ResolutionContext};
use crate::namehash;
use crate::pipeline::Pipeline;
use crate::provider::transports::HttpTransport;
use crate::provider::ProviderSource;
use crate::services::{NamingServiceAdapter, ServiceConfig, ServiceName};
use crate::shared::error::{ResolutionError, Result};
use crate::shared::validation::DomainValidator;
use std::sync::Arc;
use std::time::Duration;

/// Output base of a namehash string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamehashFormat {
    /// Hexadecimal
    #[default]
    Hex,
    /// Unsigned decimal
    Dec,
}

/// Namehash encoding options.
#[derive(Debug, Clone, Copy)]
pub struct NamehashOptions {
    /// Prepend `0x` to hex output
    pub prefix: bool,
    /// Output base
    pub format: NamehashFormat,
}

impl Default for NamehashOptions {
    fn default() -> Self {
        Self {
            prefix: true,
            format: NamehashFormat::Hex,
        }
    }
}

/// Multi-backend domain resolver.
pub struct Resolution {
    pipeline: Pipeline,
    cache: Option<TtlCache<String, RecordMap>>,
    cache_ttl: Duration,
}

impl Resolution {
    /// Start building a resolver from explicit adapters.
    pub fn builder() -> ResolutionBuilder {
        ResolutionBuilder {
            adapters: Vec::new(),
            observe: true,
            cache_ttl: None,
        }
    }

    /// Build a resolver from declarative configuration, using the HTTP
    /// transport for every configured service.
    pub fn from_config(config: &ResolutionConfig) -> Result<Self> {
        config.validate_config()?;

        let mut builder = Self::builder();
        if let Some(settings) = &config.ens {
            builder = builder.service(NamingServiceAdapter::ens(http_service_config(settings)?)?);
        }
        if let Some(settings) = &config.cns {
            builder = builder.service(NamingServiceAdapter::cns(http_service_config(settings)?)?);
        }
        if let Some(settings) = &config.zns {
            builder = builder.service(NamingServiceAdapter::zns(http_service_config(settings)?)?);
        }
        if let Some(settings) = &config.rns {
            builder = builder.service(NamingServiceAdapter::rns(http_service_config(settings)?)?);
        }

        if config.cache.enabled {
            builder = builder.with_cache(Duration::from_secs(config.cache.ttl_seconds));
        }
        Ok(builder.build())
    }

    /// Resolve the default field set (resolver plus primary address).
    pub async fn resolve(&self, domain: &str) -> Result<RecordMap> {
        let domain = DomainValidator::prepare_domain(domain);
        self.execute(ResolutionContext::new(domain)).await
    }

    /// Currency address of a domain. Tickers are case-insensitive; a
    /// missing address record for a known domain maps to
    /// `UnsupportedCurrency`.
    pub async fn address(&self, domain: &str, ticker: &str) -> Result<String> {
        let domain = DomainValidator::prepare_domain(domain);
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(ResolutionError::UnspecifiedCurrency { domain });
        }

        let key = format!("crypto.{}.address", ticker);
        let ctx = ResolutionContext::with_fields(
            domain.clone(),
            vec![RecordField::Record(key.clone())],
        );
        match self.execute(ctx).await {
            Ok(result) => result
                .record(&key)
                .map(|v| v.to_string())
                .ok_or(ResolutionError::UnsupportedCurrency { domain, ticker }),
            Err(ResolutionError::RecordNotFound { .. }) => {
                Err(ResolutionError::UnsupportedCurrency { domain, ticker })
            }
            Err(other) => Err(other),
        }
    }

    /// Arbitrary resolver record by dotted key.
    pub async fn record(&self, domain: &str, key: &str) -> Result<String> {
        let domain = DomainValidator::prepare_domain(domain);
        let ctx = ResolutionContext::with_fields(
            domain.clone(),
            vec![RecordField::Record(key.to_string())],
        );
        let result = self.execute(ctx).await?;
        result
            .record(key)
            .map(|v| v.to_string())
            .ok_or_else(|| ResolutionError::RecordNotFound {
                domain,
                key: key.to_string(),
            })
    }

    /// Resolver contract address of a domain.
    pub async fn resolver(&self, domain: &str) -> Result<String> {
        let domain = DomainValidator::prepare_domain(domain);
        let ctx = ResolutionContext::with_fields(domain.clone(), vec![RecordField::Resolver]);
        let result = self.execute(ctx).await?;
        result
            .resolver
            .ok_or(ResolutionError::UnspecifiedResolver { domain })
    }

    /// Registry owner address of a domain.
    pub async fn owner(&self, domain: &str) -> Result<String> {
        let domain = DomainValidator::prepare_domain(domain);
        let ctx = ResolutionContext::with_fields(domain.clone(), vec![RecordField::Owner]);
        let result = self.execute(ctx).await?;
        result
            .owner
            .ok_or(ResolutionError::UnregisteredDomain { domain })
    }

    /// Namehash of a domain under its owning backend's hash family.
    pub fn namehash(&self, domain: &str, options: NamehashOptions) -> Result<String> {
        let domain = DomainValidator::prepare_and_validate(domain)?;
        let adapter = self
            .pipeline
            .owning_adapter(&domain)
            .ok_or_else(|| ResolutionError::UnsupportedDomain {
                domain: domain.clone(),
            })?;
        let digest = adapter.namehash(&domain);
        Ok(match options.format {
            NamehashFormat::Hex => namehash::to_hex(&digest, options.prefix),
            NamehashFormat::Dec => namehash::to_decimal(&digest),
        })
    }

    /// Single fold step over an existing parent hash, for verifying
    /// sub-domain relationships without recomputing the full chain.
    pub fn childhash(&self, parent: &str, label: &str, service: ServiceName) -> Result<String> {
        let parent_digest =
            namehash::from_hex(parent).ok_or_else(|| ResolutionError::InvalidDomainAddress {
                domain: parent.to_string(),
            })?;
        let label = DomainValidator::prepare_and_validate(label)?;
        if label.contains('.') {
            return Err(ResolutionError::InvalidDomainAddress { domain: label });
        }
        let digest = namehash::childhash(&parent_digest, &label, service.hash_family());
        Ok(namehash::to_hex(&digest, true))
    }

    /// Whether any registered backend owns this domain.
    pub fn is_supported_domain(&self, domain: &str) -> bool {
        let domain = DomainValidator::prepare_domain(domain);
        DomainValidator::is_valid_syntax(&domain)
            && self.pipeline.owning_adapter(&domain).is_some()
    }

    /// Which backend owns this domain.
    pub fn service_name(&self, domain: &str) -> Result<ServiceName> {
        let domain = DomainValidator::prepare_and_validate(domain)?;
        self.pipeline
            .owning_adapter(&domain)
            .map(|adapter| adapter.service_name())
            .ok_or(ResolutionError::UnsupportedDomain { domain })
    }

    async fn execute(&self, ctx: ResolutionContext) -> Result<RecordMap> {
        let Some(cache) = &self.cache else {
            return self.pipeline.resolve(&ctx).await;
        };

        let key = cache_key(&ctx);
        if let Some(hit) = cache.get(&key).await {
            return Ok(hit);
        }
        let result = self.pipeline.resolve(&ctx).await?;
        cache.put(key, result.clone(), self.cache_ttl).await;
        Ok(result)
    }
}

fn cache_key(ctx: &ResolutionContext) -> String {
    format!("{}|{:?}", ctx.domain, ctx.fields)
}

fn http_service_config(settings: &crate::config::ServiceSettings) -> Result<ServiceConfig> {
    let transport =
        HttpTransport::with_timeout(&settings.url, Duration::from_secs(settings.timeout_seconds))?;
    let mut service_config =
        ServiceConfig::new(ProviderSource::from_middleware(Arc::new(transport)))
            .network(settings.network.clone());
    if let Some(registry) = &settings.registry {
        service_config = service_config.registry(registry.clone());
    }
    Ok(service_config)
}

/// Builder for [`Resolution`].
pub struct ResolutionBuilder {
    adapters: Vec<NamingServiceAdapter>,
    observe: bool,
    cache_ttl: Option<Duration>,
}

impl ResolutionBuilder {
    /// Register a naming service. Registration order is dispatch priority.
    pub fn service(mut self, adapter: NamingServiceAdapter) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Disable the logging observer stage.
    pub fn without_observer(mut self) -> Self {
        self.observe = false;
        self
    }

    /// Cache resolution results with the given TTL.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Freeze the pipeline and produce the resolver.
    pub fn build(self) -> Resolution {
        let mut pipeline = Pipeline::builder();
        if self.observe {
            pipeline = pipeline.with_observer();
        }
        for adapter in self.adapters {
            pipeline = pipeline.adapter(adapter);
        }
        Resolution {
            pipeline: pipeline.build(),
            cache: self.cache_ttl.map(|_| TtlCache::new()),
            cache_ttl: self.cache_ttl.unwrap_or(Duration::ZERO),
        }
    }
}
