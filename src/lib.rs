//! chain-resolution - Multi-backend blockchain domain resolution
//!
//! Resolves human-readable blockchain domain names (`name.crypto`,
//! `name.zil`, `name.eth`, ...) into on-chain records by dispatching each
//! name to the one naming-service backend that owns it. Transports are
//! pluggable; four incompatible shapes are normalized to a single request
//! capability at construction time.
//!
//! ```no_run
//! use chain_resolution::{Resolution, NamingServiceAdapter, ServiceConfig, ProviderSource, HttpTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new("https://mainnet.infura.io/v3/KEY")?);
//!     let resolution = Resolution::builder()
//!         .service(NamingServiceAdapter::cns(ServiceConfig::new(
//!             ProviderSource::from_middleware(transport),
//!         ))?)
//!         .build();
//!
//!     let address = resolution.address("brad.crypto", "eth").await?;
//!     println!("{}", address);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod models;
pub mod namehash;
pub mod pipeline;
pub mod provider;
pub mod resolution;
pub mod services;
pub mod shared;

#[cfg(test)]
mod tests;

pub use cache::TtlCache;
pub use config::{CacheSettings, ResolutionConfig, ServiceSettings};
pub use models::{RecordField, RecordMap, ResolutionContext};
pub use namehash::{HashFamily, NamehashDigest};
pub use provider::transports::HttpTransport;
pub use provider::{NormalizedProvider, ProviderSource};
pub use resolution::{NamehashFormat, NamehashOptions, Resolution, ResolutionBuilder};
pub use services::{NamingServiceAdapter, ServiceConfig, ServiceName};
pub use shared::error::{ConfigurationError, ResolutionError};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, ResolutionError>;
