//! Error handling module
//!
//! Two-tier error taxonomy: configuration errors are raised synchronously
//! while wiring services together, resolution errors during a lookup.

use thiserror::Error;

/// Errors raised at construction/setup time, before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Provider is missing required capabilities: {reason}")]
    IncorrectProvider { reason: String },

    #[error("Network {network} is not supported by the {service} service")]
    UnsupportedNetwork { service: String, network: String },
}

/// Errors raised during a resolve-time operation.
///
/// Contextual fields (domain, method, currency ticker, provider message) are
/// carried on the variant for message formatting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Domain {domain} is not registered")]
    UnregisteredDomain { domain: String },

    #[error("Domain {domain} does not have a configured resolver")]
    UnspecifiedResolver { domain: String },

    #[error("Domain {domain} is not supported by any configured naming service")]
    UnsupportedDomain { domain: String },

    #[error("Naming service {service} is not supported")]
    UnsupportedService { service: String },

    #[error("Method {method} is not supported for domain {domain}")]
    UnsupportedMethod { method: String, domain: String },

    #[error("No currency ticker specified for domain {domain}")]
    UnspecifiedCurrency { domain: String },

    #[error("Domain {domain} has no address record for currency {ticker}")]
    UnsupportedCurrency { domain: String, ticker: String },

    #[error("Resolver of {domain} does not support reading {method} records")]
    IncorrectResolverInterface { domain: String, method: String },

    #[error("Record {key} is not set for domain {domain}")]
    RecordNotFound { domain: String, key: String },

    #[error("Service provider error: {message}")]
    ServiceProvider { message: String },

    #[error("Twitter profile of {domain} failed signature verification")]
    InvalidTwitterVerification { domain: String },

    #[error("Invalid domain address: {domain}")]
    InvalidDomainAddress { domain: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl ResolutionError {
    /// Wrap an upstream transport failure, preserving its message.
    pub fn provider<M: Into<String>>(message: M) -> Self {
        ResolutionError::ServiceProvider {
            message: message.into(),
        }
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, ResolutionError>;
