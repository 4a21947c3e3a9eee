//! Shared utilities and common functionality
//!
//! This module contains error handling, logging, and validation used
//! across the crate.

pub mod error;
pub mod logging;
pub mod validation;

pub use error::{ConfigurationError, ResolutionError, Result};
pub use logging::LoggingUtils;
pub use validation::DomainValidator;
