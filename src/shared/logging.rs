//! Logging utilities module
//!
//! Centralized tracing subscriber setup for binaries and tests embedding
//! the resolver.

use crate::shared::error::{ResolutionError, Result};

/// Logging utilities for the library.
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the specified default level.
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn initialize(level: &str) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            ResolutionError::provider(format!("Failed to initialize logging: {}", e))
        })?;

        Ok(())
    }
}
