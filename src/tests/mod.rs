//! Test suite for the resolution engine
//!
//! Unit suites cover the namehash engine, provider normalization, the
//! adapter failure ladder, pipeline routing and the cache. Scripted mock
//! transports live in `common`.

pub mod common;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing once for tests that want log output.
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}
