//! Validation utilities module
//!
//! Domain syntax validation and normalization shared across the pipeline
//! and the public API.

use crate::shared::error::{ResolutionError, Result};
use regex::Regex;
use std::sync::OnceLock;

const DOMAIN_PATTERN: &str = r"^[.a-z0-9-]+$";

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DOMAIN_PATTERN).expect("domain pattern is valid"))
}

/// Domain validation utilities.
pub struct DomainValidator;

impl DomainValidator {
    /// Normalize a raw domain input: trim surrounding whitespace and
    /// lowercase. Does not validate syntax.
    pub fn prepare_domain(input: &str) -> String {
        input.trim().to_lowercase()
    }

    /// Check normalized domain syntax against `^[.a-z0-9-]+$`.
    pub fn is_valid_syntax(domain: &str) -> bool {
        !domain.is_empty() && domain_regex().is_match(domain)
    }

    /// Normalize and validate in one step. Returns the normalized domain or
    /// `InvalidDomainAddress` carrying the normalized form.
    pub fn prepare_and_validate(input: &str) -> Result<String> {
        let domain = Self::prepare_domain(input);
        if !Self::is_valid_syntax(&domain) {
            return Err(ResolutionError::InvalidDomainAddress { domain });
        }
        Ok(domain)
    }

    /// Extract the top-level suffix (rightmost label) of a normalized domain.
    pub fn top_level_suffix(domain: &str) -> &str {
        domain.rsplit('.').next().unwrap_or(domain)
    }
}
