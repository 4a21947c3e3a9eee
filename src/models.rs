//! Wire and resolution data models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

fn default_jsonrpc_version() -> String {
    "2.0".to_string()
}

/// JSON-RPC request envelope sent through callback-style transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,

    /// Method name
    pub method: String,

    /// Positional parameters
    pub params: Value,

    /// Request ID
    pub id: u64,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,

    /// Result (for successful responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (for error responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// Request ID
    #[serde(default)]
    pub id: Option<Value>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,

    /// Error message
    pub message: String,

    /// Additional error data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One piece of on-chain data a resolution may request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// Registry owner address
    Owner,
    /// Registry resolver address
    Resolver,
    /// Registry TTL
    Ttl,
    /// A resolver record, keyed by dotted path (e.g. `crypto.ETH.address`)
    Record(String),
}

/// Per-call resolution state: the normalized domain and the set of
/// requested fields. Created fresh per resolve invocation.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Normalized domain name
    pub domain: String,
    /// Requested data fields
    pub fields: Vec<RecordField>,
}

impl ResolutionContext {
    /// Context with the default field set: resolver plus the primary
    /// address record.
    pub fn new<D: Into<String>>(domain: D) -> Self {
        Self {
            domain: domain.into(),
            fields: vec![
                RecordField::Resolver,
                RecordField::Record("crypto.ETH.address".to_string()),
            ],
        }
    }

    /// Context with an explicit field set.
    pub fn with_fields<D: Into<String>>(domain: D, fields: Vec<RecordField>) -> Self {
        Self {
            domain: domain.into(),
            fields,
        }
    }

    /// Record keys requested by this context, in request order.
    pub fn record_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                RecordField::Record(key) => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any field requires a resolver contract to be present.
    pub fn needs_resolver(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f, RecordField::Resolver | RecordField::Record(_)))
    }
}

/// Result of a resolution: registry fields plus resolver records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMap {
    /// Registry owner address, if requested and present
    pub owner: Option<String>,

    /// Resolver contract address, if requested and present
    pub resolver: Option<String>,

    /// Registry TTL, if requested
    pub ttl: Option<u64>,

    /// Resolver records keyed by dotted path
    pub records: HashMap<String, String>,
}

impl RecordMap {
    /// Look up a single record value.
    pub fn record(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_fields() {
        let ctx = ResolutionContext::new("brad.crypto");
        assert_eq!(ctx.domain, "brad.crypto");
        assert!(ctx.fields.contains(&RecordField::Resolver));
        assert_eq!(ctx.record_keys(), vec!["crypto.ETH.address"]);
        assert!(ctx.needs_resolver());
    }

    #[test]
    fn test_owner_only_context_does_not_need_resolver() {
        let ctx = ResolutionContext::with_fields("brad.crypto", vec![RecordField::Owner]);
        assert!(!ctx.needs_resolver());
        assert!(ctx.record_keys().is_empty());
    }

    #[test]
    fn test_response_envelope_parses_error_field() {
        let raw = r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"not found"},"id":1}"#;
        let response: JsonRpcResponse = serde_json::from_str(raw).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().message, "not found");
    }
}
