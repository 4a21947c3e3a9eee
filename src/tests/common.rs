//! Mock transports and response fixtures

use crate::provider::{MiddlewareTransport, TransportResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

struct Rule {
    method: String,
    matcher: Option<String>,
    response: Value,
}

/// Middleware-shape transport answering from a fixed script.
///
/// Rules are matched in registration order by method name plus an optional
/// substring of the serialized params; the first hit wins. Unmatched
/// requests answer with an RPC-level error. Every call is counted, which
/// lets tests assert the zero-RPC guarantees.
pub struct ScriptedTransport {
    rules: Vec<Rule>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Script a successful result for a method, optionally gated on a
    /// params substring.
    pub fn respond(mut self, method: &str, matcher: Option<&str>, result: Value) -> Self {
        self.rules.push(Rule {
            method: method.to_string(),
            matcher: matcher.map(|m| m.to_string()),
            response: json!({"jsonrpc": "2.0", "result": result, "id": 1}),
        });
        self
    }

    /// Script an RPC-level error.
    pub fn respond_error(mut self, method: &str, message: &str) -> Self {
        self.rules.push(Rule {
            method: method.to_string(),
            matcher: None,
            response: json!({
                "jsonrpc": "2.0",
                "error": {"code": -32000, "message": message},
                "id": 1,
            }),
        });
        self
    }

    /// Number of requests this transport has served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MiddlewareTransport for ScriptedTransport {
    async fn send(&self, method: &str, params: Value) -> TransportResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rendered = params.to_string();
        for rule in &self.rules {
            let method_hit = rule.method == method;
            let params_hit = rule
                .matcher
                .as_ref()
                .map_or(true, |needle| rendered.contains(needle.as_str()));
            if method_hit && params_hit {
                return Ok(rule.response.clone());
            }
        }
        Ok(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": format!("no scripted response for {method}")},
            "id": 1,
        }))
    }
}

/// Hex of a function selector, for matching scripted `eth_call` data.
pub fn selector_hex(signature: &str) -> String {
    hex::encode(crate::services::templates::selector(signature))
}

/// Hex of a plaintext string, for matching ABI-encoded record keys.
pub fn hex_of(text: &str) -> String {
    hex::encode(text.as_bytes())
}

/// `eth_call` return word holding an address.
pub fn address_word(address: &str) -> Value {
    let body = address.strip_prefix("0x").unwrap_or(address);
    Value::String(format!("0x{}{}", "0".repeat(24), body))
}

/// `eth_call` return word holding zero.
pub fn zero_word() -> Value {
    Value::String(format!("0x{}", "0".repeat(64)))
}

/// ABI-encoded dynamic string return.
pub fn string_return(text: &str) -> Value {
    let bytes = text.as_bytes();
    let mut words = vec![0u8; 64];
    words[31] = 32;
    words[56..64].copy_from_slice(&(bytes.len() as u64).to_be_bytes());
    words.extend_from_slice(bytes);
    let padding = (32 - bytes.len() % 32) % 32;
    words.extend(std::iter::repeat(0u8).take(padding));
    Value::String(format!("0x{}", hex::encode(words)))
}
