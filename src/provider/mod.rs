//! Provider normalization layer
//!
//! Reduces four incompatible transport shapes to a single
//! `request(method, params) -> result` capability. The supplied transport is
//! probed exactly once at construction time; the chosen translation strategy
//! never changes afterwards, and the original transport shape is never
//! visible above this layer.

pub mod transports;

use crate::models::{JsonRpcRequest, JsonRpcResponse};
use crate::shared::error::{ConfigurationError, ResolutionError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Raw outcome of one transport exchange: the full response value on
/// success, the transport's own message on failure.
pub type TransportResult = std::result::Result<Value, String>;

/// Single-shot completion callback handed to callback-style transports.
pub type TransportCallback = Box<dyn FnOnce(TransportResult) + Send>;

/// Callback transport exposing `send_async(payload, callback)`.
pub trait AsyncCallbackTransport: Send + Sync {
    /// Deliver a JSON-RPC envelope; the callback must fire exactly once
    /// with the full response value or a transport error.
    fn send_async(&self, payload: Value, callback: TransportCallback);
}

/// Callback transport exposing `send(payload, callback)` with the same
/// envelope semantics as [`AsyncCallbackTransport`].
pub trait CallbackTransport: Send + Sync {
    /// Deliver a JSON-RPC envelope; the callback must fire exactly once.
    fn send(&self, payload: Value, callback: TransportCallback);
}

/// Direct-call transport exposing typed `call`/`get_logs` operations
/// instead of a generic method channel.
#[async_trait]
pub trait DirectCallTransport: Send + Sync {
    /// Execute a read-only contract call; returns the bare result value.
    async fn call(&self, transaction: Value) -> TransportResult;

    /// Fetch logs matching a filter; returns the bare result value.
    async fn get_logs(&self, filter: Value) -> TransportResult;
}

/// Middleware-style transport: `send(method, params)` returning a response
/// object that carries either a `result` or an `error` field.
#[async_trait]
pub trait MiddlewareTransport: Send + Sync {
    /// Invoke a method with positional parameters.
    async fn send(&self, method: &str, params: Value) -> TransportResult;
}

/// Capability set of an externally supplied transport, probed once by
/// [`NormalizedProvider::new`]. At most one capability is used; detection
/// order is `send_async`, `send`, `call`, `middleware`.
#[derive(Default, Clone)]
pub struct ProviderSource {
    /// `sendAsync(payload, cb)` capability
    pub send_async: Option<Arc<dyn AsyncCallbackTransport>>,
    /// `send(payload, cb)` capability
    pub send: Option<Arc<dyn CallbackTransport>>,
    /// `call`/`getLogs` capability
    pub direct: Option<Arc<dyn DirectCallTransport>>,
    /// middleware-style `send(method, params)` capability
    pub middleware: Option<Arc<dyn MiddlewareTransport>>,
}

impl ProviderSource {
    /// Source wrapping an async-callback transport.
    pub fn from_async_callback(transport: Arc<dyn AsyncCallbackTransport>) -> Self {
        Self {
            send_async: Some(transport),
            ..Default::default()
        }
    }

    /// Source wrapping a callback transport.
    pub fn from_callback(transport: Arc<dyn CallbackTransport>) -> Self {
        Self {
            send: Some(transport),
            ..Default::default()
        }
    }

    /// Source wrapping a direct-call transport.
    pub fn from_direct(transport: Arc<dyn DirectCallTransport>) -> Self {
        Self {
            direct: Some(transport),
            ..Default::default()
        }
    }

    /// Source wrapping a middleware-style transport.
    pub fn from_middleware(transport: Arc<dyn MiddlewareTransport>) -> Self {
        Self {
            middleware: Some(transport),
            ..Default::default()
        }
    }
}

/// Translation strategy selected at construction time.
enum Strategy {
    AsyncCallback(Arc<dyn AsyncCallbackTransport>),
    Callback(Arc<dyn CallbackTransport>),
    Direct(Arc<dyn DirectCallTransport>),
    Middleware(Arc<dyn MiddlewareTransport>),
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::AsyncCallback(_) => "send_async",
            Strategy::Callback(_) => "send",
            Strategy::Direct(_) => "direct",
            Strategy::Middleware(_) => "middleware",
        }
    }
}

/// Normalized provider: the one request capability the adapters consume.
pub struct NormalizedProvider {
    strategy: Strategy,
    next_id: AtomicU64,
}

impl std::fmt::Debug for NormalizedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedProvider")
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl NormalizedProvider {
    /// Probe the source's capabilities and select a translation strategy.
    ///
    /// Fails synchronously with `IncorrectProvider`, before any network
    /// activity, when the source exposes none of the supported shapes.
    pub fn new(source: ProviderSource) -> std::result::Result<Self, ConfigurationError> {
        let strategy = if let Some(transport) = source.send_async {
            Strategy::AsyncCallback(transport)
        } else if let Some(transport) = source.send {
            Strategy::Callback(transport)
        } else if let Some(transport) = source.direct {
            Strategy::Direct(transport)
        } else if let Some(transport) = source.middleware {
            Strategy::Middleware(transport)
        } else {
            return Err(ConfigurationError::IncorrectProvider {
                reason: "transport exposes none of send_async, send, call, or middleware"
                    .to_string(),
            });
        };

        debug!(strategy = strategy.name(), "Normalized provider transport");

        Ok(Self {
            strategy,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one request and return its bare result value.
    ///
    /// Parameters that are not already arrays are wrapped in a one-element
    /// array; all supported transports expect positional parameters.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let params = normalize_params(params);
        match &self.strategy {
            Strategy::AsyncCallback(transport) => {
                let transport = transport.clone();
                self.callback_roundtrip(method, params, move |payload, cb| {
                    transport.send_async(payload, cb)
                })
                .await
            }
            Strategy::Callback(transport) => {
                let transport = transport.clone();
                self.callback_roundtrip(method, params, move |payload, cb| {
                    transport.send(payload, cb)
                })
                .await
            }
            Strategy::Direct(transport) => {
                let argument = params.get(0).cloned().unwrap_or(Value::Null);
                let outcome = match method {
                    "eth_call" => transport.call(argument).await,
                    "eth_getLogs" => transport.get_logs(argument).await,
                    other => {
                        return Err(ResolutionError::provider(format!(
                            "unsupported provider method {}",
                            other
                        )))
                    }
                };
                outcome.map_err(ResolutionError::provider)
            }
            Strategy::Middleware(transport) => {
                let response = transport
                    .send(method, params)
                    .await
                    .map_err(ResolutionError::provider)?;
                interpret_envelope(response)
            }
        }
    }

    /// Build a JSON-RPC 2.0 envelope, hand it to a callback-style transport
    /// and await the single settlement.
    async fn callback_roundtrip<F>(&self, method: &str, params: Value, dispatch: F) -> Result<Value>
    where
        F: FnOnce(Value, TransportCallback),
    {
        let envelope = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        let payload = serde_json::to_value(&envelope)
            .map_err(|e| ResolutionError::provider(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        dispatch(
            payload,
            Box::new(move |outcome| {
                // oneshot guarantees single settlement even if the
                // transport misbehaves and fires twice.
                let _ = tx.send(outcome);
            }),
        );

        let outcome = rx
            .await
            .map_err(|_| ResolutionError::provider("transport dropped the callback"))?;
        interpret_envelope(outcome.map_err(ResolutionError::provider)?)
    }
}

/// Wrap non-array params in a single-element positional array.
fn normalize_params(params: Value) -> Value {
    match params {
        Value::Array(_) => params,
        other => Value::Array(vec![other]),
    }
}

/// Split a response envelope into its result or its RPC-level error.
///
/// A `result` key that is present but `null` is a successful empty answer
/// and is passed through as `Value::Null`; only a missing key (with no
/// error either) is a malformed envelope.
fn interpret_envelope(value: Value) -> Result<Value> {
    let has_result = value.get("result").is_some();
    let response: JsonRpcResponse = serde_json::from_value(value)
        .map_err(|e| ResolutionError::provider(format!("malformed RPC response: {}", e)))?;
    if let Some(error) = response.error {
        return Err(ResolutionError::provider(error.message));
    }
    if has_result {
        return Ok(response.result.unwrap_or(Value::Null));
    }
    Err(ResolutionError::provider(
        "RPC response carried neither result nor error",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoAsync;
    impl AsyncCallbackTransport for EchoAsync {
        fn send_async(&self, payload: Value, callback: TransportCallback) {
            callback(Ok(json!({
                "jsonrpc": "2.0",
                "result": payload["method"].clone(),
                "id": payload["id"].clone(),
            })));
        }
    }

    struct FailingSend;
    impl CallbackTransport for FailingSend {
        fn send(&self, payload: Value, callback: TransportCallback) {
            callback(Ok(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32601, "message": "no such method"},
                "id": payload["id"].clone(),
            })));
        }
    }

    struct Direct;
    #[async_trait]
    impl DirectCallTransport for Direct {
        async fn call(&self, transaction: Value) -> TransportResult {
            Ok(json!({"called": transaction}))
        }
        async fn get_logs(&self, _filter: Value) -> TransportResult {
            Ok(json!([]))
        }
    }

    #[test]
    fn test_empty_source_is_incorrect_provider() {
        let err = NormalizedProvider::new(ProviderSource::default()).unwrap_err();
        assert!(matches!(err, ConfigurationError::IncorrectProvider { .. }));
    }

    #[test]
    fn test_debug_reports_selected_strategy() {
        let provider =
            NormalizedProvider::new(ProviderSource::from_direct(Arc::new(Direct))).unwrap();
        assert!(format!("{provider:?}").contains("direct"));
    }

    #[tokio::test]
    async fn test_null_result_is_a_successful_empty_answer() {
        struct NullResult;
        impl AsyncCallbackTransport for NullResult {
            fn send_async(&self, payload: Value, callback: TransportCallback) {
                callback(Ok(json!({
                    "jsonrpc": "2.0",
                    "result": null,
                    "id": payload["id"].clone(),
                })));
            }
        }

        let provider =
            NormalizedProvider::new(ProviderSource::from_async_callback(Arc::new(NullResult)))
                .unwrap();
        let result = provider.request("eth_call", json!([])).await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_envelope_without_result_or_error_is_rejected() {
        struct EmptyEnvelope;
        impl AsyncCallbackTransport for EmptyEnvelope {
            fn send_async(&self, payload: Value, callback: TransportCallback) {
                callback(Ok(json!({
                    "jsonrpc": "2.0",
                    "id": payload["id"].clone(),
                })));
            }
        }

        let provider =
            NormalizedProvider::new(ProviderSource::from_async_callback(Arc::new(EmptyEnvelope)))
                .unwrap();
        let err = provider.request("eth_call", json!([])).await.unwrap_err();
        assert!(matches!(err, ResolutionError::ServiceProvider { .. }));
    }

    #[tokio::test]
    async fn test_async_callback_roundtrip() {
        let provider =
            NormalizedProvider::new(ProviderSource::from_async_callback(Arc::new(EchoAsync)))
                .unwrap();
        let result = provider.request("eth_call", json!([{"to": "0x0"}])).await.unwrap();
        assert_eq!(result, json!("eth_call"));
    }

    #[tokio::test]
    async fn test_rpc_level_error_becomes_service_provider_error() {
        let provider =
            NormalizedProvider::new(ProviderSource::from_callback(Arc::new(FailingSend))).unwrap();
        let err = provider.request("eth_call", json!([])).await.unwrap_err();
        match err {
            ResolutionError::ServiceProvider { message } => {
                assert_eq!(message, "no such method")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_direct_transport_dispatches_by_method() {
        let provider =
            NormalizedProvider::new(ProviderSource::from_direct(Arc::new(Direct))).unwrap();

        let result = provider
            .request("eth_call", json!([{"to": "0xabc"}]))
            .await
            .unwrap();
        assert_eq!(result, json!({"called": {"to": "0xabc"}}));

        let err = provider
            .request("eth_getBalance", json!(["0xabc"]))
            .await
            .unwrap_err();
        match err {
            ResolutionError::ServiceProvider { message } => {
                assert!(message.contains("unsupported provider method"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_array_params_are_wrapped() {
        struct CaptureParams;
        impl AsyncCallbackTransport for CaptureParams {
            fn send_async(&self, payload: Value, callback: TransportCallback) {
                callback(Ok(json!({
                    "jsonrpc": "2.0",
                    "result": payload["params"].clone(),
                    "id": payload["id"].clone(),
                })));
            }
        }

        let provider =
            NormalizedProvider::new(ProviderSource::from_async_callback(Arc::new(CaptureParams)))
                .unwrap();
        let result = provider.request("eth_call", json!({"to": "0x1"})).await.unwrap();
        assert_eq!(result, json!([{"to": "0x1"}]));
    }
}
