//! Scripted in-memory node for tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::Transport;
use crate::envelope::{RpcEnvelope, RpcResponse};
use crate::SdkError;

/// Method-not-found, returned for methods with no scripted answer
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone)]
enum Reply {
    Result(Value),
    Error { code: i64, message: String },
}

#[derive(Debug, Default)]
struct State {
    defaults: HashMap<String, Value>,
    overrides: HashMap<String, Reply>,
    queued: HashMap<String, VecDeque<Reply>>,
    raw: VecDeque<Vec<u8>>,
    reverse_batches: bool,
    requests: Vec<RpcEnvelope>,
    connected: bool,
}

/// Mock transport for testing.
///
/// Clones share state, so a test can keep a handle after moving the transport
/// into a client and inspect what was sent.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();

        // Default responses for common methods
        defaults.insert(
            "eth_coinbase".to_string(),
            Value::String("0x407d73d8a49eeb85d32cf465507dd71d507100c1".to_string()),
        );
        defaults.insert(
            "eth_accounts".to_string(),
            serde_json::json!(["0x407d73d8a49eeb85d32cf465507dd71d507100c1"]),
        );
        defaults.insert("eth_blockNumber".to_string(), Value::String("0x100".to_string())); // Block 256
        defaults.insert("eth_gasPrice".to_string(), Value::String("0x3b9aca00".to_string())); // 1 gwei
        defaults.insert("eth_getBalance".to_string(), Value::String("0xde0b6b3a7640000".to_string()));
        defaults.insert("eth_getTransactionCount".to_string(), Value::String("0x0".to_string()));
        defaults.insert("eth_estimateGas".to_string(), Value::String("0x5208".to_string()));
        defaults.insert(
            "eth_sendTransaction".to_string(),
            Value::String(
                "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b".to_string(),
            ),
        );
        defaults.insert("eth_getTransactionReceipt".to_string(), Value::Null);
        defaults.insert("eth_getBlockByNumber".to_string(), Value::Null);
        defaults.insert("eth_getCode".to_string(), Value::String("0x".to_string()));
        defaults.insert("eth_call".to_string(), Value::String("0x".to_string()));
        defaults.insert("net_version".to_string(), Value::String("1".to_string()));
        defaults.insert(
            "web3_clientVersion".to_string(),
            Value::String("Mock/v0.1.0".to_string()),
        );

        Self {
            state: Arc::new(Mutex::new(State {
                defaults,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every `method` call with `response` until cleared
    pub fn set_response(&self, method: &str, response: Value) {
        self.state()
            .overrides
            .insert(method.to_string(), Reply::Result(response));
    }

    /// Answer every `method` call with an error until cleared
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        self.state().overrides.insert(
            method.to_string(),
            Reply::Error {
                code,
                message: message.to_string(),
            },
        );
    }

    /// Answer the next `method` call with `response`, ahead of any override
    pub fn push_response(&self, method: &str, response: Value) {
        self.state()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Result(response));
    }

    /// Answer the next `method` call with an error
    pub fn push_error(&self, method: &str, code: i64, message: &str) {
        self.state()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Error {
                code,
                message: message.to_string(),
            });
    }

    /// Reply to the next message with these bytes, whatever was sent
    pub fn push_raw(&self, bytes: impl Into<Vec<u8>>) {
        self.state().raw.push_back(bytes.into());
    }

    /// Answer batches in reverse request order
    pub fn reverse_batches(&self, reverse: bool) {
        self.state().reverse_batches = reverse;
    }

    /// Clear custom responses
    pub fn clear_responses(&self) {
        let mut state = self.state();
        state.overrides.clear();
        state.queued.clear();
        state.raw.clear();
    }

    /// Every envelope received so far, batch members included
    pub fn requests(&self) -> Vec<RpcEnvelope> {
        self.state().requests.clone()
    }

    /// Envelopes received for one method
    pub fn requests_for(&self, method: &str) -> Vec<RpcEnvelope> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    /// Whether `connect` was called without a later `close`
    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    fn answer(state: &mut State, envelope: RpcEnvelope) -> RpcResponse {
        let reply = state
            .queued
            .get_mut(&envelope.method)
            .and_then(VecDeque::pop_front)
            .or_else(|| state.overrides.get(&envelope.method).cloned())
            .or_else(|| state.defaults.get(&envelope.method).cloned().map(Reply::Result))
            .unwrap_or_else(|| Reply::Error {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", envelope.method),
            });

        let id = envelope.id.clone();
        state.requests.push(envelope);

        match reply {
            Reply::Result(value) => RpcResponse::success(id, value),
            Reply::Error { code, message } => RpcResponse::failure(id, code, message),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), SdkError> {
        self.state().connected = true;
        Ok(())
    }

    async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, SdkError> {
        let mut state = self.state();
        let message: Value = serde_json::from_slice(request)
            .map_err(|e| SdkError::Connection(format!("mock received invalid JSON: {}", e)))?;

        let batch = message.is_array();
        let envelopes: Vec<RpcEnvelope> = if batch {
            serde_json::from_value(message)?
        } else {
            vec![serde_json::from_value(message)?]
        };

        let mut responses: Vec<RpcResponse> = envelopes
            .into_iter()
            .map(|envelope| Self::answer(&mut state, envelope))
            .collect();

        if let Some(raw) = state.raw.pop_front() {
            return Ok(raw);
        }

        let body = if batch {
            if state.reverse_batches {
                responses.reverse();
            }
            serde_json::to_vec(&responses)?
        } else {
            serde_json::to_vec(&responses[0])?
        };
        Ok(body)
    }

    async fn close(&mut self) -> Result<(), SdkError> {
        self.state().connected = false;
        Ok(())
    }

    fn endpoint(&self) -> String {
        "mock://".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(id: &str, method: &str) -> Vec<u8> {
        serde_json::to_vec(&RpcEnvelope::new(id.to_string(), method, vec![])).unwrap()
    }

    async fn exchange(mock: &mut MockTransport, request: Vec<u8>) -> Value {
        let reply = mock.send_and_receive(&request).await.unwrap();
        serde_json::from_slice(&reply).unwrap()
    }

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let mut mock = MockTransport::new();
        let reply = exchange(&mut mock, envelope("t-0", "eth_blockNumber")).await;
        assert_eq!(reply["id"], "t-0");
        assert_eq!(reply["result"], "0x100");
    }

    #[tokio::test]
    async fn test_mock_transport_queued_before_override() {
        let mut mock = MockTransport::new();
        mock.set_response("eth_getCode", json!("0x60"));
        mock.push_response("eth_getCode", json!("0x"));

        let first = exchange(&mut mock, envelope("t-0", "eth_getCode")).await;
        let second = exchange(&mut mock, envelope("t-1", "eth_getCode")).await;
        assert_eq!(first["result"], "0x");
        assert_eq!(second["result"], "0x60");
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let mut mock = MockTransport::new();
        let reply = exchange(&mut mock, envelope("t-0", "debug_nothing")).await;
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mock_transport_batch_reversed() {
        let mut mock = MockTransport::new();
        mock.reverse_batches(true);
        let batch = serde_json::to_vec(&vec![
            RpcEnvelope::new("t-0".to_string(), "eth_blockNumber", vec![]),
            RpcEnvelope::new("t-1".to_string(), "eth_coinbase", vec![]),
        ])
        .unwrap();
        let reply = exchange(&mut mock, batch).await;
        assert_eq!(reply[0]["id"], "t-1");
        assert_eq!(reply[1]["id"], "t-0");
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_shared_log() {
        let mut mock = MockTransport::new();
        let handle = mock.clone();
        mock.connect().await.unwrap();
        exchange(&mut mock, envelope("t-0", "eth_gasPrice")).await;
        assert!(handle.is_connected());
        assert_eq!(handle.requests_for("eth_gasPrice").len(), 1);
    }
}
