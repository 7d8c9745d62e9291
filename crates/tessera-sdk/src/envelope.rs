//! JSON-RPC 2.0 envelopes

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SdkError;

/// Protocol version carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    /// Always "2.0"
    pub jsonrpc: String,
    /// `<tag>-<counter>`
    pub id: String,
    /// Method name, forwarded verbatim
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
}

impl RpcEnvelope {
    /// Build an envelope for `method`
    pub fn new(id: String, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error object inside a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Error code
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Optional extra payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Incoming response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Protocol version, when the node sends it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Id echoed from the request
    pub id: Value,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Successful response
    pub fn success(id: impl Into<Value>, result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn failure(id: impl Into<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            result: None,
            error: Some(RpcErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Whether the echoed id is the given request id
    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_str() == Some(id)
    }

    /// Result value, or the node's error as `SdkError::Rpc`.
    ///
    /// A response with neither field carries `null`.
    pub fn into_result(self) -> Result<Value, SdkError> {
        if let Some(error) = self.error {
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Random per-client prefix for request ids: 8 random bytes as 16 hex chars
pub fn random_tag() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
