//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// Type descriptor does not match the ABI type grammar
    #[error("Invalid ABI type: {0}")]
    InvalidTypeSyntax(String),

    /// Argument count differs from the declared parameter count
    #[error("Arity mismatch: expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Value does not fit its declared ABI type
    #[error("ABI encoding error: {0}")]
    AbiEncode(String),

    /// Malformed ABI data
    #[error("ABI decoding error: {0}")]
    AbiDecode(String),

    /// More than one overload accepts the supplied arguments
    #[error("Ambiguous overload for {name}: candidates {candidates:?}")]
    AmbiguousOverload {
        /// Function name as requested
        name: String,
        /// Every matching signature
        candidates: Vec<String>,
    },

    /// No function of that name in the signature document
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Response is not valid JSON-RPC
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Socket reads kept timing out after every backoff step
    #[error("Transport timed out after {attempts} read attempts")]
    TransportTimeout {
        /// Reads attempted before giving up
        attempts: u32,
    },

    /// Connection could not be opened or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// RPC error from node
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Transaction was never observed on-chain within the resubmission bound
    #[error("Confirmation exhausted for {target} after {resubmissions} resubmissions")]
    ConfirmationExhausted {
        /// Last transaction hash submitted
        target: String,
        /// Full resends performed
        resubmissions: u32,
    },

    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SdkError {
    /// JSON-RPC error code, when the node rejected the request.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_code() {
        let err = SdkError::Rpc {
            code: -32002,
            message: "busy".to_string(),
        };
        assert_eq!(err.rpc_code(), Some(-32002));
        assert_eq!(SdkError::Protocol("x".to_string()).rpc_code(), None);
    }

    #[test]
    fn test_display_arity() {
        let err = SdkError::ArityMismatch { expected: 2, got: 1 };
        assert_eq!(err.to_string(), "Arity mismatch: expected 2 arguments, got 1");
    }
}
