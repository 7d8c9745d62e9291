//! Transport layer for RPC communication
//!
//! A transport moves one serialized JSON-RPC message (single envelope or batch
//! array) to the node and returns the raw bytes of the complete reply. Framing
//! is the transport's concern; interpreting the reply is the client's.

use async_trait::async_trait;

use crate::SdkError;

#[cfg(feature = "http")]
mod http;
#[cfg(unix)]
mod ipc;
mod mock;

#[cfg(feature = "http")]
pub use http::{HttpTransport, DEFAULT_HTTP_ENDPOINT, USER_AGENT};
#[cfg(unix)]
pub use ipc::{default_ipc_path, IpcConfig, IpcTransport, ReadBackoff, READ_CHUNK};
pub use mock::MockTransport;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send {
    /// Open the underlying connection. Idempotent.
    async fn connect(&mut self) -> Result<(), SdkError>;

    /// Send one message and wait for the complete reply
    async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, SdkError>;

    /// Release the connection
    async fn close(&mut self) -> Result<(), SdkError>;

    /// Where this transport talks to, for logs and errors
    fn endpoint(&self) -> String;
}
