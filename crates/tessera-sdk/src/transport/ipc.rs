//! Unix domain socket transport

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::trace;

use super::Transport;
use crate::SdkError;

/// Largest single read from the socket, in bytes
pub const READ_CHUNK: usize = 4096;

/// `~/.ethereum/geth.ipc`
pub fn default_ipc_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".ethereum")
        .join("geth.ipc")
}

/// Read timeout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpcConfig {
    /// First read timeout; also the increment added at every doubling
    pub initial_timeout: Duration,
    /// Timed-out reads tolerated per message before giving up
    pub max_read_attempts: u32,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_millis(1),
            max_read_attempts: 16,
        }
    }
}

impl IpcConfig {
    /// Every read timeout this policy allows, in order
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        ReadBackoff::new(self.initial_timeout).take(self.max_read_attempts as usize)
    }
}

/// Unbounded sequence `e, 2e + e, 2(2e + e) + e, ...`
#[derive(Debug, Clone)]
pub struct ReadBackoff {
    epsilon: Duration,
    next: Option<Duration>,
}

impl ReadBackoff {
    /// Start the sequence at `epsilon`
    pub fn new(epsilon: Duration) -> Self {
        Self {
            epsilon,
            next: Some(epsilon),
        }
    }
}

impl Iterator for ReadBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next?;
        self.next = current
            .checked_mul(2)
            .and_then(|d| d.checked_add(self.epsilon));
        Some(current)
    }
}

/// Transport over a local stream socket, one connection per transport
pub struct IpcTransport {
    path: PathBuf,
    config: IpcConfig,
    stream: Option<UnixStream>,
}

impl IpcTransport {
    /// Transport for the socket at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: IpcConfig::default(),
            stream: None,
        }
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: UnixStream) -> Self {
        let path = stream
            .peer_addr()
            .ok()
            .and_then(|addr| addr.as_pathname().map(Path::to_path_buf))
            .unwrap_or_default();
        Self {
            path,
            config: IpcConfig::default(),
            stream: Some(stream),
        }
    }

    /// Replace the read timeout policy
    pub fn with_config(mut self, config: IpcConfig) -> Self {
        self.config = config;
        self
    }

    /// Socket path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn stream(&mut self) -> Result<&mut UnixStream, SdkError> {
        if self.stream.is_none() {
            self.connect().await?;
        }
        self.stream
            .as_mut()
            .ok_or_else(|| SdkError::Connection(format!("{}: not connected", self.path.display())))
    }
}

impl Default for IpcTransport {
    fn default() -> Self {
        Self::new(default_ipc_path())
    }
}

/// Write `request`, then read until the buffer is one complete JSON document
async fn exchange(stream: &mut UnixStream, request: &[u8], config: IpcConfig) -> Result<Vec<u8>, SdkError> {
    stream
        .write_all(request)
        .await
        .map_err(|e| SdkError::Connection(e.to_string()))?;

    let mut delays = config.delays();
    let mut wait = delays
        .next()
        .ok_or(SdkError::TransportTimeout { attempts: 0 })?;
    let mut attempts = 0u32;
    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        match tokio::time::timeout(wait, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                return Err(SdkError::Connection(format!(
                    "connection closed after {} bytes of an incomplete response",
                    buffer.len()
                )));
            }
            Ok(Ok(n)) => {
                buffer.extend_from_slice(&chunk[..n]);
                if is_complete_json(&buffer) {
                    return Ok(buffer);
                }
            }
            Ok(Err(e)) => return Err(SdkError::Connection(e.to_string())),
            Err(_) => {
                attempts += 1;
                wait = delays
                    .next()
                    .ok_or(SdkError::TransportTimeout { attempts })?;
                trace!(attempts, ?wait, "IPC read timed out, backing off");
            }
        }
    }
}

/// True once the buffer holds exactly one complete JSON document
fn is_complete_json(buffer: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(buffer).is_ok()
}

#[async_trait]
impl Transport for IpcTransport {
    async fn connect(&mut self) -> Result<(), SdkError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = UnixStream::connect(&self.path)
            .await
            .map_err(|e| SdkError::Connection(format!("{}: {}", self.path.display(), e)))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, SdkError> {
        let config = self.config;
        let stream = self.stream().await?;
        let result = exchange(stream, request, config).await;

        // A late reply would be read as the answer to the next request
        if result.is_err() {
            if let Some(mut stream) = self.stream.take() {
                let _ = stream.shutdown().await;
            }
        }
        result
    }

    async fn close(&mut self) -> Result<(), SdkError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .shutdown()
                .await
                .map_err(|e| SdkError::Connection(e.to_string()))?;
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let delays: Vec<_> = ReadBackoff::new(Duration::from_millis(1)).take(5).collect();
        let millis: Vec<u128> = delays.iter().map(Duration::as_millis).collect();
        assert_eq!(millis, vec![1, 3, 7, 15, 31]);
    }

    #[test]
    fn test_backoff_is_finite_under_config() {
        let config = IpcConfig {
            initial_timeout: Duration::from_millis(1),
            max_read_attempts: 3,
        };
        assert_eq!(config.delays().count(), 3);
    }

    #[test]
    fn test_complete_json_detection() {
        assert!(!is_complete_json(b""));
        assert!(!is_complete_json(b"{\"id\":"));
        assert!(is_complete_json(b"{\"id\":1}"));
        assert!(is_complete_json(b"[{\"id\":1},{\"id\":2}]"));
        assert!(!is_complete_json(b"[{\"id\":1},"));
    }

    #[test]
    fn test_default_path() {
        let path = default_ipc_path();
        assert!(path.ends_with(".ethereum/geth.ipc"));
    }
}
