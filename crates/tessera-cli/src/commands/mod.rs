//! Subcommand implementations

pub mod call;
pub mod deploy;
pub mod rpc;
pub mod send;

use std::path::PathBuf;

use serde_json::Value;
use tessera_sdk::transport::{HttpTransport, Transport};
use tessera_sdk::RpcClient;
use tracing::debug;

use crate::config::{Config, TransportKind};
use crate::record::BuildRecord;
use crate::CliError;

/// Open a client over the configured transport
pub async fn connect(config: &Config) -> Result<RpcClient, CliError> {
    let transport: Box<dyn Transport> = match config.transport {
        TransportKind::Http => Box::new(HttpTransport::new(&config.http_url)),
        TransportKind::Ipc => ipc_transport(config)?,
    };
    let mut client = RpcClient::with_transport(transport);
    client.connect().await?;
    debug!(endpoint = %client.endpoint(), "Connected to node");
    Ok(client)
}

#[cfg(unix)]
fn ipc_transport(config: &Config) -> Result<Box<dyn Transport>, CliError> {
    use tessera_sdk::transport::{default_ipc_path, IpcTransport};

    let path = config.ipc_path.clone().unwrap_or_else(default_ipc_path);
    Ok(Box::new(IpcTransport::new(path)))
}

#[cfg(not(unix))]
fn ipc_transport(_config: &Config) -> Result<Box<dyn Transport>, CliError> {
    Err(CliError::InvalidInput(
        "IPC transport requires a Unix platform; use --http".to_string(),
    ))
}

/// Build record path for the current directory
pub fn record_path() -> Result<PathBuf, CliError> {
    Ok(BuildRecord::locate(&std::env::current_dir()?))
}

/// One line per value: strings bare, everything else as JSON
pub fn plain_lines(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
