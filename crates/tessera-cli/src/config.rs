//! CLI configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tessera_sdk::orchestrator::{DEFAULT_GAS, RESOURCE_UNAVAILABLE};
use tessera_sdk::transport::DEFAULT_HTTP_ENDPOINT;
use tessera_sdk::types::parse_address;
use tessera_sdk::OrchestratorConfig;

use crate::CliError;

/// Which transport reaches the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Unix domain socket
    Ipc,
    /// HTTP POST
    Http,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Ipc => write!(f, "ipc"),
            TransportKind::Http => write!(f, "http"),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Transport used for every command
    #[serde(default = "default_transport")]
    pub transport: TransportKind,
    /// IPC socket path; the node's default location when unset
    #[serde(default)]
    pub ipc_path: Option<PathBuf>,
    /// HTTP endpoint URL
    #[serde(default = "default_http_url")]
    pub http_url: String,
    /// Seconds between confirmation checks
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
    /// Checks per submission
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
    /// Resends after a submission is exhausted
    #[serde(default = "default_max_resubmissions")]
    pub max_resubmissions: u32,
    /// Ignore `max_resubmissions` and resend until confirmed
    #[serde(default)]
    pub resubmit_forever: bool,
    /// Resends while the node reports itself busy
    #[serde(default = "default_max_busy_retries")]
    pub max_busy_retries: u32,
    /// Error codes treated as "busy"
    #[serde(default = "default_busy_codes")]
    pub busy_codes: Vec<i64>,
    /// Gas ceiling for transactions and deployments
    #[serde(default = "default_gas")]
    pub gas: u64,
    /// Sender address; the node's coinbase when unset
    #[serde(default)]
    pub sender: Option<String>,
    /// Contract compiler executable
    #[serde(default = "default_compiler")]
    pub compiler: String,
}

fn default_transport() -> TransportKind {
    TransportKind::Ipc
}

fn default_http_url() -> String {
    DEFAULT_HTTP_ENDPOINT.to_string()
}

fn default_block_time_secs() -> u64 {
    12
}

fn default_max_tries() -> u32 {
    10
}

fn default_max_resubmissions() -> u32 {
    5
}

fn default_max_busy_retries() -> u32 {
    10
}

fn default_busy_codes() -> Vec<i64> {
    vec![RESOURCE_UNAVAILABLE]
}

fn default_gas() -> u64 {
    DEFAULT_GAS
}

fn default_compiler() -> String {
    "serpent".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            ipc_path: None,
            http_url: default_http_url(),
            block_time_secs: default_block_time_secs(),
            max_tries: default_max_tries(),
            max_resubmissions: default_max_resubmissions(),
            resubmit_forever: false,
            max_busy_retries: default_max_busy_retries(),
            busy_codes: default_busy_codes(),
            gas: default_gas(),
            sender: None,
            compiler: default_compiler(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tessera"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load config from the default location, or defaults when there is none
    pub fn load() -> Result<Self, CliError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf, CliError> {
        let path = Self::config_path()
            .ok_or_else(|| CliError::Config("Cannot determine config path".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Orchestrator settings derived from this config
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, CliError> {
        let sender = self.sender.as_deref().map(parse_address).transpose()?;
        Ok(OrchestratorConfig {
            block_time: Duration::from_secs(self.block_time_secs),
            max_tries: self.max_tries,
            max_resubmissions: (!self.resubmit_forever).then_some(self.max_resubmissions),
            max_busy_retries: self.max_busy_retries,
            busy_codes: self.busy_codes.clone(),
            gas: self.gas,
            sender,
        })
    }
}
