//! # tessera-cli
//!
//! Command-line interface for deploying and calling contracts on an
//! EVM-style node.
//!
//! ## Usage
//!
//! ```bash
//! # Compile with the external compiler, deploy, and record the result
//! tessera deploy token.se
//!
//! # Contract calls by recorded name
//! tessera call token balance 0x742d35cc6634c0532925a3b844bc9e7595f0ab3d
//! tessera send token transfer 0x742d35cc6634c0532925a3b844bc9e7595f0ab3d 100
//!
//! # Raw JSON-RPC
//! tessera rpc eth_blockNumber
//! tessera --http http://localhost:8545 rpc eth_getBalance 0x742d... latest
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod args;
mod commands;
mod compiler;
mod config;
mod error;
mod output;
mod record;

pub use config::{Config, TransportKind};
pub use error::CliError;
pub use output::Output;

/// Tessera CLI
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Connect over the IPC socket at this path
    #[arg(long, global = true, conflicts_with = "http")]
    ipc: Option<PathBuf>,

    /// Connect over HTTP to this URL
    #[arg(long, global = true)]
    http: Option<String>,

    /// Seconds between confirmation checks
    #[arg(long, global = true)]
    block_time: Option<u64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Call a contract function without a transaction
    Call(commands::call::CallArgs),
    /// Call a contract function in a transaction
    Send(commands::send::SendArgs),
    /// Compile and deploy a contract
    Deploy(commands::deploy::DeployArgs),
    /// Send a raw JSON-RPC request
    Rpc(commands::rpc::RpcArgs),
    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set the transport (ipc or http)
        #[arg(long, value_parser = parse_transport)]
        set_transport: Option<TransportKind>,
        /// Set the IPC socket path
        #[arg(long)]
        set_ipc_path: Option<PathBuf>,
        /// Set the HTTP endpoint
        #[arg(long)]
        set_http_url: Option<String>,
        /// Set the sender address
        #[arg(long)]
        set_sender: Option<String>,
        /// Set the compiler executable
        #[arg(long)]
        set_compiler: Option<String>,
    },
}

fn parse_transport(s: &str) -> Result<TransportKind, String> {
    match s {
        "ipc" => Ok(TransportKind::Ipc),
        "http" => Ok(TransportKind::Http),
        other => Err(format!("unknown transport '{}', expected ipc or http", other)),
    }
}

/// Edits requested by `config --set-*`
#[derive(Debug, Default)]
struct ConfigEdits {
    transport: Option<TransportKind>,
    ipc_path: Option<PathBuf>,
    http_url: Option<String>,
    sender: Option<String>,
    compiler: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = run(cli.command, cli.ipc, cli.http, cli.block_time, cli.json).await;

    if let Err(e) = result {
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "error": e.to_string(),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

async fn run(
    command: Commands,
    ipc: Option<PathBuf>,
    http: Option<String>,
    block_time: Option<u64>,
    json: bool,
) -> Result<(), CliError> {
    let mut config = Config::load()?;

    let command = match command {
        Commands::Config {
            show,
            set_transport,
            set_ipc_path,
            set_http_url,
            set_sender,
            set_compiler,
        } => {
            let edits = ConfigEdits {
                transport: set_transport,
                ipc_path: set_ipc_path,
                http_url: set_http_url,
                sender: set_sender,
                compiler: set_compiler,
            };
            return handle_config(&mut config, show, edits, json);
        }
        other => other,
    };

    // Command-line overrides apply to this run only
    if let Some(path) = ipc {
        config.transport = TransportKind::Ipc;
        config.ipc_path = Some(path);
    }
    if let Some(url) = http {
        config.transport = TransportKind::Http;
        config.http_url = url;
    }
    if let Some(secs) = block_time {
        config.block_time_secs = secs;
    }

    match command {
        Commands::Call(cmd) => cmd.execute(&config, json).await,
        Commands::Send(cmd) => cmd.execute(&config, json).await,
        Commands::Deploy(cmd) => cmd.execute(&config, json).await,
        Commands::Rpc(cmd) => cmd.execute(&config, json).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn handle_config(config: &mut Config, show: bool, edits: ConfigEdits, json: bool) -> Result<(), CliError> {
    let mut modified = false;

    if let Some(transport) = edits.transport {
        config.transport = transport;
        modified = true;
    }
    if let Some(path) = edits.ipc_path {
        config.ipc_path = Some(path);
        modified = true;
    }
    if let Some(url) = edits.http_url {
        config.http_url = url;
        modified = true;
    }
    if let Some(sender) = edits.sender {
        tessera_sdk::types::parse_address(&sender)?;
        config.sender = Some(sender);
        modified = true;
    }
    if let Some(compiler) = edits.compiler {
        config.compiler = compiler;
        modified = true;
    }

    if modified {
        let path = config.save()?;
        Output::new(json)
            .field("status", "saved")
            .field("path", &path.display().to_string())
            .message("Configuration saved")
            .print();
    } else if show {
        let ipc_path = config
            .ipc_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(default)".to_string());
        let sender = config.sender.clone().unwrap_or_else(|| "(coinbase)".to_string());
        Output::new(json)
            .field("transport", &config.transport.to_string())
            .field("ipc_path", &ipc_path)
            .field("http_url", &config.http_url)
            .field_u64("block_time_secs", config.block_time_secs)
            .field_u64("max_tries", u64::from(config.max_tries))
            .field_u64("gas", config.gas)
            .field("sender", &sender)
            .field("compiler", &config.compiler)
            .message(&format!(
                "Transport: {}\nIPC path: {}\nHTTP URL: {}\nBlock time: {}s\nGas: {}\nSender: {}\nCompiler: {}",
                config.transport,
                ipc_path,
                config.http_url,
                config.block_time_secs,
                config.gas,
                sender,
                config.compiler
            ))
            .print();
    } else {
        Output::new(json)
            .message("Use --show to display config, or --set-* options to modify")
            .print();
    }

    Ok(())
}
