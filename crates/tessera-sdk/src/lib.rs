//! # tessera-sdk
//!
//! Contract-interaction pipeline for EVM-style ledgers.
//!
//! ## Features
//!
//! - **ABI**: type grammar, head/tail argument encoding and decoding
//! - **Transport**: JSON-RPC exchange over a Unix socket (IPC) or HTTP
//! - **RpcClient**: envelope tagging, batching and method wrappers
//! - **CallOrchestrator**: overload resolution and confirmation with resubmission
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessera_sdk::{CallOrchestrator, OrchestratorConfig, RpcClient};
//! use tessera_sdk::transport::IpcTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RpcClient::new(IpcTransport::default());
//!     client.connect().await?;
//!     println!("block {}", client.block_number().await?);
//!
//!     let mut orchestrator = CallOrchestrator::new(client, OrchestratorConfig::default());
//!     let deployment = orchestrator.deploy(&hex::decode("6000600055")?).await?;
//!     println!("deployed at {:?}", deployment.address);
//!     Ok(())
//! }
//! ```
//!
//! ## Batching
//!
//! ```rust
//! use tessera_sdk::{MockTransport, RpcClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tessera_sdk::SdkError> {
//! let mut client = RpcClient::new(MockTransport::new());
//! client.queue("eth_blockNumber", vec![]);
//! client.queue("eth_coinbase", vec![]);
//! let results = client.flush_batch().await?;
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
mod client;
pub mod contract;
pub mod envelope;
mod error;
mod methods;
pub mod orchestrator;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::RpcClient;
pub use contract::{Contract, FunctionDef};
pub use error::SdkError;
pub use methods::KNOWN_METHODS;
pub use orchestrator::{CallOrchestrator, ConfirmationState, OrchestratorConfig};
pub use transport::MockTransport;

/// Re-export Transport trait for custom implementations
pub use transport::Transport;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

#[cfg(unix)]
pub use transport::IpcTransport;

// Re-export primitives for convenience
pub use primitive_types::{H160 as Address, H256, U256};
pub use types::{BlockId, Deployment, Receipt, TransactionRequest};
