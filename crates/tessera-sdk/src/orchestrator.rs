//! Transaction submission and confirmation
//!
//! A submitted transaction moves through
//! `Submitted -> Waiting -> Checking -> {Confirmed, Exhausted}`. Each check
//! that observes nothing uses one try; running out of tries is `Exhausted`,
//! which resends the identical transaction from `Submitted`. The number of
//! resends is bounded by [`OrchestratorConfig::max_resubmissions`].

use std::time::Duration;

use bytes::Bytes;
use primitive_types::{H160 as Address, H256};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::abi::Token;
use crate::client::RpcClient;
use crate::contract::{Contract, FunctionDef};
use crate::types::{BlockId, Deployment, Receipt, TransactionRequest};
use crate::SdkError;

/// Gas ceiling sent with every transaction unless configured otherwise
pub const DEFAULT_GAS: u64 = 3_141_592;

/// JSON-RPC "resource unavailable", treated as a busy node
pub const RESOURCE_UNAVAILABLE: i64 = -32002;

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Wait between checks, and before resending to a busy node
    pub block_time: Duration,
    /// Checks per submission before it counts as exhausted
    pub max_tries: u32,
    /// Full resends allowed; `None` resends forever
    pub max_resubmissions: Option<u32>,
    /// Resends allowed while the node reports itself busy
    pub max_busy_retries: u32,
    /// Error codes meaning "busy, try again later"
    pub busy_codes: Vec<i64>,
    /// Gas ceiling
    pub gas: u64,
    /// Sender; the node's coinbase when unset
    pub sender: Option<Address>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            block_time: Duration::from_secs(12),
            max_tries: 10,
            max_resubmissions: Some(5),
            max_busy_retries: 10,
            busy_codes: vec![RESOURCE_UNAVAILABLE],
            gas: DEFAULT_GAS,
            sender: None,
        }
    }
}

/// Bookkeeping for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationAttempt {
    /// Hash returned by the node for this submission
    pub target: H256,
    /// Checks that observed nothing
    pub tries_used: u32,
    /// When the next check is due
    pub deadline: Instant,
}

/// Confirmation state, carrying the outcome `T` once confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState<T> {
    /// About to send the transaction
    Submitted,
    /// Sleeping until the attempt's deadline
    Waiting(ConfirmationAttempt),
    /// Querying the node
    Checking(ConfirmationAttempt),
    /// Observed on-chain
    Confirmed(T),
    /// Tries ran out for this submission
    Exhausted(ConfirmationAttempt),
}

/// What a check looks for
enum Expectation<'a> {
    Receipt,
    Code(&'a [u8]),
}

enum Observed {
    Receipt(Receipt),
    Deployment(Deployment),
}

/// Submits transactions and waits until they are observed on-chain
pub struct CallOrchestrator {
    client: RpcClient,
    config: OrchestratorConfig,
    coinbase: Option<Address>,
}

impl CallOrchestrator {
    /// Create an orchestrator over a client
    pub fn new(client: RpcClient, config: OrchestratorConfig) -> Self {
        Self {
            client,
            config,
            coinbase: None,
        }
    }

    /// Settings in use
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Underlying client
    pub fn client_mut(&mut self) -> &mut RpcClient {
        &mut self.client
    }

    /// Give the client back
    pub fn into_client(self) -> RpcClient {
        self.client
    }

    /// Pick the overload of `function` that accepts `args`
    pub fn resolve<'c>(
        &self,
        contract: &'c Contract,
        function: &str,
        args: &[Token],
    ) -> Result<&'c FunctionDef, SdkError> {
        contract.resolve(function, args)
    }

    /// Configured sender, or the node's coinbase (fetched once)
    pub async fn sender(&mut self) -> Result<Address, SdkError> {
        if let Some(sender) = self.config.sender.or(self.coinbase) {
            return Ok(sender);
        }
        let coinbase = self.client.coinbase().await?;
        debug!(?coinbase, "Using node coinbase as sender");
        self.coinbase = Some(coinbase);
        Ok(coinbase)
    }

    /// Call a contract function in a transaction and wait for its receipt
    pub async fn transact(
        &mut self,
        contract: &Contract,
        function: &str,
        args: &[Token],
    ) -> Result<Receipt, SdkError> {
        let to = contract_address(contract)?;
        let data = contract.resolve(function, args)?.encode(args)?;
        let tx = TransactionRequest {
            from: Some(self.sender().await?),
            to: Some(to),
            gas: Some(self.config.gas),
            value: None,
            data: Bytes::from(data.to_bytes()),
        };

        match self.confirm(&tx, Expectation::Receipt).await? {
            Observed::Receipt(receipt) => Ok(receipt),
            Observed::Deployment(_) => Err(SdkError::Protocol("expected a receipt".to_string())),
        }
    }

    /// Deploy contract code and wait until it is installed
    pub async fn deploy(&mut self, bytecode: &[u8]) -> Result<Deployment, SdkError> {
        let tx = TransactionRequest {
            from: Some(self.sender().await?),
            to: None,
            gas: Some(self.config.gas),
            value: None,
            data: Bytes::copy_from_slice(bytecode),
        };

        match self.confirm(&tx, Expectation::Code(bytecode)).await? {
            Observed::Deployment(deployment) => Ok(deployment),
            Observed::Receipt(_) => Err(SdkError::Protocol("expected a deployment".to_string())),
        }
    }

    /// Read-only call at the latest block, decoded with the function's outputs
    pub async fn call(
        &mut self,
        contract: &Contract,
        function: &str,
        args: &[Token],
    ) -> Result<Vec<Token>, SdkError> {
        let to = contract_address(contract)?;
        let def = contract.resolve(function, args)?;
        let data = def.encode(args)?;
        let tx = TransactionRequest {
            from: self.config.sender,
            to: Some(to),
            gas: None,
            value: None,
            data: Bytes::from(data.to_bytes()),
        };

        let output = self.client.eth_call(&tx, BlockId::Latest).await?;
        def.decode_output(&output)
    }

    async fn confirm(
        &mut self,
        tx: &TransactionRequest,
        expect: Expectation<'_>,
    ) -> Result<Observed, SdkError> {
        let mut resubmissions = 0u32;
        let mut state = ConfirmationState::Submitted;

        loop {
            state = match state {
                ConfirmationState::Submitted => {
                    let target = self.submit(tx).await?;
                    info!(tx = ?target, "Transaction submitted");
                    ConfirmationState::Waiting(ConfirmationAttempt {
                        target,
                        tries_used: 0,
                        deadline: Instant::now() + self.config.block_time,
                    })
                }
                ConfirmationState::Waiting(attempt) => {
                    info!(
                        tx = ?attempt.target,
                        "Waiting {:?} for the next block (try {}/{})",
                        self.config.block_time,
                        attempt.tries_used + 1,
                        self.config.max_tries
                    );
                    sleep_until(attempt.deadline).await;
                    ConfirmationState::Checking(attempt)
                }
                ConfirmationState::Checking(mut attempt) => {
                    match self.observe(&attempt.target, &expect).await? {
                        Some(observed) => ConfirmationState::Confirmed(observed),
                        None => {
                            attempt.tries_used += 1;
                            if attempt.tries_used >= self.config.max_tries {
                                ConfirmationState::Exhausted(attempt)
                            } else {
                                attempt.deadline = Instant::now() + self.config.block_time;
                                ConfirmationState::Waiting(attempt)
                            }
                        }
                    }
                }
                ConfirmationState::Exhausted(attempt) => {
                    if self
                        .config
                        .max_resubmissions
                        .is_some_and(|max| resubmissions >= max)
                    {
                        return Err(SdkError::ConfirmationExhausted {
                            target: format!("{:?}", attempt.target),
                            resubmissions,
                        });
                    }
                    resubmissions += 1;
                    warn!(
                        tx = ?attempt.target,
                        resubmissions,
                        "Not observed after {} tries, resending",
                        attempt.tries_used
                    );
                    ConfirmationState::Submitted
                }
                ConfirmationState::Confirmed(observed) => return Ok(observed),
            };
        }
    }

    /// Send once, waiting out a busy node
    async fn submit(&mut self, tx: &TransactionRequest) -> Result<H256, SdkError> {
        let mut busy_retries = 0u32;
        loop {
            match self.client.send_transaction(tx).await {
                Ok(hash) => return Ok(hash),
                Err(e) if self.is_busy(&e) && busy_retries < self.config.max_busy_retries => {
                    busy_retries += 1;
                    warn!(
                        error = %e,
                        busy_retries,
                        "Node busy, resending in {:?}",
                        self.config.block_time
                    );
                    sleep(self.config.block_time).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn is_busy(&self, error: &SdkError) -> bool {
        error
            .rpc_code()
            .is_some_and(|code| self.config.busy_codes.contains(&code))
    }

    async fn observe(
        &mut self,
        target: &H256,
        expect: &Expectation<'_>,
    ) -> Result<Option<Observed>, SdkError> {
        let Some(receipt) = self.client.get_receipt(target).await? else {
            return Ok(None);
        };

        match expect {
            Expectation::Receipt => Ok(Some(Observed::Receipt(receipt))),
            Expectation::Code(bytecode) => {
                let Some(address) = receipt.contract_address else {
                    return Ok(None);
                };
                let code = self.client.get_code(&address, BlockId::Latest).await?;
                if code.is_empty() || !contains(bytecode, &code) {
                    debug!(?address, installed = code.len(), "Installed code does not match yet");
                    return Ok(None);
                }
                Ok(Some(Observed::Deployment(Deployment {
                    address,
                    tx_hash: receipt.transaction_hash,
                })))
            }
        }
    }
}

fn contract_address(contract: &Contract) -> Result<Address, SdkError> {
    contract
        .address()
        .copied()
        .ok_or_else(|| SdkError::InvalidAddress("contract has no address".to_string()))
}

/// Whether `needle` occurs in `haystack`
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTransport;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.block_time, Duration::from_secs(12));
        assert_eq!(config.max_tries, 10);
        assert_eq!(config.max_resubmissions, Some(5));
        assert_eq!(config.gas, 3_141_592);
        assert_eq!(config.busy_codes, vec![-32002]);
    }

    #[test]
    fn test_contains() {
        assert!(contains(&[1, 2, 3, 4], &[2, 3]));
        assert!(contains(&[1, 2, 3], &[1, 2, 3]));
        assert!(!contains(&[1, 2], &[1, 2, 3]));
        assert!(!contains(&[1, 2, 3], &[3, 2]));
    }

    #[tokio::test]
    async fn test_sender_defaults_to_coinbase() {
        let mock = MockTransport::new();
        let client = RpcClient::new(mock.clone());
        let mut orchestrator = CallOrchestrator::new(client, OrchestratorConfig::default());

        let first = orchestrator.sender().await.unwrap();
        let second = orchestrator.sender().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.requests_for("eth_coinbase").len(), 1);
    }

    #[tokio::test]
    async fn test_configured_sender_skips_coinbase() {
        let mock = MockTransport::new();
        let config = OrchestratorConfig {
            sender: Some(Address::repeat_byte(7)),
            ..Default::default()
        };
        let mut orchestrator = CallOrchestrator::new(RpcClient::new(mock.clone()), config);
        assert_eq!(orchestrator.sender().await.unwrap(), Address::repeat_byte(7));
        assert!(mock.requests_for("eth_coinbase").is_empty());
    }

    #[tokio::test]
    async fn test_transact_without_address() {
        let contract = Contract::default();
        let mut orchestrator =
            CallOrchestrator::new(RpcClient::new(MockTransport::new()), OrchestratorConfig::default());
        let err = orchestrator.transact(&contract, "f", &[]).await.unwrap_err();
        assert!(matches!(err, SdkError::InvalidAddress(_)));
    }
}
