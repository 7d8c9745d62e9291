//! RpcClient - JSON-RPC client over any transport

use std::collections::HashMap;

use bytes::Bytes;
use primitive_types::{H160 as Address, H256};
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::{random_tag, RpcEnvelope, RpcResponse};
use crate::transport::Transport;
use crate::types::{
    format_address, parse_address, parse_h256, parse_hex_bytes, parse_hex_u64, BlockId, Receipt,
    TransactionRequest,
};
use crate::SdkError;

/// JSON-RPC client owning one transport.
///
/// Ids are `<tag>-<counter>`: the tag is random per client, the counter
/// starts at 0 and only ever goes up.
pub struct RpcClient {
    transport: Box<dyn Transport>,
    tag: String,
    counter: u64,
    batch: Vec<RpcEnvelope>,
}

impl RpcClient {
    /// Create a client with a custom transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Box::new(transport))
    }

    /// Create a client from a boxed transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            tag: random_tag(),
            counter: 0,
            batch: Vec::new(),
        }
    }

    /// Open the transport
    pub async fn connect(&mut self) -> Result<(), SdkError> {
        self.transport.connect().await
    }

    /// Close the transport
    pub async fn close(&mut self) -> Result<(), SdkError> {
        self.transport.close().await
    }

    /// Transport endpoint
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// Random id prefix of this client
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Number of calls queued for the next flush
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    fn next_envelope(&mut self, method: &str, params: Vec<Value>) -> RpcEnvelope {
        let id = format!("{}-{}", self.tag, self.counter);
        self.counter += 1;
        RpcEnvelope::new(id, method, params)
    }

    async fn exchange(&mut self, body: Vec<u8>) -> Result<Vec<u8>, SdkError> {
        debug!(endpoint = %self.transport.endpoint(), "Sending: {}", String::from_utf8_lossy(&body));
        let reply = self.transport.send_and_receive(&body).await?;
        debug!("Got: {}", String::from_utf8_lossy(&reply));
        Ok(reply)
    }

    /// Send one call and return its `result`.
    ///
    /// The node's error object comes back as [`SdkError::Rpc`].
    pub async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let envelope = self.next_envelope(method, params);
        let body = serde_json::to_vec(&envelope)?;
        let reply = self.exchange(body).await?;

        let response: RpcResponse = serde_json::from_slice(&reply)
            .map_err(|e| SdkError::Protocol(format!("{}: {}", method, e)))?;
        if !response.has_id(&envelope.id) {
            self.resync().await;
            return Err(SdkError::Protocol(format!(
                "expected id {}, got {}",
                envelope.id, response.id
            )));
        }
        response.into_result()
    }

    /// Drop the connection after a reply meant for another request; the
    /// next call reconnects
    async fn resync(&mut self) {
        if let Err(e) = self.transport.close().await {
            warn!(error = %e, "Failed to close out-of-sync connection");
        }
    }

    /// Queue a call for the next [`flush_batch`](Self::flush_batch); returns its id
    pub fn queue(&mut self, method: &str, params: Vec<Value>) -> String {
        let envelope = self.next_envelope(method, params);
        let id = envelope.id.clone();
        self.batch.push(envelope);
        id
    }

    /// Send every queued call as one array.
    ///
    /// Results come back in queue order whatever order the node answers in.
    /// The queue is emptied even when the flush fails.
    pub async fn flush_batch(&mut self) -> Result<Vec<Result<Value, SdkError>>, SdkError> {
        let batch = std::mem::take(&mut self.batch);
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::to_vec(&batch)?;
        let reply = self.exchange(body).await?;

        let responses: Vec<RpcResponse> = serde_json::from_slice(&reply)
            .map_err(|e| SdkError::Protocol(format!("batch reply: {}", e)))?;
        if responses.len() != batch.len() {
            self.resync().await;
            return Err(SdkError::Protocol(format!(
                "sent {} calls, got {} responses",
                batch.len(),
                responses.len()
            )));
        }

        let mut by_id: HashMap<String, RpcResponse> = responses
            .into_iter()
            .filter_map(|r| r.id.as_str().map(str::to_string).map(|id| (id, r)))
            .collect();
        if let Some(missing) = batch.iter().find(|e| !by_id.contains_key(&e.id)) {
            self.resync().await;
            return Err(SdkError::Protocol(format!("no response for id {}", missing.id)));
        }

        batch
            .iter()
            .map(|envelope| {
                by_id
                    .remove(&envelope.id)
                    .map(RpcResponse::into_result)
                    .ok_or_else(|| SdkError::Protocol(format!("no response for id {}", envelope.id)))
            })
            .collect()
    }

    // ==================== Typed Helpers ====================

    /// Address the node signs with by default
    pub async fn coinbase(&mut self) -> Result<Address, SdkError> {
        let value = self.eth_coinbase().await?;
        parse_address(as_str(&value, "eth_coinbase")?)
    }

    /// Get the current block number
    pub async fn block_number(&mut self) -> Result<u64, SdkError> {
        let value = self.eth_block_number().await?;
        parse_hex_u64(as_str(&value, "eth_blockNumber")?)
    }

    /// Get the code at an address
    pub async fn get_code(&mut self, address: &Address, block: BlockId) -> Result<Bytes, SdkError> {
        let value = self.eth_get_code(format_address(address), block).await?;
        parse_hex_bytes(as_str(&value, "eth_getCode")?)
    }

    /// Get a transaction receipt; `None` while the transaction is unmined
    pub async fn get_receipt(&mut self, hash: &H256) -> Result<Option<Receipt>, SdkError> {
        let value = self.eth_get_transaction_receipt(hash).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SdkError::Protocol(format!("eth_getTransactionReceipt: {}", e)))
    }

    /// Submit a transaction for the node to sign; returns its hash
    pub async fn send_transaction(&mut self, tx: &TransactionRequest) -> Result<H256, SdkError> {
        let value = self.eth_send_transaction(tx).await?;
        parse_h256(as_str(&value, "eth_sendTransaction")?)
    }

    /// Execute a read-only call and return the raw output
    pub async fn eth_call(&mut self, tx: &TransactionRequest, block: BlockId) -> Result<Bytes, SdkError> {
        let value = self.eth_call_raw(tx, block).await?;
        parse_hex_bytes(as_str(&value, "eth_call")?)
    }
}

fn as_str<'a>(value: &'a Value, method: &str) -> Result<&'a str, SdkError> {
    value
        .as_str()
        .ok_or_else(|| SdkError::Protocol(format!("{}: expected a string, got {}", method, value)))
}
