//! SDK types

use bytes::Bytes;
use primitive_types::{H160 as Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::SdkError;

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&format!("0x{:x}", n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
            BlockId::Earliest => serializer.serialize_str("earliest"),
        }
    }
}

/// Transaction object for `eth_sendTransaction` and `eth_call`.
///
/// The node signs with `from`; a missing `to` creates a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Gas ceiling
    pub gas: Option<u64>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Call data or init code
    pub data: Bytes,
}

impl Serialize for TransactionRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let count = 1
            + usize::from(self.from.is_some())
            + usize::from(self.to.is_some())
            + usize::from(self.gas.is_some())
            + usize::from(self.value.is_some());

        let mut map = serializer.serialize_map(Some(count))?;

        if let Some(from) = &self.from {
            map.serialize_entry("from", &format_address(from))?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &format_address(to))?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &format!("0x{:x}", gas))?;
        }
        if let Some(value) = &self.value {
            map.serialize_entry("value", &format!("0x{:x}", value))?;
        }
        map.serialize_entry("data", &format!("0x{}", hex::encode(&self.data)))?;

        map.end()
    }
}

/// Transaction receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Transaction hash
    pub transaction_hash: H256,
    /// Block the transaction was included in
    #[serde(default)]
    pub block_number: Option<U256>,
    /// Address of the contract created, for deployments
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// 1 on success, 0 on revert (absent on old nodes)
    #[serde(default)]
    pub status: Option<U256>,
    /// Gas consumed
    #[serde(default)]
    pub gas_used: Option<U256>,
}

/// Outcome of a confirmed deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Address the code was installed at
    pub address: Address,
    /// Hash of the creating transaction
    pub tx_hash: H256,
}

/// Lowercase `0x`-prefixed hex form of an address
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Parse an address from hex (with or without 0x prefix)
pub fn parse_address(s: &str) -> Result<Address, SdkError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| SdkError::InvalidAddress(format!("{}: {}", s, e)))?;
    if bytes.len() != 20 {
        return Err(SdkError::InvalidAddress(format!(
            "{}: expected 20 bytes, got {}",
            s,
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Parse a 32-byte hash from hex
pub fn parse_h256(s: &str) -> Result<H256, SdkError> {
    let bytes = parse_hex_bytes(s)?;
    if bytes.len() != 32 {
        return Err(SdkError::InvalidHex(format!("{}: expected 32 bytes, got {}", s, bytes.len())));
    }
    Ok(H256::from_slice(&bytes))
}

/// Parse a hex quantity such as `0x1b4`
pub fn parse_hex_u64(s: &str) -> Result<u64, SdkError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| SdkError::InvalidHex(e.to_string()))
}

/// Parse hex data; `0x` alone is empty
pub fn parse_hex_bytes(s: &str) -> Result<Bytes, SdkError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(Bytes::new());
    }
    let bytes = hex::decode(s)?;
    Ok(Bytes::from(bytes))
}
