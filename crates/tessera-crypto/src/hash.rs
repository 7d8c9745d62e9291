//! 256-bit hashing

use primitive_types::H256;
use sha3::{Digest, Keccak256, Sha3_256};

/// Member of the Keccak family to hash with.
///
/// The ledger predates FIPS-202 and uses the original Keccak padding. Both
/// variants produce 32 bytes, so picking the wrong one goes unnoticed until a
/// node rejects every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashVariant {
    /// Original Keccak-256 submission (the ledger's hash).
    Keccak256,
    /// Standardized SHA3-256.
    Sha3_256,
}

/// Hash used for function selectors.
pub const SELECTOR_HASH: HashVariant = HashVariant::Keccak256;

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_slice(&hasher.finalize())
}

/// Compute SHA3-256 hash of the input data
pub fn sha3_256(data: &[u8]) -> H256 {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    H256::from_slice(&hasher.finalize())
}

/// Hash `data` with the given variant.
pub fn digest(variant: HashVariant, data: &[u8]) -> H256 {
    match variant {
        HashVariant::Keccak256 => keccak256(data),
        HashVariant::Sha3_256 => sha3_256(data),
    }
}
