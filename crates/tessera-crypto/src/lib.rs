//! # tessera-crypto
//!
//! Hash functions for tessera.
//!
//! - Keccak-256, the ledger's native hash (function selectors, code hashes)
//! - SHA3-256, the later FIPS-202 variant of the same sponge
//! - [`SELECTOR_HASH`], the variant the ABI layer uses for selectors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{digest, keccak256, sha3_256, HashVariant, SELECTOR_HASH};
