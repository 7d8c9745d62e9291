//! ABI encoding and decoding for contract calls
//!
//! This module provides functionality for:
//! - Parsing type descriptors (`uint256[]`, `bytes32`, `fixed128x18`, ...)
//! - Encoding argument tuples with the head/tail layout
//! - Decoding return values
//! - Computing function selectors
//!
//! # Example
//!
//! ```rust
//! use tessera_sdk::abi::{encode_call, decode_arguments, AbiType, Token};
//! use tessera_sdk::Address;
//!
//! let types: Vec<AbiType> = ["address", "uint256"]
//!     .iter()
//!     .map(|t| t.parse().unwrap())
//!     .collect();
//! let data = encode_call("transfer", &types, &[Token::Address(Address::zero()), Token::uint(1000)])
//!     .unwrap();
//! assert_eq!(data.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
//!
//! let decoded = decode_arguments(&types, data.arguments()).unwrap();
//! assert_eq!(decoded[1], Token::uint(1000));
//! ```

mod decode;
mod encode;
mod grammar;
mod types;

pub use decode::{decode_arguments, decode_value};
pub use encode::{
    encode_arguments, encode_array, encode_call, encode_scalar, encode_value, function_selector,
    selector_of, signature, CallData, EncodedSlot,
};
pub use grammar::parse_type;
pub use types::{AbiType, ArrayKind, BaseKind, I256, Token};

use crate::SdkError;

/// Parse every descriptor in a declared parameter list
pub fn parse_types<S: AsRef<str>>(types: &[S]) -> Result<Vec<AbiType>, SdkError> {
    types.iter().map(|t| parse_type(t.as_ref())).collect()
}
