//! ABI type definitions

use std::fmt;
use std::str::FromStr;

use primitive_types::{H160 as Address, U256};

use crate::SdkError;

/// Base kind of an ABI type, before width and array suffixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    /// Signed integer
    Int,
    /// Unsigned integer
    UInt,
    /// Signed fixed-point
    Fixed,
    /// Unsigned fixed-point
    UFixed,
    /// Boolean
    Bool,
    /// 20-byte address
    Address,
    /// `bytes` (dynamic) or `bytes<M>` (static)
    Bytes,
    /// UTF-8 string
    String,
}

impl BaseKind {
    /// Keyword as it appears in a type descriptor
    pub fn keyword(&self) -> &'static str {
        match self {
            BaseKind::Int => "int",
            BaseKind::UInt => "uint",
            BaseKind::Fixed => "fixed",
            BaseKind::UFixed => "ufixed",
            BaseKind::Bool => "bool",
            BaseKind::Address => "address",
            BaseKind::Bytes => "bytes",
            BaseKind::String => "string",
        }
    }

    /// Encoded as a two's-complement word
    pub fn is_integer_like(&self) -> bool {
        matches!(
            self,
            BaseKind::Int
                | BaseKind::UInt
                | BaseKind::Fixed
                | BaseKind::UFixed
                | BaseKind::Bool
                | BaseKind::Address
        )
    }

    /// Signed encoding (`int`, `fixed`)
    pub fn is_signed(&self) -> bool {
        matches!(self, BaseKind::Int | BaseKind::Fixed)
    }
}

/// Array suffix of an ABI type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    /// Not an array
    None,
    /// `T[n]`
    Fixed(usize),
    /// `T[]`
    Dynamic,
}

/// Parsed ABI type descriptor.
///
/// `bits` is kept exactly as written so that [`fmt::Display`] reproduces the
/// declared form; `bytes<M>` stores `8 * M`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbiType {
    /// Base kind
    pub kind: BaseKind,
    /// Declared bit width
    pub bits: Option<u16>,
    /// Fractional digits of a fixed-point type (`N` in `MxN`)
    pub fraction: Option<u8>,
    /// Array suffix
    pub array: ArrayKind,
}

impl AbiType {
    /// Scalar type without width
    pub const fn scalar(kind: BaseKind) -> Self {
        Self {
            kind,
            bits: None,
            fraction: None,
            array: ArrayKind::None,
        }
    }

    /// `uint<bits>`
    pub const fn uint(bits: u16) -> Self {
        Self {
            kind: BaseKind::UInt,
            bits: Some(bits),
            fraction: None,
            array: ArrayKind::None,
        }
    }

    /// `int<bits>`
    pub const fn int(bits: u16) -> Self {
        Self {
            kind: BaseKind::Int,
            bits: Some(bits),
            fraction: None,
            array: ArrayKind::None,
        }
    }

    /// `bytes<len>`
    pub const fn fixed_bytes(len: u16) -> Self {
        Self {
            kind: BaseKind::Bytes,
            bits: Some(len * 8),
            fraction: None,
            array: ArrayKind::None,
        }
    }

    /// This type with an array suffix
    pub fn array_of(mut self, array: ArrayKind) -> Self {
        self.array = array;
        self
    }

    /// Element type of an array (or the type itself for scalars)
    pub fn element(&self) -> AbiType {
        Self {
            array: ArrayKind::None,
            ..self.clone()
        }
    }

    /// Check if this is an array type
    pub fn is_array(&self) -> bool {
        self.array != ArrayKind::None
    }

    /// Check if this type is dynamic (variable length)
    pub fn is_dynamic(&self) -> bool {
        match self.array {
            ArrayKind::Dynamic => true,
            ArrayKind::Fixed(_) => self.element().is_dynamic(),
            ArrayKind::None => match self.kind {
                BaseKind::String => true,
                BaseKind::Bytes => self.bits.is_none(),
                _ => false,
            },
        }
    }

    /// Bytes this type occupies in the head of an argument tuple
    pub fn head_len(&self) -> usize {
        match self.array {
            ArrayKind::Fixed(size) if !self.is_dynamic() => size * self.element().head_len(),
            _ => 32,
        }
    }

    /// Effective bit width of an integer-like scalar
    pub fn int_bits(&self) -> u16 {
        match self.kind {
            BaseKind::Bool => 8,
            BaseKind::Address => 160,
            BaseKind::Fixed | BaseKind::UFixed => self.bits.unwrap_or(128),
            _ => self.bits.unwrap_or(256),
        }
    }

    /// `M` for `bytes<M>`, `None` for dynamic `bytes` and other kinds
    pub fn fixed_bytes_len(&self) -> Option<usize> {
        match self.kind {
            BaseKind::Bytes => self.bits.map(|b| usize::from(b / 8)),
            _ => None,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        match (self.kind, self.bits, self.fraction) {
            (BaseKind::Bytes, Some(bits), _) => write!(f, "{}", bits / 8)?,
            (_, Some(bits), Some(fraction)) => write!(f, "{}x{}", bits, fraction)?,
            (_, Some(bits), None) => write!(f, "{}", bits)?,
            _ => {}
        }
        match self.array {
            ArrayKind::None => Ok(()),
            ArrayKind::Fixed(size) => write!(f, "[{}]", size),
            ArrayKind::Dynamic => f.write_str("[]"),
        }
    }
}

impl FromStr for AbiType {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::grammar::parse_type(s)
    }
}

/// Signed 256-bit integer in sign-magnitude form.
///
/// Zero is never negative, so equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I256 {
    abs: U256,
    negative: bool,
}

impl I256 {
    /// Create a new I256
    pub fn new(abs: U256, negative: bool) -> Self {
        Self {
            abs,
            negative: negative && !abs.is_zero(),
        }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        Self::new(U256::from(value.unsigned_abs()), value < 0)
    }

    /// Smallest value representable in `bits`
    pub fn min_value(bits: u16) -> Self {
        Self::new(U256::one() << (bits as usize - 1), true)
    }

    /// Largest value representable in `bits`
    pub fn max_value(bits: u16) -> Self {
        Self::new((U256::one() << (bits as usize - 1)) - 1, false)
    }

    /// Absolute value
    pub fn abs(&self) -> U256 {
        self.abs
    }

    /// Sign
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Whether the value fits a signed integer of `bits` width
    pub fn fits(&self, bits: u16) -> bool {
        let limit = U256::one() << (bits as usize - 1);
        if self.negative {
            self.abs <= limit
        } else {
            self.abs < limit
        }
    }

    /// 256-bit two's-complement representation
    pub fn to_twos_complement(&self) -> U256 {
        if self.negative {
            (!self.abs).overflowing_add(U256::one()).0
        } else {
            self.abs
        }
    }

    /// Inverse of [`I256::to_twos_complement`]
    pub fn from_twos_complement(raw: U256) -> Self {
        if raw.bit(255) {
            Self::new((!raw).overflowing_add(U256::one()).0, true)
        } else {
            Self::new(raw, false)
        }
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_i128(value.into())
    }
}

/// ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address (20 bytes)
    Address(Address),
    /// Unsigned integer, also the scaled value of a `ufixed`
    Uint(U256),
    /// Signed integer, also the scaled value of a `fixed`
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Fixed-size bytes (1-32)
    FixedBytes(Vec<u8>),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Array, fixed or dynamic
    Array(Vec<Token>),
}

impl Token {
    /// Create a uint256 from u128
    pub fn uint(value: u128) -> Self {
        Token::Uint(U256::from(value))
    }

    /// Create an int from i128
    pub fn int(value: i128) -> Self {
        Token::Int(I256::from_i128(value))
    }

    /// Create a string token
    pub fn string(s: impl Into<String>) -> Self {
        Token::String(s.into())
    }

    /// Short name of the token kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Uint(_) => "unsigned integer",
            Token::Int(_) => "signed integer",
            Token::Bool(_) => "bool",
            Token::FixedBytes(_) => "fixed bytes",
            Token::Bytes(_) => "bytes",
            Token::String(_) => "string",
            Token::Array(_) => "array",
        }
    }

    /// Coarse shape check: could this value be encoded as `ty`?
    ///
    /// Ranges are not checked here; the encoder does that.
    pub fn matches_shape(&self, ty: &AbiType) -> bool {
        match (ty.array, self) {
            (ArrayKind::Dynamic, Token::Array(items)) => {
                let element = ty.element();
                items.iter().all(|t| t.matches_shape(&element))
            }
            (ArrayKind::Fixed(size), Token::Array(items)) => {
                let element = ty.element();
                items.len() == size && items.iter().all(|t| t.matches_shape(&element))
            }
            (ArrayKind::None, token) => match (ty.kind, token) {
                (BaseKind::Address, Token::Address(_)) => true,
                (BaseKind::Bool, Token::Bool(_)) => true,
                (BaseKind::String, Token::String(_)) => true,
                (BaseKind::Int | BaseKind::Fixed, Token::Int(_) | Token::Uint(_)) => true,
                (BaseKind::UInt | BaseKind::UFixed, Token::Uint(_)) => true,
                (BaseKind::UInt | BaseKind::UFixed, Token::Int(v)) => !v.is_negative(),
                (BaseKind::Bytes, Token::Bytes(data) | Token::FixedBytes(data)) => {
                    match ty.fixed_bytes_len() {
                        Some(len) => data.len() <= len,
                        None => true,
                    }
                }
                _ => false,
            },
            _ => false,
        }
    }
}
