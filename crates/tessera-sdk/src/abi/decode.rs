//! ABI decoding

use primitive_types::{H160 as Address, U256};

use super::types::{AbiType, ArrayKind, BaseKind, I256, Token};
use crate::SdkError;

/// Decode an argument region (or return data) laid out as a head/tail tuple
pub fn decode_arguments(types: &[AbiType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    decode_tuple(types, data, 0)
}

/// Decode a single value whose encoding starts at `data[0]`
pub fn decode_value(ty: &AbiType, data: &[u8]) -> Result<Token, SdkError> {
    decode_at(ty, data, 0)
}

/// Decode a tuple whose head starts at `base`; offsets are relative to `base`.
fn decode_tuple(types: &[AbiType], data: &[u8], base: usize) -> Result<Vec<Token>, SdkError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = base;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, head)?;
            let start = base
                .checked_add(offset)
                .ok_or_else(|| SdkError::AbiDecode(format!("offset {} overflows", offset)))?;
            tokens.push(decode_at(ty, data, start)?);
            head += 32;
        } else {
            tokens.push(decode_at(ty, data, head)?);
            head += ty.head_len();
        }
    }

    Ok(tokens)
}

fn decode_at(ty: &AbiType, data: &[u8], at: usize) -> Result<Token, SdkError> {
    match ty.array {
        ArrayKind::None => decode_scalar(ty, data, at),
        ArrayKind::Fixed(size) => {
            let element = ty.element();
            check_count(size, data, at)?;
            let types = vec![element; size];
            Ok(Token::Array(decode_tuple(&types, data, at)?))
        }
        ArrayKind::Dynamic => {
            let count = read_usize(data, at)?;
            check_count(count, data, at + 32)?;
            let types = vec![ty.element(); count];
            Ok(Token::Array(decode_tuple(&types, data, at + 32)?))
        }
    }
}

fn decode_scalar(ty: &AbiType, data: &[u8], at: usize) -> Result<Token, SdkError> {
    let word = read_word(data, at)?;

    match ty.kind {
        BaseKind::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(SdkError::AbiDecode("address has non-zero padding".to_string()));
            }
            Ok(Token::Address(Address::from_slice(&word[12..])))
        }
        BaseKind::Bool => match U256::from_big_endian(word) {
            v if v.is_zero() => Ok(Token::Bool(false)),
            v if v == U256::one() => Ok(Token::Bool(true)),
            v => Err(SdkError::AbiDecode(format!("{} is not a bool", v))),
        },
        BaseKind::UInt | BaseKind::UFixed => {
            let value = U256::from_big_endian(word);
            if value.bits() > usize::from(ty.int_bits()) {
                return Err(SdkError::AbiDecode(format!("{} out of range for {}", value, ty)));
            }
            Ok(Token::Uint(value))
        }
        BaseKind::Int | BaseKind::Fixed => {
            let value = I256::from_twos_complement(U256::from_big_endian(word));
            if !value.fits(ty.int_bits()) {
                return Err(SdkError::AbiDecode(format!("value out of range for {}", ty)));
            }
            Ok(Token::Int(value))
        }
        BaseKind::Bytes => match ty.fixed_bytes_len() {
            Some(len) => Ok(Token::FixedBytes(word[..len].to_vec())),
            None => Ok(Token::Bytes(decode_bytes(data, at)?)),
        },
        BaseKind::String => {
            let bytes = decode_bytes(data, at)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| SdkError::AbiDecode(format!("Invalid UTF-8: {}", e)))?;
            Ok(Token::String(s))
        }
    }
}

/// Length word at `at`, payload right after it
fn decode_bytes(data: &[u8], at: usize) -> Result<Vec<u8>, SdkError> {
    let len = read_usize(data, at)?;
    let start = at + 32;
    let end = start
        .checked_add(len)
        .ok_or_else(|| SdkError::AbiDecode(format!("length {} overflows", len)))?;
    check_length(data, end)?;
    Ok(data[start..end].to_vec())
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], SdkError> {
    let end = at
        .checked_add(32)
        .ok_or_else(|| SdkError::AbiDecode(format!("offset {} overflows", at)))?;
    check_length(data, end)?;
    Ok(&data[at..end])
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, SdkError> {
    let value = U256::from_big_endian(read_word(data, at)?);
    if value.bits() > 64 {
        return Err(SdkError::AbiDecode(format!("{} does not fit a length", value)));
    }
    usize::try_from(value.low_u64())
        .map_err(|_| SdkError::AbiDecode(format!("{} does not fit a length", value)))
}

/// Every element takes at least one word, so a count larger than the remaining
/// words can only come from corrupt data.
fn check_count(count: usize, data: &[u8], at: usize) -> Result<(), SdkError> {
    let remaining = data.len().saturating_sub(at) / 32;
    if count > remaining {
        return Err(SdkError::AbiDecode(format!(
            "array of {} elements cannot fit in {} remaining words",
            count, remaining
        )));
    }
    Ok(())
}

/// Check that data has at least `required` bytes
fn check_length(data: &[u8], required: usize) -> Result<(), SdkError> {
    if data.len() < required {
        return Err(SdkError::AbiDecode(format!(
            "Insufficient data: need {} bytes, have {}",
            required,
            data.len()
        )));
    }
    Ok(())
}
