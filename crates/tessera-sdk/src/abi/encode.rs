//! ABI encoding

use primitive_types::U256;
use tessera_crypto::{digest, SELECTOR_HASH};

use super::types::{AbiType, ArrayKind, BaseKind, I256, Token};
use crate::SdkError;

/// A single argument, encoded in isolation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSlot {
    bytes: Vec<u8>,
    dynamic: bool,
}

impl EncodedSlot {
    fn fixed(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            dynamic: false,
        }
    }

    fn variable(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            dynamic: true,
        }
    }

    /// Encoded payload
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload as hex digits, no prefix
    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Whether the payload goes to the tail
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Selector followed by the head/tail argument region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    selector: [u8; 4],
    arguments: Vec<u8>,
}

impl CallData {
    /// Assemble from an already encoded argument region
    pub fn new(selector: [u8; 4], arguments: Vec<u8>) -> Self {
        Self {
            selector,
            arguments,
        }
    }

    /// Function selector
    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Argument region (everything after the selector)
    pub fn arguments(&self) -> &[u8] {
        &self.arguments
    }

    /// Full call data
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.arguments.len());
        out.extend_from_slice(&self.selector);
        out.extend_from_slice(&self.arguments);
        out
    }

    /// `0x`-prefixed hex, as sent in a transaction's `data` field
    pub fn to_hex(&self) -> String {
        format!("0x{}{}", hex::encode(self.selector), hex::encode(&self.arguments))
    }
}

/// Canonical signature `name(t1,t2,...)`
pub fn signature<S: AsRef<str>>(name: &str, types: &[S]) -> String {
    let params: Vec<&str> = types.iter().map(AsRef::as_ref).collect();
    format!("{}({})", name, params.join(","))
}

/// First 4 bytes of the selector hash of a canonical signature
pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = digest(SELECTOR_HASH, signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Compute function selector from a name and its declared parameter types
pub fn function_selector<S: AsRef<str>>(name: &str, types: &[S]) -> [u8; 4] {
    selector_of(&signature(name, types))
}

/// Encode a complete call: selector plus arguments
pub fn encode_call(name: &str, types: &[AbiType], values: &[Token]) -> Result<CallData, SdkError> {
    let declared: Vec<String> = types.iter().map(ToString::to_string).collect();
    let selector = function_selector(name, &declared);
    Ok(CallData::new(selector, encode_arguments(values, types)?))
}

/// Encode an argument tuple with the head/tail layout.
///
/// Offsets are relative to the start of the region, i.e. just after the
/// selector.
pub fn encode_arguments(values: &[Token], types: &[AbiType]) -> Result<Vec<u8>, SdkError> {
    if values.len() != types.len() {
        return Err(SdkError::ArityMismatch {
            expected: types.len(),
            got: values.len(),
        });
    }

    let slots = values
        .iter()
        .zip(types)
        .map(|(value, ty)| encode_value(value, ty))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(layout(slots))
}

/// Place static slots in the head and dynamic ones in the tail behind offsets
fn layout(slots: Vec<EncodedSlot>) -> Vec<u8> {
    let head_size: usize = slots
        .iter()
        .map(|slot| if slot.dynamic { 32 } else { slot.len() })
        .sum();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for slot in slots {
        if slot.dynamic {
            head.extend(encode_usize(head_size + tail.len()));
            tail.extend(slot.bytes);
        } else {
            head.extend(slot.bytes);
        }
    }

    head.extend(tail);
    head
}

/// Encode any value, array or scalar
pub fn encode_value(value: &Token, ty: &AbiType) -> Result<EncodedSlot, SdkError> {
    if ty.is_array() {
        match value {
            Token::Array(items) => encode_array(items, ty),
            other => Err(shape_error(other, ty)),
        }
    } else {
        encode_scalar(value, ty)
    }
}

/// Encode a non-array value
pub fn encode_scalar(value: &Token, ty: &AbiType) -> Result<EncodedSlot, SdkError> {
    if ty.is_array() {
        return Err(shape_error(value, ty));
    }

    match (ty.kind, value) {
        (BaseKind::Address, Token::Address(addr)) => {
            let mut buf = [0u8; 32];
            buf[12..].copy_from_slice(addr.as_bytes());
            Ok(EncodedSlot::fixed(buf.to_vec()))
        }
        (BaseKind::Bool, Token::Bool(b)) => {
            let mut buf = [0u8; 32];
            buf[31] = u8::from(*b);
            Ok(EncodedSlot::fixed(buf.to_vec()))
        }
        (BaseKind::UInt | BaseKind::UFixed, Token::Uint(v)) => {
            check_unsigned(v, ty)?;
            Ok(EncodedSlot::fixed(encode_u256(v)))
        }
        (BaseKind::UInt | BaseKind::UFixed, Token::Int(v)) if !v.is_negative() => {
            let abs = v.abs();
            check_unsigned(&abs, ty)?;
            Ok(EncodedSlot::fixed(encode_u256(&abs)))
        }
        (BaseKind::Int | BaseKind::Fixed, Token::Int(v)) => {
            check_signed(v, ty)?;
            Ok(EncodedSlot::fixed(encode_u256(&v.to_twos_complement())))
        }
        (BaseKind::Int | BaseKind::Fixed, Token::Uint(v)) => {
            let v = I256::new(*v, false);
            check_signed(&v, ty)?;
            Ok(EncodedSlot::fixed(encode_u256(&v.abs())))
        }
        (BaseKind::Bytes, Token::FixedBytes(data) | Token::Bytes(data)) => match ty.fixed_bytes_len() {
            Some(len) => {
                if data.len() > len {
                    return Err(SdkError::AbiEncode(format!(
                        "{} bytes do not fit {}",
                        data.len(),
                        ty
                    )));
                }
                let mut buf = [0u8; 32];
                buf[..data.len()].copy_from_slice(data);
                Ok(EncodedSlot::fixed(buf.to_vec()))
            }
            None => Ok(EncodedSlot::variable(encode_bytes(data))),
        },
        (BaseKind::String, Token::String(s)) => Ok(EncodedSlot::variable(encode_bytes(s.as_bytes()))),
        (_, other) => Err(shape_error(other, ty)),
    }
}

/// Encode an array value against its array type (`T[n]` or `T[]`)
pub fn encode_array(values: &[Token], ty: &AbiType) -> Result<EncodedSlot, SdkError> {
    let element = ty.element();
    let elements = values
        .iter()
        .map(|value| encode_value(value, &element))
        .collect::<Result<Vec<_>, _>>()?;

    match ty.array {
        ArrayKind::Fixed(size) => {
            if values.len() != size {
                return Err(SdkError::AbiEncode(format!(
                    "{} expects {} elements, got {}",
                    ty,
                    size,
                    values.len()
                )));
            }
            let body = layout(elements);
            Ok(EncodedSlot {
                bytes: body,
                dynamic: element.is_dynamic(),
            })
        }
        ArrayKind::Dynamic => {
            let mut body = encode_usize(values.len());
            body.extend(layout(elements));
            Ok(EncodedSlot::variable(body))
        }
        ArrayKind::None => Err(SdkError::AbiEncode(format!("{} is not an array type", ty))),
    }
}

fn check_unsigned(value: &U256, ty: &AbiType) -> Result<(), SdkError> {
    let bits = ty.int_bits();
    if value.bits() > usize::from(bits) {
        return Err(SdkError::AbiEncode(format!("{} out of range for {}", value, ty)));
    }
    Ok(())
}

fn check_signed(value: &I256, ty: &AbiType) -> Result<(), SdkError> {
    if !value.fits(ty.int_bits()) {
        let sign = if value.is_negative() { "-" } else { "" };
        return Err(SdkError::AbiEncode(format!(
            "{}{} out of range for {}",
            sign,
            value.abs(),
            ty
        )));
    }
    Ok(())
}

fn shape_error(value: &Token, ty: &AbiType) -> SdkError {
    SdkError::AbiEncode(format!("cannot encode {} as {}", value.kind_name(), ty))
}

/// Encode a U256 as 32 bytes
pub(crate) fn encode_u256(value: &U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes.to_vec()
}

fn encode_usize(value: usize) -> Vec<u8> {
    encode_u256(&U256::from(value))
}

/// Length word followed by the payload padded to a 32-byte boundary
fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut result = encode_usize(data.len());
    let padded_len = data.len().div_ceil(32) * 32;
    let mut padded = vec![0u8; padded_len];
    padded[..data.len()].copy_from_slice(data);
    result.extend(padded);
    result
}
