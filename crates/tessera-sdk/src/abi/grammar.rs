//! Type descriptor grammar
//!
//! ```text
//! type  ::= base width? array?
//! base  ::= "u"? ("fixed" | "int") | "bool" | "address" | "bytes" | "string"
//! width ::= digits | digits "x" digits      (MxN only after fixed/ufixed)
//! array ::= "[" digits? "]"
//! ```

use super::types::{AbiType, ArrayKind, BaseKind};
use crate::SdkError;

/// Longest fractional part a fixed-point type may declare
const MAX_FRACTION_DIGITS: u8 = 80;

// Longer keywords first so "uint" is not read as "int" + garbage.
const KEYWORDS: [(&str, BaseKind); 8] = [
    ("ufixed", BaseKind::UFixed),
    ("fixed", BaseKind::Fixed),
    ("uint", BaseKind::UInt),
    ("int", BaseKind::Int),
    ("bool", BaseKind::Bool),
    ("address", BaseKind::Address),
    ("bytes", BaseKind::Bytes),
    ("string", BaseKind::String),
];

/// Parse a type string (e.g., "uint256", "bytes32[]", "fixed128x18")
pub fn parse_type(input: &str) -> Result<AbiType, SdkError> {
    let invalid = |reason: &str| SdkError::InvalidTypeSyntax(format!("{}: {}", input, reason));

    let (body, array) = split_array(input).ok_or_else(|| invalid("malformed array suffix"))?;

    let (kind, width) = KEYWORDS
        .iter()
        .find_map(|(keyword, kind)| body.strip_prefix(keyword).map(|rest| (*kind, rest)))
        .ok_or_else(|| invalid("unknown base type"))?;

    let mut ty = AbiType::scalar(kind).array_of(array);
    if width.is_empty() {
        return Ok(ty);
    }

    match kind {
        BaseKind::Int | BaseKind::UInt => {
            let bits = parse_digits(width).ok_or_else(|| invalid("bad bit width"))?;
            check_bits(bits).ok_or_else(|| invalid("bit width must be a multiple of 8 in 8..=256"))?;
            ty.bits = Some(bits);
        }
        BaseKind::Fixed | BaseKind::UFixed => {
            let (m, n) = width
                .split_once('x')
                .ok_or_else(|| invalid("fixed-point width must be MxN"))?;
            let bits = parse_digits(m).ok_or_else(|| invalid("bad bit width"))?;
            check_bits(bits).ok_or_else(|| invalid("bit width must be a multiple of 8 in 8..=256"))?;
            let fraction = parse_digits(n)
                .and_then(|n| u8::try_from(n).ok())
                .filter(|n| *n <= MAX_FRACTION_DIGITS)
                .ok_or_else(|| invalid("fractional digits must be in 0..=80"))?;
            ty.bits = Some(bits);
            ty.fraction = Some(fraction);
        }
        BaseKind::Bytes => {
            let len = parse_digits(width)
                .filter(|len| (1..=32).contains(len))
                .ok_or_else(|| invalid("bytes<M> requires 1 <= M <= 32"))?;
            ty.bits = Some(len * 8);
        }
        BaseKind::Bool | BaseKind::Address | BaseKind::String => {
            return Err(invalid("type takes no width"));
        }
    }

    Ok(ty)
}

/// Split `T[n]` / `T[]` into the element body and the array kind.
fn split_array(input: &str) -> Option<(&str, ArrayKind)> {
    let Some(open) = input.find('[') else {
        return (!input.contains(']')).then_some((input, ArrayKind::None));
    };
    let body = &input[..open];
    let size = input[open + 1..].strip_suffix(']')?;
    if size.is_empty() {
        return Some((body, ArrayKind::Dynamic));
    }
    if !size.bytes().all(|b| b.is_ascii_digit()) || size.starts_with('0') {
        return None;
    }
    let size: usize = size.parse().ok()?;
    (size > 0).then_some((body, ArrayKind::Fixed(size)))
}

/// One to three ASCII digits, no leading zero
fn parse_digits(s: &str) -> Option<u16> {
    if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

fn check_bits(bits: u16) -> Option<()> {
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(())
}
