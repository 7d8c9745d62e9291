//! Command-line argument values to ABI tokens and back

use serde_json::{json, Value};
use tessera_sdk::abi::{Token, I256};
use tessera_sdk::types::format_address;
use tessera_sdk::{Address, U256};

use crate::CliError;

/// Interpret one argument by its shape: `true`/`false`, a 20-byte `0x`
/// address, other `0x` hex as bytes, a decimal integer, a JSON list of
/// such values, or else a string. A surrounding `'` or `"` pair forces a
/// string.
pub fn parse_arg(raw: &str) -> Result<Token, CliError> {
    if let Some(quoted) = strip_quotes(raw) {
        return Ok(Token::String(quoted.to_string()));
    }
    if raw.starts_with('[') {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CliError::InvalidInput(format!("{}: {}", raw, e)))?;
        return json_to_token(&value);
    }
    match raw {
        "true" => return Ok(Token::Bool(true)),
        "false" => return Ok(Token::Bool(false)),
        _ => {}
    }

    if let Some(digits) = raw.strip_prefix("0x") {
        let bytes = hex::decode(digits)
            .map_err(|e| CliError::InvalidInput(format!("{}: {}", raw, e)))?;
        return Ok(if bytes.len() == 20 {
            Token::Address(Address::from_slice(&bytes))
        } else {
            Token::Bytes(bytes)
        });
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let abs = U256::from_dec_str(digits)
            .map_err(|e| CliError::InvalidInput(format!("{}: {:?}", raw, e)))?;
        return Ok(if negative {
            Token::Int(I256::new(abs, true))
        } else {
            Token::Uint(abs)
        });
    }

    Ok(Token::String(raw.to_string()))
}

/// Parse every argument in order
pub fn parse_args(raw: &[String]) -> Result<Vec<Token>, CliError> {
    raw.iter().map(|arg| parse_arg(arg)).collect()
}

fn json_to_token(value: &Value) -> Result<Token, CliError> {
    match value {
        Value::Array(items) => Ok(Token::Array(
            items.iter().map(json_to_token).collect::<Result<_, _>>()?,
        )),
        Value::Bool(b) => Ok(Token::Bool(*b)),
        Value::String(s) => parse_arg(s),
        Value::Number(n) if n.is_f64() => Err(CliError::InvalidInput(format!("not an integer: {}", n))),
        Value::Number(n) => parse_arg(&n.to_string()),
        other => Err(CliError::InvalidInput(format!("unsupported list element: {}", other))),
    }
}

fn strip_quotes(raw: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|q| {
        raw.strip_prefix(*q)
            .and_then(|rest| rest.strip_suffix(*q))
    })
}

/// JSON form of a decoded value; integers become decimal strings
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(a) => json!(format_address(a)),
        Token::Uint(v) => json!(v.to_string()),
        Token::Int(v) if v.is_negative() => json!(format!("-{}", v.abs())),
        Token::Int(v) => json!(v.abs().to_string()),
        Token::Bool(b) => json!(b),
        Token::FixedBytes(b) | Token::Bytes(b) => json!(format!("0x{}", hex::encode(b))),
        Token::String(s) => json!(s),
        Token::Array(items) => Value::Array(items.iter().map(token_to_json).collect()),
    }
}

/// Parse an RPC parameter as JSON, falling back to a plain string
pub fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_shape() {
        assert_eq!(parse_arg("true").unwrap(), Token::Bool(true));
        assert_eq!(parse_arg("42").unwrap(), Token::uint(42));
        assert_eq!(parse_arg("-7").unwrap(), Token::int(-7));
        assert_eq!(parse_arg("0x0102").unwrap(), Token::Bytes(vec![1, 2]));
        assert_eq!(parse_arg("hello").unwrap(), Token::string("hello"));
        assert_eq!(
            parse_arg("0x407d73d8a49eeb85d32cf465507dd71d507100c1").unwrap(),
            Token::Address(Address::from_slice(
                &hex::decode("407d73d8a49eeb85d32cf465507dd71d507100c1").unwrap()
            ))
        );
    }

    #[test]
    fn test_quotes_force_string() {
        assert_eq!(parse_arg("'42'").unwrap(), Token::string("42"));
        assert_eq!(parse_arg("\"true\"").unwrap(), Token::string("true"));
    }

    #[test]
    fn test_list_argument() {
        assert_eq!(
            parse_arg(r#"[1, -2, "abc", ["0x01"]]"#).unwrap(),
            Token::Array(vec![
                Token::uint(1),
                Token::int(-2),
                Token::string("abc"),
                Token::Array(vec![Token::Bytes(vec![1])]),
            ])
        );
        assert!(parse_arg("[1.5]").is_err());
        assert!(parse_arg("[1,").is_err());
    }

    #[test]
    fn test_large_integer() {
        let max = U256::MAX.to_string();
        assert_eq!(parse_arg(&max).unwrap(), Token::Uint(U256::MAX));
    }

    #[test]
    fn test_odd_hex_is_rejected() {
        assert!(matches!(parse_arg("0xabc"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_token_to_json() {
        let token = Token::Array(vec![Token::int(-3), Token::uint(5), Token::Bytes(vec![0xab])]);
        assert_eq!(token_to_json(&token), json!(["-3", "5", "0xab"]));
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("[1,2]"), json!([1, 2]));
        assert_eq!(parse_param("latest"), json!("latest"));
        assert_eq!(parse_param("\"0x10\""), json!("0x10"));
    }
}
