//! Conversion between command-line text, JSON and `Value`
//!
//! | Input | Value |
//! |-------|-------|
//! | `42`, `-7`, `0x1F` | Integer |
//! | `3.5`, `-1e9` | Float |
//! | `str:<text>` | Bytes (text, never parsed as a number) |
//! | `hex:<digits>` | Bytes (decoded hex) |
//! | anything else | Bytes (UTF-8 text) |

use serde_json::json;
use voltage_pack::Value;

use crate::config::OutputFormat;
use crate::error::{Result, VpackError};

/// Parse one command-line argument into a value
pub fn parse_value(input: &str) -> Result<Value> {
    if let Some(text) = input.strip_prefix("str:") {
        return Ok(Value::from(text));
    }
    if let Some(digits) = input.strip_prefix("hex:") {
        return hex::decode(digits)
            .map(Value::from)
            .map_err(|e| VpackError::invalid_value(input, e.to_string()));
    }

    if let Some(int) = parse_integer(input) {
        return Ok(Value::Integer(int));
    }
    if looks_numeric(input) {
        if let Ok(float) = input.parse::<f64>() {
            return Ok(Value::Float(float));
        }
    }

    Ok(Value::from(input))
}

/// Decimal or `0x`-prefixed hex integer, optionally signed
fn parse_integer(input: &str) -> Option<i128> {
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex_digits) if all_digits(hex_digits, |b| b.is_ascii_hexdigit()) => {
            i128::from_str_radix(hex_digits, 16).ok()?
        },
        Some(_) => return None,
        None if all_digits(body, |b| b.is_ascii_digit()) => body.parse().ok()?,
        None => return None,
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn all_digits(text: &str, is_digit: impl Fn(u8) -> bool) -> bool {
    !text.is_empty() && text.bytes().all(is_digit)
}

/// Words like `inf` or `nan` stay text
fn looks_numeric(input: &str) -> bool {
    let body = input.trim_start_matches(['-', '+']);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// JSON form of an unpacked value
///
/// Integers outside the 64-bit range become decimal strings, non-finite
/// floats become strings, and non-UTF-8 bytes become `{"hex": "..."}`.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(int) => {
            if let Ok(small) = i64::try_from(*int) {
                json!(small)
            } else if let Ok(unsigned) = u64::try_from(*int) {
                json!(unsigned)
            } else {
                json!(int.to_string())
            }
        },
        Value::Float(float) => {
            if float.is_finite() {
                json!(float)
            } else {
                json!(float.to_string())
            }
        },
        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => json!(text),
            Err(_) => json!({ "hex": hex::encode(bytes) }),
        },
    }
}

/// Render packed bytes for stdout
pub fn render_packed(packed: &[u8], output: OutputFormat) -> Vec<u8> {
    match output {
        OutputFormat::Hex => {
            let mut text = hex::encode(packed).into_bytes();
            text.push(b'\n');
            text
        },
        OutputFormat::Raw => packed.to_vec(),
        OutputFormat::Json => {
            let mut text = json!(packed).to_string().into_bytes();
            text.push(b'\n');
            text
        },
    }
}

/// Decode a `--hex` argument, ignoring whitespace between digits
pub fn decode_hex_input(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(&digits).map_err(|e| VpackError::invalid_value(input, e.to_string()))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse_value("42").unwrap(), Value::Integer(42));
        assert_eq!(parse_value("-1073741825").unwrap(), Value::Integer(-1073741825));
        assert_eq!(parse_value("+7").unwrap(), Value::Integer(7));
        assert_eq!(parse_value("0xFF").unwrap(), Value::Integer(255));
        assert_eq!(parse_value("-0x10").unwrap(), Value::Integer(-16));
        assert_eq!(
            parse_value("18446744073709551615").unwrap(),
            Value::Integer(u64::MAX as i128)
        );
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse_value("9.87654321098").unwrap(), Value::Float(9.87654321098));
        assert_eq!(parse_value("-1e9").unwrap(), Value::Float(-1e9));
        assert_eq!(parse_value(".5").unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_parse_text_and_prefixes() {
        assert_eq!(parse_value("abcdef").unwrap(), Value::from("abcdef"));
        assert_eq!(parse_value("nan").unwrap(), Value::from("nan"));
        assert_eq!(parse_value("str:123").unwrap(), Value::from("123"));
        assert_eq!(parse_value("str:").unwrap(), Value::from(""));
        assert_eq!(parse_value("hex:00ff").unwrap(), Value::from(vec![0x00u8, 0xFF]));
        assert!(matches!(
            parse_value("hex:0g"),
            Err(VpackError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(&Value::Integer(-100)), json!(-100));
        assert_eq!(to_json(&Value::Integer(u64::MAX as i128)), json!(u64::MAX));
        assert_eq!(to_json(&Value::Integer(1 << 100)), json!((1i128 << 100).to_string()));
        assert_eq!(to_json(&Value::Float(0.5)), json!(0.5));
        assert_eq!(to_json(&Value::Float(f64::INFINITY)), json!("inf"));
        assert_eq!(to_json(&Value::from("abc")), json!("abc"));
        assert_eq!(to_json(&Value::from(vec![0xFFu8, 0x00])), json!({ "hex": "ff00" }));
    }

    #[test]
    fn test_render_packed() {
        let packed: [u8; 4] = [0x00, 0x00, 0x00, 0x01];
        assert_eq!(render_packed(&packed, OutputFormat::Hex), b"00000001\n");
        assert_eq!(render_packed(&packed, OutputFormat::Raw), packed.to_vec());
        assert_eq!(render_packed(&packed, OutputFormat::Json), b"[0,0,0,1]\n");
    }

    #[test]
    fn test_decode_hex_input() {
        assert_eq!(decode_hex_input("0001 ff\n").unwrap(), vec![0x00, 0x01, 0xFF]);
        assert!(decode_hex_input("abc").is_err());
    }
}
