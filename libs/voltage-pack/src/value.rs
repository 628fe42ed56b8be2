//! Values consumed by pack and produced by unpack

use std::fmt;

use bytes::Bytes;

/// One element of a pack input or unpack output sequence
///
/// Values are checked against each directive's expected kind at the point
/// of consumption; integers and byte strings are never coerced into each
/// other.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer wide enough for every fixed-width directive (`i64::MIN..=u64::MAX`)
    /// and BER values up to `i128::MAX`
    Integer(i128),
    /// IEEE 754 double; 4-byte float directives round through `f32`
    Float(f64),
    /// Raw byte string
    Bytes(Bytes),
}

impl Value {
    /// Kind name used in type mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view; integers are widened to `f64`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Integer(value as i128)
                }
            }
        )*
    };
}

impl_from_integer!(i8, u8, i16, u16, i32, u32, i64, u64, i128, isize, usize);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(-5i32), Value::Integer(-5));
        assert_eq!(Value::from(u64::MAX), Value::Integer(u64::MAX as i128));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(Value::from("abc"), Value::Bytes(Bytes::from_static(b"abc")));
        assert_eq!(
            Value::from(vec![0u8, 1]),
            Value::Bytes(Bytes::from_static(&[0, 1]))
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Float(7.0).as_integer(), None);
        assert_eq!(Value::Integer(7).as_float(), Some(7.0));
        assert_eq!(Value::from("x").as_float(), None);
        assert!(Value::from("x").as_bytes().is_some());
    }

    #[test]
    fn test_display_matches_join_style() {
        let values = [
            Value::from(1),
            Value::from(-100),
            Value::from(9.5),
            Value::from("abcdef"),
        ];
        let joined: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(joined.join(":"), "1:-100:9.5:abcdef");
    }
}
