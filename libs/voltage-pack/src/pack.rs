//! Pack engine
//!
//! Walks a `Program` once, consuming values from the front of the input and
//! appending encoded bytes to a `BytesMut`. The buffer is only frozen and
//! returned when every operation succeeded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{fits_width, hex_nibble, int_range, narrow_f32, put_ber, put_float, put_int};
use crate::directive::{DigitOrder, DirectiveKind, RawStyle};
use crate::error::{PackError, Result};
use crate::format::{CountSpec, Operation, Program};
use crate::value::Value;

/// Input bytes per base64 line when no count is given
const BASE64_LINE_BYTES: usize = 45;

/// Pack `values` according to a parsed program
///
/// Values left over after the last operation are ignored.
pub fn pack_program(values: &[Value], program: &Program) -> Result<Bytes> {
    let mut packer = Packer::new(values);
    for op in program {
        packer.apply(op)?;
    }

    if packer.remaining() > 0 {
        trace!("Ignoring {} unconsumed values", packer.remaining());
    }
    debug!(
        "Packed {} values into {} bytes ({} operations)",
        packer.consumed,
        packer.buf.len(),
        program.len()
    );
    Ok(packer.buf.freeze())
}

struct Packer<'a> {
    values: &'a [Value],
    consumed: usize,
    buf: BytesMut,
}

impl<'a> Packer<'a> {
    fn new(values: &'a [Value]) -> Self {
        Self {
            values,
            consumed: 0,
            buf: BytesMut::new(),
        }
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.values.len() - self.consumed
    }

    /// Consume exactly `n` values
    fn take(&mut self, op: &Operation, n: usize) -> Result<&'a [Value]> {
        let available = self.remaining();
        if n > available {
            return Err(PackError::Argument {
                directive: op.directive,
                needed: n,
                available,
            });
        }
        let values: &'a [Value] = self.values;
        let taken = &values[self.consumed..self.consumed + n];
        self.consumed += n;
        Ok(taken)
    }

    /// Consume one byte-string value
    fn take_bytes(&mut self, op: &Operation) -> Result<&'a Bytes> {
        let value = &self.take(op, 1)?[0];
        value.as_bytes().ok_or(PackError::TypeMismatch {
            directive: op.directive,
            expected: "bytes",
            actual: value.kind_name(),
        })
    }

    fn apply(&mut self, op: &Operation) -> Result<()> {
        trace!("Pack {} at offset {}", op, self.buf.len());
        match op.descriptor().kind {
            DirectiveKind::Padding => {
                let n = match op.count {
                    CountSpec::Remaining => 0,
                    count => count.resolve(0),
                };
                self.buf.put_bytes(0, n);
            },
            DirectiveKind::Integer => {
                let n = op.count.resolve(self.remaining());
                let width = op.width();
                let values = self.take(op, n)?;
                self.buf.reserve(values.len() * width);
                for value in values {
                    let int = expect_integer(op, value)?;
                    if !fits_width(int, width) {
                        let (min, max) = int_range(width);
                        return Err(PackError::encoding(
                            op.directive,
                            format!("{} out of range [{}, {}]", int, min, max),
                        ));
                    }
                    put_int(&mut self.buf, int, width, op.order());
                }
            },
            DirectiveKind::Float => {
                let n = op.count.resolve(self.remaining());
                let width = op.width();
                let values = self.take(op, n)?;
                self.buf.reserve(values.len() * width);
                for value in values {
                    let float = value.as_float().ok_or(PackError::TypeMismatch {
                        directive: op.directive,
                        expected: "float",
                        actual: value.kind_name(),
                    })?;
                    if width == 4 && narrow_f32(float).is_none() {
                        return Err(PackError::encoding(
                            op.directive,
                            format!("{} out of single precision range", float),
                        ));
                    }
                    put_float(&mut self.buf, float, width, op.order());
                }
            },
            DirectiveKind::RawBytes(style) => {
                let data = self.take_bytes(op)?;
                self.put_raw(op.count, style, data);
            },
            DirectiveKind::HexString(order) => {
                let data = self.take_bytes(op)?;
                self.put_hex(op, order, data)?;
            },
            DirectiveKind::BitString(order) => {
                let data = self.take_bytes(op)?;
                self.put_bits(op, order, data)?;
            },
            DirectiveKind::Utf8Char => {
                let n = op.count.resolve(self.remaining());
                for value in self.take(op, n)? {
                    let code = expect_integer(op, value)?;
                    let ch = u32::try_from(code)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| {
                            PackError::encoding(
                                op.directive,
                                format!("invalid code point {}", code),
                            )
                        })?;
                    let mut utf8 = [0u8; 4];
                    self.buf.put_slice(ch.encode_utf8(&mut utf8).as_bytes());
                }
            },
            DirectiveKind::BerInteger => {
                let n = op.count.resolve(self.remaining());
                for value in self.take(op, n)? {
                    let int = expect_integer(op, value)?;
                    let unsigned = u128::try_from(int).map_err(|_| {
                        PackError::encoding(op.directive, "can't compress negative numbers")
                    })?;
                    put_ber(&mut self.buf, unsigned);
                }
            },
            DirectiveKind::Base64 => {
                let data = self.take_bytes(op)?;
                self.put_base64(op.count, data);
            },
        }
        Ok(())
    }

    /// `a` / `A` / `Z`: truncate or pad to the count
    fn put_raw(&mut self, count: CountSpec, style: RawStyle, data: &[u8]) {
        match count {
            CountSpec::Remaining => {
                self.buf.put_slice(data);
                if style == RawStyle::NullTerminated {
                    self.buf.put_u8(0);
                }
            },
            count => {
                let len = count.resolve(0);
                let copied = len.min(data.len());
                self.buf.put_slice(&data[..copied]);
                self.buf.put_bytes(style.pad_byte(), len - copied);
            },
        }
    }

    /// `H` / `h`: count is the number of nibbles; missing digits are zero
    fn put_hex(&mut self, op: &Operation, order: DigitOrder, digits: &[u8]) -> Result<()> {
        let nibbles = op.count.resolve(digits.len());
        let mut pending: Option<u8> = None;

        for i in 0..nibbles {
            let nibble = match digits.get(i) {
                Some(&digit) => hex_nibble(digit).ok_or_else(|| {
                    PackError::encoding(
                        op.directive,
                        format!("invalid hex digit {:?}", digit as char),
                    )
                })?,
                None => 0,
            };
            pending = match pending {
                None => Some(nibble),
                Some(first) => {
                    self.buf.put_u8(join_nibbles(first, nibble, order));
                    None
                },
            };
        }
        if let Some(first) = pending {
            self.buf.put_u8(join_nibbles(first, 0, order));
        }
        Ok(())
    }

    /// `B` / `b`: count is the number of bits; missing digits are zero
    fn put_bits(&mut self, op: &Operation, order: DigitOrder, digits: &[u8]) -> Result<()> {
        let bits = op.count.resolve(digits.len());
        let mut byte = 0u8;

        for i in 0..bits {
            let bit = match digits.get(i) {
                Some(b'0') | None => 0,
                Some(b'1') => 1,
                Some(&other) => {
                    return Err(PackError::encoding(
                        op.directive,
                        format!("invalid bit digit {:?}", other as char),
                    ))
                },
            };
            let shift = match order {
                DigitOrder::HighFirst => 7 - (i % 8),
                DigitOrder::LowFirst => i % 8,
            };
            byte |= bit << shift;
            if i % 8 == 7 {
                self.buf.put_u8(byte);
                byte = 0;
            }
        }
        if bits % 8 != 0 {
            self.buf.put_u8(byte);
        }
        Ok(())
    }

    /// `m0`: single unwrapped line; otherwise one line per `count` input bytes
    fn put_base64(&mut self, count: CountSpec, data: &[u8]) {
        let line_bytes = match count {
            CountSpec::Fixed(0) => {
                self.buf.put_slice(STANDARD.encode(data).as_bytes());
                return;
            },
            CountSpec::Fixed(n) if n > 2 => n / 3 * 3,
            _ => BASE64_LINE_BYTES,
        };

        for line in data.chunks(line_bytes) {
            self.buf.put_slice(STANDARD.encode(line).as_bytes());
            self.buf.put_u8(b'\n');
        }
    }
}

fn expect_integer(op: &Operation, value: &Value) -> Result<i128> {
    value.as_integer().ok_or(PackError::TypeMismatch {
        directive: op.directive,
        expected: "integer",
        actual: value.kind_name(),
    })
}

#[inline]
fn join_nibbles(first: u8, second: u8, order: DigitOrder) -> u8 {
    match order {
        DigitOrder::HighFirst => (first << 4) | second,
        DigitOrder::LowFirst => (second << 4) | first,
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn pack(values: &[Value], format: &str) -> Result<Bytes> {
        pack_program(values, &Program::parse(format).unwrap())
    }

    #[test]
    fn test_pack_network_order() {
        let packed = pack(&[0x1234.into(), 0x12345678.into()], "nN").unwrap();
        assert_eq!(&packed[..], &[0x12, 0x34, 0x12, 0x34, 0x56, 0x78]);

        let packed = pack(&[0x1234.into(), 0x12345678.into()], "vV").unwrap();
        assert_eq!(&packed[..], &[0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_pack_explicit_order_modifiers() {
        let packed = pack(&[1.into(), 1.into()], "s>s<").unwrap();
        assert_eq!(&packed[..], &[0x00, 0x01, 0x01, 0x00]);
    }

    #[test]
    fn test_pack_wraps_within_width() {
        let packed = pack(&[(-1).into(), 200.into()], "Cc").unwrap();
        assert_eq!(&packed[..], &[0xFF, 0xC8]);
    }

    #[test]
    fn test_pack_out_of_range() {
        let err = pack(&[256.into()], "C").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'C', .. }));

        let err = pack(&[(1i128 << 32).into()], "N").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'N', .. }));

        let err = pack(&[(i64::MIN as i128 - 1).into()], "q").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'q', .. }));
    }

    #[test]
    fn test_pack_argument_shortage() {
        let err = pack(&[1.into()], "C2").unwrap_err();
        assert_eq!(
            err,
            PackError::Argument {
                directive: 'C',
                needed: 2,
                available: 1
            }
        );

        let err = pack(&[1.into()], "N*N").unwrap_err();
        assert!(matches!(err, PackError::Argument { directive: 'N', .. }));
    }

    #[test]
    fn test_pack_type_mismatch() {
        let err = pack(&["abc".into()], "N").unwrap_err();
        assert_eq!(
            err,
            PackError::TypeMismatch {
                directive: 'N',
                expected: "integer",
                actual: "bytes"
            }
        );

        let err = pack(&[1.5.into()], "C").unwrap_err();
        assert!(matches!(err, PackError::TypeMismatch { actual: "float", .. }));

        let err = pack(&[7.into()], "a").unwrap_err();
        assert!(matches!(err, PackError::TypeMismatch { expected: "bytes", .. }));
    }

    #[test]
    fn test_pack_float_accepts_integer() {
        let packed = pack(&[1.into()], "g").unwrap();
        assert_eq!(&packed[..], &1.0f32.to_be_bytes());

        let packed = pack(&[0.5.into()], "E").unwrap();
        assert_eq!(&packed[..], &0.5f64.to_le_bytes());
    }

    #[test]
    fn test_pack_float_overflow() {
        let err = pack(&[1e300.into()], "f").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'f', .. }));
        assert!(pack(&[1e300.into()], "d").is_ok());
    }

    #[test]
    fn test_pack_padding() {
        let packed = pack(&[1.into(), 2.into()], "Cx3C").unwrap();
        assert_eq!(&packed[..], &[1, 0, 0, 0, 2]);
        assert!(pack(&[], "x*").unwrap().is_empty());
    }

    #[test]
    fn test_pack_raw_strings() {
        assert_eq!(&pack(&["abcdef".into()], "a6").unwrap()[..], b"abcdef");
        assert_eq!(&pack(&["abc".into()], "a6").unwrap()[..], b"abc\0\0\0");
        assert_eq!(&pack(&["abc".into()], "A6").unwrap()[..], b"abc   ");
        assert_eq!(&pack(&["abcdef".into()], "a3").unwrap()[..], b"abc");
        assert_eq!(&pack(&["abc".into()], "a").unwrap()[..], b"a");
        assert_eq!(&pack(&["abc".into()], "a*").unwrap()[..], b"abc");
        assert_eq!(&pack(&["abc".into()], "Z*").unwrap()[..], b"abc\0");
        assert_eq!(&pack(&["abc".into()], "Z5").unwrap()[..], b"abc\0\0");
    }

    #[test]
    fn test_pack_hex_strings() {
        assert_eq!(&pack(&["a1b2".into()], "H*").unwrap()[..], &[0xA1, 0xB2]);
        assert_eq!(&pack(&["a1b2".into()], "h*").unwrap()[..], &[0x1A, 0x2B]);
        assert_eq!(&pack(&["abc".into()], "H*").unwrap()[..], &[0xAB, 0xC0]);
        assert_eq!(&pack(&["f".into()], "H4").unwrap()[..], &[0xF0, 0x00]);

        let err = pack(&["zz".into()], "H2").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'H', .. }));
    }

    #[test]
    fn test_pack_bit_strings() {
        assert_eq!(&pack(&["10000001".into()], "B*").unwrap()[..], &[0x81]);
        assert_eq!(&pack(&["1100".into()], "B*").unwrap()[..], &[0xC0]);
        assert_eq!(&pack(&["1100".into()], "b*").unwrap()[..], &[0x03]);
        assert_eq!(
            &pack(&["111111111".into()], "B*").unwrap()[..],
            &[0xFF, 0x80]
        );

        let err = pack(&["102".into()], "B*").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'B', .. }));
    }

    #[test]
    fn test_pack_utf8_chars() {
        let packed = pack(&[0x41.into(), 0xE9.into(), 0x20AC.into()], "U*").unwrap();
        assert_eq!(&packed[..], "Aé€".as_bytes());

        let err = pack(&[0xD800.into()], "U").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'U', .. }));
        let err = pack(&[(-1).into()], "U").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'U', .. }));
    }

    #[test]
    fn test_pack_ber() {
        let packed = pack(&[1.into(), 300.into()], "w2").unwrap();
        assert_eq!(&packed[..], &[0x01, 0x82, 0x2C]);

        let err = pack(&[(-1).into()], "w").unwrap_err();
        assert!(matches!(err, PackError::Encoding { directive: 'w', .. }));
    }

    #[test]
    fn test_pack_base64() {
        assert_eq!(&pack(&["hello".into()], "m0").unwrap()[..], b"aGVsbG8=");
        assert_eq!(&pack(&["hello".into()], "m").unwrap()[..], b"aGVsbG8=\n");
        assert_eq!(
            &pack(&["abcdef".into()], "m3").unwrap()[..],
            b"YWJj\nZGVm\n"
        );
        assert!(pack(&["".into()], "m").unwrap().is_empty());

        let long = "x".repeat(46);
        let packed = pack(&[long.into()], "m").unwrap();
        let lines: Vec<&[u8]> = packed.split(|&b| b == b'\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 60);
    }

    #[test]
    #[traced_test]
    fn test_pack_logs_summary() {
        pack(&[1.into(), 2.into()], "n*").unwrap();
        assert!(logs_contain("Packed 2 values into 4 bytes"));
    }

    #[test]
    fn test_pack_ignores_extra_values() {
        let packed = pack(&[1.into(), 2.into(), 3.into()], "C").unwrap();
        assert_eq!(&packed[..], &[1]);
    }
}
