//! Format string parser
//!
//! Turns a directive string such as `"c2x5CCxsdils_l_a6"` into a `Program`:
//! an ordered list of operations, each a directive descriptor plus a count
//! and modifiers.
//!
//! Grammar (whitespace between tokens is ignored, `#` comments run to end of
//! line):
//!
//! ```text
//! token     := directive modifier* count?
//! modifier  := '_' | '!' | '<' | '>'
//! count     := digit+ | '*'
//! ```
//!
//! Counts are kept abstract (`CountSpec`) and resolved by the engines against
//! the live number of remaining values or bytes.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::codec::ByteOrder;
use crate::directive::{self, DirectiveDescriptor};
use crate::error::{PackError, Result};

/// Largest accepted explicit count
pub const MAX_COUNT: usize = i32::MAX as usize;

/// Repeat count of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSpec {
    /// Explicit decimal count
    Fixed(usize),
    /// `*`: everything left at execution time
    Remaining,
    /// No count given; behaves as `Fixed(1)`
    Implicit,
}

impl CountSpec {
    /// Resolve against the number of units still available
    pub fn resolve(self, remaining: usize) -> usize {
        match self {
            CountSpec::Fixed(n) => n,
            CountSpec::Implicit => 1,
            CountSpec::Remaining => remaining,
        }
    }

    pub fn is_remaining(self) -> bool {
        self == CountSpec::Remaining
    }
}

/// Per-token modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// `_` / `!`: use the platform C type width
    pub native_width: bool,
    /// `<` / `>`: override the directive's byte order
    pub order: Option<ByteOrder>,
}

/// One parsed directive token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub directive: char,
    pub count: CountSpec,
    pub modifiers: Modifiers,
    descriptor: &'static DirectiveDescriptor,
}

impl Operation {
    pub fn descriptor(&self) -> &'static DirectiveDescriptor {
        self.descriptor
    }

    /// Element width in bytes after applying the native-width modifier
    pub fn width(&self) -> usize {
        match (self.modifiers.native_width, self.descriptor.native_width) {
            (true, Some(native)) => native,
            _ => self.descriptor.width,
        }
    }

    /// Byte order after applying an explicit-order modifier
    pub fn order(&self) -> ByteOrder {
        self.modifiers.order.unwrap_or(self.descriptor.order)
    }

    pub fn signed(&self) -> bool {
        self.descriptor.signed
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.directive)?;
        if self.modifiers.native_width {
            write!(f, "_")?;
        }
        match self.modifiers.order {
            Some(ByteOrder::BigEndian) => write!(f, ">")?,
            Some(ByteOrder::LittleEndian) => write!(f, "<")?,
            _ => {},
        }
        match self.count {
            CountSpec::Fixed(n) => write!(f, "{}", n),
            CountSpec::Remaining => write!(f, "*"),
            CountSpec::Implicit => Ok(()),
        }
    }
}

/// Parsed directive string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    operations: Vec<Operation>,
}

impl Program {
    /// Parse a directive string
    ///
    /// Every character must be consumed by a token, whitespace or a comment.
    pub fn parse(format: &str) -> Result<Self> {
        let mut operations = Vec::new();
        let mut chars = format.char_indices().peekable();

        while let Some((position, ch)) = chars.next() {
            if ch.is_ascii_whitespace() {
                continue;
            }

            if ch == '#' {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if ch == '*' || ch.is_ascii_digit() || is_modifier(ch) {
                return Err(PackError::format(
                    position,
                    format!("'{}' must follow a directive", ch),
                ));
            }

            let descriptor = directive::lookup(ch).map_err(|e| e.at_position(position))?;

            // Modifiers
            let mut modifiers = Modifiers::default();
            while let Some(&(mod_position, m)) = chars.peek() {
                if !is_modifier(m) {
                    break;
                }
                if m == '_' || m == '!' {
                    if !descriptor.accepts_native_width() {
                        return Err(PackError::format(
                            mod_position,
                            format!("'{}' allowed only after types sSiIlLqQjJ", m),
                        ));
                    }
                    modifiers.native_width = true;
                } else {
                    if !descriptor.accepts_explicit_order() {
                        return Err(PackError::format(
                            mod_position,
                            format!("'{}' allowed only after types sSiIlLqQjJ", m),
                        ));
                    }
                    let order = ByteOrder::from_modifier(m);
                    if modifiers.order.is_some() && modifiers.order != order {
                        return Err(PackError::format(
                            mod_position,
                            "can't use both '<' and '>'",
                        ));
                    }
                    modifiers.order = order;
                }
                chars.next();
            }

            // Count
            let count = match chars.peek() {
                Some(&(_, '*')) => {
                    chars.next();
                    CountSpec::Remaining
                },
                Some(&(count_position, d)) if d.is_ascii_digit() => {
                    let mut n: usize = 0;
                    while let Some(&(_, d)) = chars.peek() {
                        let Some(digit) = d.to_digit(10) else {
                            break;
                        };
                        n = n
                            .checked_mul(10)
                            .and_then(|n| n.checked_add(digit as usize))
                            .filter(|n| *n <= MAX_COUNT)
                            .ok_or_else(|| {
                                PackError::format(count_position, "count too large")
                            })?;
                        chars.next();
                    }
                    CountSpec::Fixed(n)
                },
                _ => CountSpec::Implicit,
            };

            operations.push(Operation {
                directive: ch,
                count,
                modifiers,
                descriptor,
            });
        }

        let program = Self { operations };
        trace!("Parsed format {:?} into [{}]", format, program);
        Ok(program)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl FromStr for Program {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Canonical directive string (modifiers normalized to `_`, `<`, `>`)
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.operations {
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

#[inline]
fn is_modifier(ch: char) -> bool {
    matches!(ch, '_' | '!' | '<' | '>')
}
