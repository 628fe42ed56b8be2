//! Pack/unpack error types
//!
//! Every failure is local to the call that produced it; no partially built
//! buffer or value list is returned alongside an error.

use thiserror::Error;

/// Result type for voltage-pack operations
pub type Result<T> = std::result::Result<T, PackError>;

/// Pack/unpack errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PackError {
    /// Malformed directive string (bad count, stray modifier, ...)
    #[error("Format error at offset {position}: {message}")]
    Format { position: usize, message: String },

    /// Directive character not present in the directive table
    #[error("Unknown directive '{directive}'{}", at_offset(.position))]
    UnknownDirective {
        directive: char,
        position: Option<usize>,
    },

    /// Pack ran out of input values
    #[error("Too few arguments for '{directive}': needed {needed}, {available} remaining")]
    Argument {
        directive: char,
        needed: usize,
        available: usize,
    },

    /// Value kind does not match the directive
    #[error("Type mismatch for '{directive}': expected {expected}, got {actual}")]
    TypeMismatch {
        directive: char,
        expected: &'static str,
        actual: &'static str,
    },

    /// Value cannot be represented by the directive
    #[error("Encoding error for '{directive}': {message}")]
    Encoding { directive: char, message: String },

    /// Unpack ran out of bytes for a required read
    #[error("Truncated data for '{directive}': needed {needed} bytes, {available} available")]
    TruncatedData {
        directive: char,
        needed: usize,
        available: usize,
    },

    /// Bytes do not form a valid value for the directive
    #[error("Malformed data for '{directive}': {message}")]
    MalformedData { directive: char, message: String },
}

fn at_offset(position: &Option<usize>) -> String {
    match position {
        Some(position) => format!(" at offset {}", position),
        None => String::new(),
    }
}

// Helper methods for creating errors
impl PackError {
    pub fn format(position: usize, msg: impl Into<String>) -> Self {
        PackError::Format {
            position,
            message: msg.into(),
        }
    }

    pub fn unknown_directive(directive: char) -> Self {
        PackError::UnknownDirective {
            directive,
            position: None,
        }
    }

    pub fn encoding(directive: char, msg: impl Into<String>) -> Self {
        PackError::Encoding {
            directive,
            message: msg.into(),
        }
    }

    pub fn malformed(directive: char, msg: impl Into<String>) -> Self {
        PackError::MalformedData {
            directive,
            message: msg.into(),
        }
    }

    /// Attach the format-string offset to an `UnknownDirective` error
    pub fn at_position(self, position: usize) -> Self {
        match self {
            PackError::UnknownDirective { directive, .. } => PackError::UnknownDirective {
                directive,
                position: Some(position),
            },
            other => other,
        }
    }

    /// Check if the directive string itself is at fault
    ///
    /// These errors cannot succeed on retry until the format is fixed.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PackError::Format { .. } | PackError::UnknownDirective { .. }
        )
    }
}
