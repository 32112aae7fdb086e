//! Error types for reading, writing and navigating documents.
//!
//! Every fallible operation in this crate returns [`Result`], whose error type
//! is the single [`Error`] enum below.
//!
//! ## Error Categories
//!
//! - **Malformed input**: [`Error::Syntax`], [`Error::Truncated`], [`Error::InvalidMarker`],
//!   [`Error::InvalidUtf8`]. The reader or navigator that produced one of these must be
//!   discarded; there is no resynchronization.
//! - **Type mismatches**: [`Error::TypeMismatch`] when an accessor does not match the
//!   kind of the current token or node. Values are never coerced between kinds.
//! - **Grammar violations**: [`Error::Grammar`] and [`Error::UnbalancedDocument`] on the
//!   writer side, raised before any byte of the offending call is committed.
//!
//! Absence (a missing property, a string that needs unescaping) is not an error:
//! the `try_*` operations return `Option`.
//!
//! ## Examples
//!
//! ```rust
//! use dual_json::{create_navigator, Error};
//!
//! let result = create_navigator(b"{\"a\": [1, 2".to_vec());
//! assert!(matches!(result, Err(Error::Syntax { .. })));
//! ```

use crate::format::SerializationFormat;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed JSON text.
    #[error("Syntax error at offset {offset}: {msg}")]
    Syntax { offset: usize, msg: String },

    /// A binary value runs past the end of the buffer.
    #[error("Truncated input at offset {offset}: {needed} more byte(s) required")]
    Truncated { offset: usize, needed: usize },

    /// A binary type marker that is not part of the encoding.
    #[error("Invalid type marker {marker:#04x} at offset {offset}")]
    InvalidMarker { offset: usize, marker: u8 },

    /// String payload is not valid UTF-8.
    #[error("Invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// The buffer announces a format this crate does not implement.
    #[error("Unsupported serialization format: {0:?}")]
    UnsupportedFormat(SerializationFormat),

    /// An accessor was used on a token or node of another kind.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Array index beyond the item count.
    #[error("Index {index} out of bounds (length={len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Writer call sequence violation.
    #[error("Writer grammar violation: {0}")]
    Grammar(String),

    /// The writer result was requested while the document is incomplete.
    #[error("Unbalanced document: {0}")]
    UnbalancedDocument(String),

    /// NaN or infinity where the target format cannot represent it.
    #[error("Cannot encode non-finite number {0}")]
    NonFiniteNumber(f64),

    /// A node handle was passed to a navigator that did not produce it.
    #[error("Node handle belongs to a different navigator")]
    ForeignNode,

    /// Nesting deeper than the configured limit.
    #[error("Nesting depth limit of {0} exceeded")]
    DepthLimitExceeded(usize),

    /// A `$t`/`$v` envelope whose value does not fit its declared type.
    #[error("Invalid typed envelope: {0}")]
    InvalidEnvelope(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error at a byte offset of the text input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::Error;
    ///
    /// let err = Error::syntax(10, "unexpected token");
    /// assert!(err.to_string().contains("offset 10"));
    /// ```
    pub fn syntax(offset: usize, msg: &str) -> Self {
        Error::Syntax {
            offset,
            msg: msg.to_string(),
        }
    }

    pub fn truncated(offset: usize, needed: usize) -> Self {
        Error::Truncated { offset, needed }
    }

    pub fn invalid_marker(offset: usize, marker: u8) -> Self {
        Error::InvalidMarker { offset, marker }
    }

    /// Creates a type mismatch error from the expected and the actual node kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::{Error, NodeType};
    ///
    /// let err = Error::type_mismatch(NodeType::Int32, NodeType::String);
    /// assert!(err.to_string().contains("expected Int32"));
    /// ```
    pub fn type_mismatch(expected: impl fmt::Debug, found: impl fmt::Debug) -> Self {
        Error::TypeMismatch {
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        }
    }

    pub(crate) fn node_mismatch(expected: &str, found: impl fmt::Debug) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: format!("{:?}", found),
        }
    }

    pub fn grammar(msg: &str) -> Self {
        Error::Grammar(msg.to_string())
    }

    pub fn unbalanced(msg: &str) -> Self {
        Error::UnbalancedDocument(msg.to_string())
    }

    pub fn invalid_envelope<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidEnvelope(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for errors caused by malformed input bytes.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::Syntax { .. }
                | Error::Truncated { .. }
                | Error::InvalidMarker { .. }
                | Error::InvalidUtf8 { .. }
                | Error::UnsupportedFormat(_)
        )
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeType;

    #[test]
    fn test_malformed_input_classification() {
        assert!(Error::syntax(0, "x").is_malformed_input());
        assert!(Error::truncated(3, 2).is_malformed_input());
        assert!(Error::invalid_marker(1, 0x70).is_malformed_input());
        assert!(!Error::grammar("x").is_malformed_input());
        assert!(!Error::ForeignNode.is_malformed_input());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::invalid_marker(4, 0x7f).to_string(),
            "Invalid type marker 0x7f at offset 4"
        );
        assert_eq!(
            Error::IndexOutOfBounds { index: 3, len: 2 }.to_string(),
            "Index 3 out of bounds (length=2)"
        );
        assert_eq!(
            Error::type_mismatch(NodeType::Guid, NodeType::Null).to_string(),
            "Type mismatch: expected Guid, found Null"
        );
    }
}
