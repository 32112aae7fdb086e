//! Strings that are either decoded text or raw UTF-8 from a document.
//!
//! Navigators and readers return [`AnyString`] so a string can stay a view into
//! the source buffer until someone actually needs it in another shape. Each
//! derived form (decoded text, JSON-escaped text) is computed at most once and
//! cached.

use crate::buffer::ByteBuffer;
use crate::error::Result;
use crate::escape;
use crate::utf8::Utf8Buffer;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

#[derive(Clone)]
enum Repr {
    Text(Arc<str>),
    /// Bytes as they appear in a document; `escaped` when they still contain
    /// JSON escape sequences.
    Utf8 { bytes: Utf8Buffer, escaped: bool },
}

/// A string held either as decoded text or as a UTF-8 span of a document.
///
/// # Examples
///
/// ```rust
/// use dual_json::AnyString;
///
/// let text = AnyString::from("say \"hi\"");
/// assert_eq!(text.as_str(), "say \"hi\"");
/// assert_eq!(text.escaped(), "say \\\"hi\\\"");
/// assert_eq!(text, AnyString::from(String::from("say \"hi\"")));
/// ```
#[derive(Clone)]
pub struct AnyString {
    repr: Repr,
    unescaped: OnceLock<Arc<str>>,
    escaped: OnceLock<Arc<str>>,
}

impl AnyString {
    fn with_repr(repr: Repr) -> Self {
        AnyString {
            repr,
            unescaped: OnceLock::new(),
            escaped: OnceLock::new(),
        }
    }

    /// Wraps UTF-8 bytes that are the literal value (no escape sequences).
    #[must_use]
    pub fn from_utf8(bytes: Utf8Buffer) -> Self {
        AnyString::with_repr(Repr::Utf8 {
            bytes,
            escaped: false,
        })
    }

    /// Wraps the body of a JSON string token, still containing escape sequences.
    ///
    /// The escapes are decoded once, here, so malformed input is reported
    /// immediately; the decoded text is cached.
    ///
    /// # Errors
    ///
    /// Returns a syntax error for an invalid escape sequence.
    pub fn from_escaped_utf8(bytes: Utf8Buffer) -> Result<Self> {
        let decoded = escape::unescape(bytes.as_bytes(), 0)?;
        let value = AnyString::with_repr(Repr::Utf8 {
            bytes,
            escaped: true,
        });
        let _ = value.unescaped.set(Arc::from(decoded));
        Ok(value)
    }

    #[inline]
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        matches!(self.repr, Repr::Utf8 { .. })
    }

    /// The decoded string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Text(text) => text,
            Repr::Utf8 {
                bytes,
                escaped: false,
            } => bytes.as_str(),
            Repr::Utf8 {
                bytes,
                escaped: true,
            } => self.unescaped.get_or_init(|| {
                Arc::from(escape::unescape(bytes.as_bytes(), 0).unwrap_or_default())
            }),
        }
    }

    /// The value as it appears between the quotes of a JSON string token.
    #[must_use]
    pub fn escaped(&self) -> &str {
        match &self.repr {
            Repr::Utf8 {
                bytes,
                escaped: true,
            } => bytes.as_str(),
            _ => {
                let plain = self.as_str();
                if !escape::needs_escape(plain) {
                    return plain;
                }
                self.escaped
                    .get_or_init(|| Arc::from(escape::escape(plain)))
            }
        }
    }

    /// The decoded value as UTF-8 bytes; zero-copy when the source needed no unescaping.
    #[must_use]
    pub fn to_utf8(&self) -> Utf8Buffer {
        match &self.repr {
            Repr::Utf8 {
                bytes,
                escaped: false,
            } => bytes.clone(),
            _ => Utf8Buffer::from_validated(ByteBuffer::from(self.as_str())),
        }
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.as_str().to_string()
    }
}

impl From<&str> for AnyString {
    fn from(value: &str) -> Self {
        AnyString::with_repr(Repr::Text(Arc::from(value)))
    }
}

impl From<String> for AnyString {
    fn from(value: String) -> Self {
        AnyString::with_repr(Repr::Text(Arc::from(value)))
    }
}

impl From<Utf8Buffer> for AnyString {
    fn from(value: Utf8Buffer) -> Self {
        AnyString::from_utf8(value)
    }
}

impl PartialEq for AnyString {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AnyString {}

impl PartialEq<str> for AnyString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for AnyString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for AnyString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnyString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for AnyString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for AnyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for AnyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaped_utf8_decodes_once() {
        let raw = Utf8Buffer::from(r#"a\tbé"#);
        let value = AnyString::from_escaped_utf8(raw).unwrap();
        assert!(value.is_utf8());
        assert_eq!(value.as_str(), "a\tbé");
        assert_eq!(value.escaped(), r#"a\tbé"#);
        assert_eq!(value.to_utf8(), "a\tbé");
    }

    #[test]
    fn test_invalid_escape_is_rejected() {
        assert!(AnyString::from_escaped_utf8(Utf8Buffer::from(r#"\q"#)).is_err());
    }

    #[test]
    fn test_plain_utf8_is_zero_copy() {
        let buffer = Utf8Buffer::from("plain");
        let value = AnyString::from(buffer.clone());
        assert_eq!(value.to_utf8().as_bytes().as_ptr(), buffer.as_bytes().as_ptr());
        assert_eq!(value.escaped(), "plain");
    }

    #[test]
    fn test_order_across_representations() {
        let text = AnyString::from("apple");
        let utf8 = AnyString::from(Utf8Buffer::from("banana"));
        let escaped = AnyString::from_escaped_utf8(Utf8Buffer::from(r#"apple"#)).unwrap();
        assert!(text < utf8);
        assert_eq!(text, escaped);
        assert_eq!(text.cmp(&escaped), Ordering::Equal);
    }
}
