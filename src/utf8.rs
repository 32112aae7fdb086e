//! Zero-copy UTF-8 views.
//!
//! [`Utf8Buffer`] is a [`ByteBuffer`] known to hold valid UTF-8. Readers and
//! navigators return it from their `try_get_buffered_string_value` fast paths:
//! the view points straight into the document, no allocation involved.

use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// An immutable, sliceable view over valid UTF-8 bytes.
///
/// # Examples
///
/// ```rust
/// use dual_json::Utf8Buffer;
///
/// let text = Utf8Buffer::from("hello world");
/// assert_eq!(text.slice(6, None).unwrap().as_str(), "world");
/// assert_eq!(text.slice(0, Some(5)).unwrap(), "hello");
/// ```
#[derive(Clone)]
pub struct Utf8Buffer {
    bytes: ByteBuffer,
}

impl Utf8Buffer {
    /// Validates and wraps a byte view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUtf8`] with the offset of the first invalid byte.
    pub fn new(bytes: ByteBuffer) -> Result<Self> {
        std::str::from_utf8(&bytes).map_err(|e| Error::InvalidUtf8 {
            offset: e.valid_up_to(),
        })?;
        Ok(Utf8Buffer { bytes })
    }

    /// Wraps bytes the caller has already validated.
    pub(crate) fn from_validated(bytes: ByteBuffer) -> Self {
        debug_assert!(std::str::from_utf8(&bytes).is_ok());
        Utf8Buffer { bytes }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Validated on construction; checked again here rather than reaching for unsafe.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn byte_buffer(&self) -> &ByteBuffer {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the sub-view starting at byte `start`, `length` bytes long (or to the end).
    ///
    /// # Errors
    ///
    /// Fails with [`Error::IndexOutOfBounds`] when the range exceeds the view and with
    /// [`Error::InvalidUtf8`] when a bound splits a character.
    pub fn slice(&self, start: usize, length: Option<usize>) -> Result<Self> {
        let end = match length {
            Some(length) => start.saturating_add(length),
            None => self.len(),
        };
        if start > end || end > self.len() {
            return Err(Error::IndexOutOfBounds {
                index: end,
                len: self.len(),
            });
        }
        let text = self.as_str();
        if !text.is_char_boundary(start) {
            return Err(Error::InvalidUtf8 { offset: start });
        }
        if !text.is_char_boundary(end) {
            return Err(Error::InvalidUtf8 { offset: end });
        }
        Ok(Utf8Buffer {
            bytes: self.bytes.slice(start..end),
        })
    }
}

impl Deref for Utf8Buffer {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Utf8Buffer {
    fn from(value: &str) -> Self {
        Utf8Buffer {
            bytes: ByteBuffer::from(value),
        }
    }
}

impl From<String> for Utf8Buffer {
    fn from(value: String) -> Self {
        Utf8Buffer {
            bytes: ByteBuffer::from(value),
        }
    }
}

impl PartialEq for Utf8Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Utf8Buffer {}

impl PartialEq<str> for Utf8Buffer {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Utf8Buffer {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for Utf8Buffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Utf8Buffer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Utf8Buffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Utf8Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Utf8Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = Utf8Buffer::new(ByteBuffer::from(vec![b'a', 0xff, b'b'])).unwrap_err();
        assert_eq!(err, Error::InvalidUtf8 { offset: 1 });
    }

    #[test]
    fn test_slice_on_char_boundaries() {
        let text = Utf8Buffer::from("héllo");
        assert_eq!(text.slice(0, Some(1)).unwrap(), "h");
        assert_eq!(text.slice(3, None).unwrap(), "llo");
        assert!(matches!(
            text.slice(2, Some(1)),
            Err(Error::InvalidUtf8 { offset: 2 })
        ));
        assert!(matches!(
            text.slice(4, Some(10)),
            Err(Error::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let mut words = vec![
            Utf8Buffer::from("b"),
            Utf8Buffer::from("a"),
            Utf8Buffer::from("ab"),
        ];
        words.sort();
        let sorted: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
        assert_eq!(sorted, ["a", "ab", "b"]);
    }
}
