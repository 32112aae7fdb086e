//! Shared, immutable byte buffers with O(1) slicing.
//!
//! A [`ByteBuffer`] wraps [`bytes::Bytes`]. Cloning or slicing never copies
//! the bytes, which is what lets navigators and readers hand out zero-copy
//! views that outlive the borrow of the navigator itself.

use bytes::Bytes;
use std::fmt;
use std::ops::{Deref, Range};

/// An immutable view over a shared byte allocation.
///
/// # Examples
///
/// ```rust
/// use dual_json::ByteBuffer;
///
/// let buffer = ByteBuffer::from(b"hello world".to_vec());
/// let world = buffer.slice(6..11);
/// assert_eq!(&*world, b"world");
/// assert!(buffer.get(6..12).is_none());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuffer(Bytes);

impl ByteBuffer {
    #[must_use]
    pub fn new(bytes: Bytes) -> Self {
        ByteBuffer(bytes)
    }

    #[must_use]
    pub fn empty() -> Self {
        ByteBuffer(Bytes::new())
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a sub-view sharing the same allocation.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, like slice indexing. Use
    /// [`ByteBuffer::get`] for untrusted ranges.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Self {
        ByteBuffer(self.0.slice(range))
    }

    /// Like [`ByteBuffer::slice`] but returns `None` instead of panicking.
    #[must_use]
    pub fn get(&self, range: Range<usize>) -> Option<Self> {
        if range.start <= range.end && range.end <= self.len() {
            Some(self.slice(range))
        } else {
            None
        }
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// The underlying shared bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(value: Bytes) -> Self {
        ByteBuffer(value)
    }
}

impl From<ByteBuffer> for Bytes {
    fn from(value: ByteBuffer) -> Self {
        value.0
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(value: Vec<u8>) -> Self {
        ByteBuffer(Bytes::from(value))
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(value: &[u8]) -> Self {
        ByteBuffer(Bytes::copy_from_slice(value))
    }
}

impl From<&str> for ByteBuffer {
    fn from(value: &str) -> Self {
        ByteBuffer::from(value.as_bytes())
    }
}

impl From<String> for ByteBuffer {
    fn from(value: String) -> Self {
        ByteBuffer(Bytes::from(value))
    }
}

impl PartialEq<[u8]> for ByteBuffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteBuffer(")?;
        for byte in self.as_slice().iter().take(32) {
            write!(f, "{:02x}", byte)?;
        }
        if self.len() > 32 {
            write!(f, "..; {} bytes", self.len())?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_shares_allocation() {
        let buffer = ByteBuffer::from(vec![1, 2, 3, 4, 5]);
        let middle = buffer.slice(1..4);
        let inner = middle.slice(1..2);
        assert_eq!(&*middle, &[2, 3, 4]);
        assert_eq!(&*inner, &[3]);
        assert_eq!(inner.as_slice().as_ptr(), buffer[2..].as_ptr());
    }

    #[test]
    fn test_get_out_of_range() {
        let buffer = ByteBuffer::from(vec![1, 2, 3]);
        assert!(buffer.get(2..4).is_none());
        assert!(buffer.get(3..2).is_none());
        assert_eq!(buffer.get(3..3).map(|b| b.len()), Some(0));
    }

    #[test]
    #[should_panic]
    fn test_slice_out_of_range_panics() {
        let _ = ByteBuffer::from(vec![1, 2, 3]).slice(1..4);
    }

    #[test]
    fn test_equality_ignores_origin() {
        let a = ByteBuffer::from(b"xabc".to_vec()).slice(1..4);
        let b = ByteBuffer::from(Bytes::from_static(b"abc"));
        assert_eq!(a, b);
        assert_eq!(Bytes::from(a), Bytes::from_static(b"abc"));
    }
}
