//! Serialization format discriminator.
//!
//! Binary documents start with a reserved byte `>= 0x80`. No valid JSON text can
//! start with such a byte (JSON text starts with whitespace, a digit, `-`, `"`,
//! `[`, `{`, `t`, `f` or `n`), so the first byte alone tells the formats apart.
//! Text documents carry no prefix at all.

/// The encodings a buffer can be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SerializationFormat {
    /// Plain JSON text.
    Text = 0x00,
    /// The compact binary encoding.
    Binary = 0x80,
    /// Row-oriented schematized encoding. Recognized, never produced or read.
    HybridRow = 0x81,
}

impl SerializationFormat {
    /// The reserved leading byte for this format.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Looks up a format by its reserved leading byte.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(SerializationFormat::Text),
            0x80 => Some(SerializationFormat::Binary),
            0x81 => Some(SerializationFormat::HybridRow),
            _ => None,
        }
    }

    /// Determines the format of a complete buffer from its first byte.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::SerializationFormat;
    ///
    /// assert_eq!(SerializationFormat::detect(b"[1,2]"), SerializationFormat::Text);
    /// assert_eq!(SerializationFormat::detect(&[0x80, 0xD0]), SerializationFormat::Binary);
    /// ```
    #[must_use]
    pub fn detect(buffer: &[u8]) -> Self {
        match buffer.first() {
            Some(&0x80) => SerializationFormat::Binary,
            Some(&0x81) => SerializationFormat::HybridRow,
            _ => SerializationFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_reserved() {
        assert_eq!(SerializationFormat::Text.tag(), 0x00);
        assert!(SerializationFormat::Binary.tag() >= 0x80);
        assert!(SerializationFormat::HybridRow.tag() >= 0x80);
        for tag in [0x00, 0x80, 0x81] {
            assert_eq!(SerializationFormat::from_tag(tag).map(|f| f.tag()), Some(tag));
        }
        assert_eq!(SerializationFormat::from_tag(0x7b), None);
    }

    #[test]
    fn test_detect_json_leading_bytes() {
        for text in ["{}", "[]", "\"s\"", "-1", "0", "9", "true", "false", "null", " {}"] {
            assert_eq!(
                SerializationFormat::detect(text.as_bytes()),
                SerializationFormat::Text,
                "{text}"
            );
        }
        assert_eq!(SerializationFormat::detect(&[]), SerializationFormat::Text);
        assert_eq!(
            SerializationFormat::detect(&[0x81, 0x00]),
            SerializationFormat::HybridRow
        );
    }
}
