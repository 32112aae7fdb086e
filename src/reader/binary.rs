//! Binary reader.
//!
//! Walks the encoding header by header. Container headers are checked against
//! their parents' bounds as they are entered; payloads are only decoded when an
//! accessor asks for them.

use super::JsonReader;
use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::encoding::{self, marker, Header};
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::options::NavigatorOptions;
use crate::types::{NodeType, TokenType};
use crate::utf8::Utf8Buffer;
use uuid::Uuid;

#[derive(Debug)]
struct Frame {
    object: bool,
    /// Offset just past the container's payload.
    end: usize,
    /// Count stored in the header, if any.
    declared: Option<usize>,
    /// Completed items (or properties).
    seen: usize,
    expect_name: bool,
}

/// Reads the binary encoding token by token.
pub struct BinaryReader {
    data: ByteBuffer,
    pos: usize,
    /// Offset just past the value being read.
    end: usize,
    frames: Vec<Frame>,
    token: TokenType,
    /// Offset and header of the current scalar, string or name token.
    value: Option<(usize, Header)>,
    root_done: bool,
    finished: bool,
    max_depth: usize,
}

/// Checks the format byte of a binary document.
pub(crate) fn check_prefix(data: &[u8]) -> Result<()> {
    match data.first() {
        None => Err(Error::truncated(0, 1)),
        Some(&tag) if tag == SerializationFormat::Binary.tag() => Ok(()),
        Some(&tag) => match SerializationFormat::from_tag(tag) {
            Some(format) => Err(Error::UnsupportedFormat(format)),
            None => Err(Error::invalid_marker(0, tag)),
        },
    }
}

impl BinaryReader {
    /// Creates a reader over a complete binary document.
    ///
    /// # Errors
    ///
    /// When the buffer does not start with the binary format byte.
    pub fn new(buffer: impl Into<ByteBuffer>) -> Result<Self> {
        let data = buffer.into();
        check_prefix(&data)?;
        let end = data.len();
        Ok(BinaryReader::over(data, 1, end))
    }

    /// A reader over the single encoded value at `offset`.
    pub(crate) fn for_value(data: ByteBuffer, offset: usize) -> Result<Self> {
        let end = offset + encoding::value_len(&data, offset)?;
        Ok(BinaryReader::over(data, offset, end))
    }

    fn over(data: ByteBuffer, pos: usize, end: usize) -> Self {
        BinaryReader {
            data,
            pos,
            end,
            frames: Vec::new(),
            token: TokenType::NotStarted,
            value: None,
            root_done: false,
            finished: false,
            max_depth: NavigatorOptions::default().max_depth,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn limit(&self) -> usize {
        self.frames.last().map_or(self.end, |frame| frame.end)
    }

    fn value_done(&mut self) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.seen += 1;
                frame.expect_name = frame.object;
            }
            None => self.root_done = true,
        }
    }

    fn close_frame(&mut self) -> Result<()> {
        if let Some(frame) = self.frames.pop() {
            if frame.object && !frame.expect_name {
                return Err(Error::syntax(self.pos, "object ends after a field name"));
            }
            if frame.declared.map_or(false, |count| count != frame.seen) {
                return Err(Error::syntax(
                    self.pos,
                    &format!(
                        "container declares {} item(s) but holds {}",
                        frame.declared.unwrap_or_default(),
                        frame.seen
                    ),
                ));
            }
            self.token = if frame.object {
                TokenType::EndObject
            } else {
                TokenType::EndArray
            };
        }
        self.value = None;
        self.value_done();
        Ok(())
    }

    fn current(&self, expected: TokenType) -> Result<(usize, &Header)> {
        match &self.value {
            Some((offset, header)) if self.token == expected => Ok((*offset, header)),
            _ => Err(Error::type_mismatch(expected, self.token)),
        }
    }

    fn fixed<const N: usize>(&self, expected: TokenType, node_type: NodeType) -> Result<[u8; N]> {
        let (offset, header) = self.current(expected)?;
        encoding::read_fixed(&self.data, offset, header, node_type)
    }

    fn utf8_payload(&self, offset: usize, header: &Header) -> Result<Utf8Buffer> {
        Utf8Buffer::new(self.data.slice(encoding::payload_range(offset, header)))
            .map_err(|e| match e {
                Error::InvalidUtf8 { offset: at } => Error::InvalidUtf8 {
                    offset: offset + header.header_len + at,
                },
                other => other,
            })
    }

    fn string_like(&self) -> Option<(usize, &Header)> {
        match (&self.value, self.token) {
            (Some((offset, header)), TokenType::String | TokenType::FieldName) => {
                Some((*offset, header))
            }
            _ => None,
        }
    }
}

impl JsonReader for BinaryReader {
    fn serialization_format(&self) -> SerializationFormat {
        SerializationFormat::Binary
    }

    fn current_token_type(&self) -> TokenType {
        self.token
    }

    fn current_depth(&self) -> usize {
        self.frames.len()
    }

    fn read(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        let limit = self.limit();
        if let Some(frame) = self.frames.last() {
            if self.pos == frame.end {
                self.close_frame()?;
                return Ok(true);
            }
        } else if self.root_done {
            if self.pos != self.end {
                return Err(Error::syntax(self.pos, "trailing bytes after the root value"));
            }
            self.finished = true;
            return Ok(false);
        }
        if self.pos > limit {
            return Err(Error::syntax(limit, "value overruns its container"));
        }

        let offset = self.pos;
        let header = encoding::read_header(&self.data, offset)?;
        if offset + header.total_len() > limit {
            return Err(Error::truncated(offset, offset + header.total_len() - limit));
        }

        if let Some(frame) = self.frames.last_mut() {
            if frame.expect_name {
                if !marker::is_string(header.marker) {
                    return Err(Error::invalid_marker(offset, header.marker));
                }
                frame.expect_name = false;
                self.token = TokenType::FieldName;
                self.value = Some((offset, header));
                self.pos += header.total_len();
                return Ok(true);
            }
        }

        if header.node_type.is_container() {
            if self.frames.len() >= self.max_depth {
                return Err(Error::DepthLimitExceeded(self.max_depth));
            }
            let object = header.node_type == NodeType::Object;
            self.frames.push(Frame {
                object,
                end: offset + header.total_len(),
                declared: header.count,
                seen: 0,
                expect_name: object,
            });
            self.token = if object {
                TokenType::BeginObject
            } else {
                TokenType::BeginArray
            };
            self.value = None;
            self.pos += header.header_len;
            return Ok(true);
        }

        self.token = TokenType::from_node_type(header.node_type)
            .ok_or_else(|| Error::invalid_marker(offset, header.marker))?;
        self.value = Some((offset, header));
        self.pos += header.total_len();
        self.value_done();
        Ok(true)
    }

    fn number_value(&self) -> Result<Number64> {
        let (offset, header) = self.current(TokenType::Number)?;
        encoding::read_number64(&self.data, offset, header)
    }

    fn string_value(&self) -> Result<AnyString> {
        let (offset, header) = self
            .string_like()
            .ok_or_else(|| Error::type_mismatch(TokenType::String, self.token))?;
        Ok(AnyString::from_utf8(self.utf8_payload(offset, header)?))
    }

    fn field_name(&self) -> Result<AnyString> {
        let (offset, header) = self.current(TokenType::FieldName)?;
        Ok(AnyString::from_utf8(self.utf8_payload(offset, header)?))
    }

    fn int8_value(&self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.fixed(TokenType::Int8, NodeType::Int8)?))
    }

    fn int16_value(&self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.fixed(TokenType::Int16, NodeType::Int16)?))
    }

    fn int32_value(&self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.fixed(TokenType::Int32, NodeType::Int32)?))
    }

    fn int64_value(&self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.fixed(TokenType::Int64, NodeType::Int64)?))
    }

    fn uint32_value(&self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.fixed(TokenType::UInt32, NodeType::UInt32)?))
    }

    fn float32_value(&self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.fixed(TokenType::Float32, NodeType::Float32)?))
    }

    fn float64_value(&self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.fixed(TokenType::Float64, NodeType::Float64)?))
    }

    fn guid_value(&self) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.fixed(TokenType::Guid, NodeType::Guid)?))
    }

    fn binary_value(&self) -> Result<ByteBuffer> {
        let (offset, header) = self.current(TokenType::Binary)?;
        Ok(self.data.slice(encoding::payload_range(offset, header)))
    }

    fn try_get_buffered_string_value(&self) -> Option<Utf8Buffer> {
        let (offset, header) = self.string_like()?;
        self.utf8_payload(offset, header).ok()
    }

    fn try_get_buffered_binary_value(&self) -> Option<ByteBuffer> {
        self.binary_value().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a":1,"b":[true,null,"x"]}
    const SCENARIO: &[u8] = &[
        0x80, 0xED, 0x0C, 0x02, 0x81, b'a', 0x01, 0x81, b'b', 0xE5, 0x04, 0x03, 0xD2, 0xD0, 0x81,
        b'x',
    ];

    #[test]
    fn test_scenario_token_sequence() {
        use TokenType::*;
        let mut reader = BinaryReader::new(SCENARIO.to_vec()).unwrap();
        let mut tokens = Vec::new();
        while reader.read().unwrap() {
            tokens.push((reader.current_token_type(), reader.current_depth()));
        }
        assert_eq!(
            tokens,
            [
                (BeginObject, 1),
                (FieldName, 1),
                (Number, 1),
                (FieldName, 1),
                (BeginArray, 2),
                (True, 2),
                (Null, 2),
                (String, 2),
                (EndArray, 1),
                (EndObject, 0),
            ]
        );
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn test_accessors() {
        let mut reader = BinaryReader::new(SCENARIO.to_vec()).unwrap();
        reader.read().unwrap();
        reader.read().unwrap();
        assert_eq!(reader.field_name().unwrap(), "a");
        assert_eq!(reader.try_get_buffered_string_value().unwrap(), "a");
        reader.read().unwrap();
        assert_eq!(reader.number_value().unwrap(), Number64::Int(1));
        assert!(matches!(reader.int8_value(), Err(Error::TypeMismatch { .. })));
        assert!(matches!(reader.string_value(), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_extended_scalars() {
        let mut bytes = vec![0x80, 0xE5, 0x00, 0x03, 0xD8, 0x80, 0xDC, 1, 0, 0, 0, 0xDD, 2, 9, 8];
        bytes[2] = (bytes.len() - 4) as u8;
        let mut reader = BinaryReader::new(bytes).unwrap();
        reader.read().unwrap();
        reader.read().unwrap();
        assert_eq!(reader.current_token_type(), TokenType::Int8);
        assert_eq!(reader.int8_value().unwrap(), -128);
        reader.read().unwrap();
        assert_eq!(reader.uint32_value().unwrap(), 1);
        reader.read().unwrap();
        assert_eq!(reader.binary_value().unwrap(), [9u8, 8][..]);
        assert_eq!(reader.try_get_buffered_binary_value().unwrap().len(), 2);
    }

    #[test]
    fn test_prefix_checks() {
        assert!(matches!(
            BinaryReader::new(vec![0x81, 0xD0]),
            Err(Error::UnsupportedFormat(SerializationFormat::HybridRow))
        ));
        assert!(matches!(
            BinaryReader::new(Vec::new()),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_malformed_documents() {
        // Trailing byte after the root.
        let mut reader = BinaryReader::new(vec![0x80, 0xD0, 0xD0]).unwrap();
        assert!(reader.read().unwrap());
        assert!(matches!(reader.read(), Err(Error::Syntax { .. })));

        // Object name with a non-string marker.
        let mut reader = BinaryReader::new(vec![0x80, 0xE9, 0x01, 0x01]).unwrap();
        assert!(matches!(reader.read(), Err(Error::InvalidMarker { .. })));

        // Declared count does not match.
        let mut reader = BinaryReader::new(vec![0x80, 0xE5, 0x01, 0x02, 0xD0]).unwrap();
        reader.read().unwrap();
        reader.read().unwrap();
        assert!(matches!(reader.read(), Err(Error::Syntax { .. })));

        // Item runs past the container's length.
        let mut reader = BinaryReader::new(vec![0x80, 0xE2, 0x01, 0xC8, 0x05]).unwrap();
        assert!(reader.read().unwrap());
        assert!(matches!(reader.read(), Err(Error::Truncated { .. })));

        // Object ends right after a field name.
        let mut reader = BinaryReader::new(vec![0x80, 0xEA, 0x02, 0x81, b'k']).unwrap();
        reader.read().unwrap();
        reader.read().unwrap();
        assert!(matches!(reader.read(), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_invalid_utf8_reported_on_access() {
        let mut reader = BinaryReader::new(vec![0x80, 0x82, b'a', 0xFF]).unwrap();
        assert!(reader.read().unwrap());
        assert!(matches!(
            reader.string_value(),
            Err(Error::InvalidUtf8 { offset: 3 })
        ));
        assert!(reader.try_get_buffered_string_value().is_none());
    }
}
