//! JSON text reader.
//!
//! A hand-written tokenizer over a shared buffer. Strings are validated while
//! scanning (escape syntax, surrogate pairing, control characters, UTF-8) but
//! not decoded; decoding happens when a string accessor is called, and not at
//! all when the caller takes the buffered fast path.

use super::JsonReader;
use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::escape;
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::options::NavigatorOptions;
use crate::types::TokenType;
use crate::utf8::Utf8Buffer;
use std::ops::Range;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Array,
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Before the root value.
    Root,
    /// Just after `[`.
    ValueOrEnd,
    /// Just after `{`.
    NameOrEnd,
    /// After `,` in an array or `:` in an object.
    Value,
    /// After a value inside a container.
    CommaOrEnd,
    /// After the root value; only whitespace may follow.
    Trailing,
    Finished,
}

/// Reads JSON text token by token.
pub struct TextReader {
    data: ByteBuffer,
    pos: usize,
    stack: Vec<Frame>,
    state: State,
    token: TokenType,
    /// String tokens: the body between the quotes. Other tokens: their text.
    span: Range<usize>,
    escaped: bool,
    number: Number64,
    max_depth: usize,
}

impl TextReader {
    pub fn new(buffer: impl Into<ByteBuffer>) -> Self {
        TextReader::with_max_depth(buffer, NavigatorOptions::default().max_depth)
    }

    pub fn with_max_depth(buffer: impl Into<ByteBuffer>, max_depth: usize) -> Self {
        TextReader {
            data: buffer.into(),
            pos: 0,
            stack: Vec::new(),
            state: State::Root,
            token: TokenType::NotStarted,
            span: 0..0,
            escaped: false,
            number: Number64::Int(0),
            max_depth,
        }
    }

    /// Byte range of the current token; the body for strings and field names.
    pub(crate) fn token_span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Whether the current string token contains escape sequences.
    pub(crate) fn token_escaped(&self) -> bool {
        self.escaped
    }

    fn peek(&self) -> Option<u8> {
        self.data.as_slice().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.data.as_slice();
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = bytes.get(self.pos) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, what: &str) -> Error {
        match self.peek() {
            Some(byte) => Error::syntax(
                self.pos,
                &format!("unexpected character {:?}, expected {}", byte as char, what),
            ),
            None => Error::syntax(self.pos, &format!("unexpected end of input, expected {}", what)),
        }
    }

    fn after_value(&mut self) {
        self.state = if self.stack.is_empty() {
            State::Trailing
        } else {
            State::CommaOrEnd
        };
    }

    fn begin(&mut self, frame: Frame) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::DepthLimitExceeded(self.max_depth));
        }
        self.stack.push(frame);
        self.span = self.pos..self.pos + 1;
        self.pos += 1;
        match frame {
            Frame::Array => {
                self.token = TokenType::BeginArray;
                self.state = State::ValueOrEnd;
            }
            Frame::Object => {
                self.token = TokenType::BeginObject;
                self.state = State::NameOrEnd;
            }
        }
        Ok(())
    }

    fn end(&mut self) {
        let frame = self.stack.pop();
        self.token = match frame {
            Some(Frame::Object) => TokenType::EndObject,
            _ => TokenType::EndArray,
        };
        self.span = self.pos..self.pos + 1;
        self.pos += 1;
        self.after_value();
    }

    fn value(&mut self) -> Result<()> {
        let start = self.pos;
        match self.peek() {
            Some(b'{') => return self.begin(Frame::Object),
            Some(b'[') => return self.begin(Frame::Array),
            Some(b'"') => {
                self.scan_string()?;
                self.token = TokenType::String;
            }
            Some(b't') => self.literal(b"true", TokenType::True)?,
            Some(b'f') => self.literal(b"false", TokenType::False)?,
            Some(b'n') => self.literal(b"null", TokenType::Null)?,
            Some(b'-' | b'0'..=b'9') => {
                let end = scan_number(self.data.as_slice(), start)?;
                self.number = parse_number(&self.data[start..end], start)?;
                self.span = start..end;
                self.pos = end;
                self.token = TokenType::Number;
            }
            _ => return Err(self.unexpected("a value")),
        }
        self.after_value();
        Ok(())
    }

    fn name(&mut self) -> Result<()> {
        if self.peek() != Some(b'"') {
            return Err(self.unexpected("a field name"));
        }
        self.scan_string()?;
        self.skip_whitespace();
        if self.peek() != Some(b':') {
            return Err(self.unexpected("':'"));
        }
        self.pos += 1;
        self.token = TokenType::FieldName;
        self.state = State::Value;
        Ok(())
    }

    fn literal(&mut self, text: &[u8], token: TokenType) -> Result<()> {
        let end = self.pos + text.len();
        if self.data.get(self.pos..end).as_deref() != Some(text) {
            return Err(Error::syntax(self.pos, "invalid literal"));
        }
        self.span = self.pos..end;
        self.pos = end;
        self.token = token;
        Ok(())
    }

    /// Scans the string starting at the opening quote under the cursor.
    fn scan_string(&mut self) -> Result<()> {
        let bytes = self.data.as_slice();
        let body_start = self.pos + 1;
        let mut i = body_start;
        let mut escaped = false;
        loop {
            match bytes.get(i) {
                None => return Err(Error::syntax(self.pos, "unterminated string")),
                Some(b'"') => break,
                Some(b'\\') => {
                    escaped = true;
                    i = escape::decode_escape(bytes, i, 0)?.1;
                }
                Some(0x00..=0x1F) => {
                    return Err(Error::syntax(i, "unescaped control character in string"))
                }
                Some(_) => i += 1,
            }
        }
        std::str::from_utf8(&bytes[body_start..i]).map_err(|e| Error::InvalidUtf8 {
            offset: body_start + e.valid_up_to(),
        })?;
        self.span = body_start..i;
        self.escaped = escaped;
        self.pos = i + 1;
        Ok(())
    }

    fn string_token(&self) -> Result<AnyString> {
        let bytes = Utf8Buffer::from_validated(self.data.slice(self.span.clone()));
        if self.escaped {
            AnyString::from_escaped_utf8(bytes)
        } else {
            Ok(AnyString::from_utf8(bytes))
        }
    }

    fn mismatch<T>(&self, expected: TokenType) -> Result<T> {
        Err(Error::type_mismatch(expected, self.token))
    }
}

/// Returns the end offset of the JSON number starting at `start`.
fn scan_number(bytes: &[u8], start: usize) -> Result<usize> {
    let digit = |i: usize| bytes.get(i).map_or(false, u8::is_ascii_digit);
    let digits_from = |mut i: usize| {
        while digit(i) {
            i += 1;
        }
        i
    };

    let mut i = start;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = digits_from(i),
        _ => return Err(Error::syntax(i, "expected a digit")),
    }
    if bytes.get(i) == Some(&b'.') {
        if !digit(i + 1) {
            return Err(Error::syntax(i + 1, "expected a digit after the decimal point"));
        }
        i = digits_from(i + 1);
    }
    if let Some(b'e' | b'E') = bytes.get(i) {
        i += 1;
        if let Some(b'+' | b'-') = bytes.get(i) {
            i += 1;
        }
        if !digit(i) {
            return Err(Error::syntax(i, "expected a digit in the exponent"));
        }
        i = digits_from(i);
    }
    Ok(i)
}

/// Parses number text already accepted by the scanner. Integers that fit in
/// `i64` stay integers; everything else becomes `f64`.
pub(crate) fn parse_number(text: &[u8], offset: usize) -> Result<Number64> {
    let text = std::str::from_utf8(text).map_err(|_| Error::syntax(offset, "invalid number"))?;
    let integral = !text.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Number64::Int(value));
        }
    }
    text.parse::<f64>()
        .map(Number64::Double)
        .map_err(|_| Error::syntax(offset, "invalid number"))
}

impl JsonReader for TextReader {
    fn serialization_format(&self) -> SerializationFormat {
        SerializationFormat::Text
    }

    fn current_token_type(&self) -> TokenType {
        self.token
    }

    fn current_depth(&self) -> usize {
        self.stack.len()
    }

    fn read(&mut self) -> Result<bool> {
        if self.state == State::Finished {
            return Ok(false);
        }
        self.skip_whitespace();
        self.escaped = false;
        match self.state {
            State::Root => self.value()?,
            State::ValueOrEnd if self.peek() == Some(b']') => self.end(),
            State::ValueOrEnd | State::Value => self.value()?,
            State::NameOrEnd if self.peek() == Some(b'}') => self.end(),
            State::NameOrEnd => self.name()?,
            State::CommaOrEnd => {
                let top = self.stack.last().copied();
                match (self.peek(), top) {
                    (Some(b','), Some(frame)) => {
                        self.pos += 1;
                        self.skip_whitespace();
                        match frame {
                            Frame::Array => self.value()?,
                            Frame::Object => self.name()?,
                        }
                    }
                    (Some(b']'), Some(Frame::Array)) | (Some(b'}'), Some(Frame::Object)) => {
                        self.end()
                    }
                    (_, Some(Frame::Array)) => return Err(self.unexpected("',' or ']'")),
                    _ => return Err(self.unexpected("',' or '}'")),
                }
            }
            State::Trailing => {
                if self.pos < self.data.len() {
                    return Err(Error::syntax(self.pos, "trailing characters after the document"));
                }
                self.state = State::Finished;
                return Ok(false);
            }
            State::Finished => return Ok(false),
        }
        Ok(true)
    }

    fn number_value(&self) -> Result<Number64> {
        match self.token {
            TokenType::Number => Ok(self.number),
            _ => self.mismatch(TokenType::Number),
        }
    }

    fn string_value(&self) -> Result<AnyString> {
        match self.token {
            TokenType::String | TokenType::FieldName => self.string_token(),
            _ => self.mismatch(TokenType::String),
        }
    }

    fn field_name(&self) -> Result<AnyString> {
        match self.token {
            TokenType::FieldName => self.string_token(),
            _ => self.mismatch(TokenType::FieldName),
        }
    }

    fn int8_value(&self) -> Result<i8> {
        self.mismatch(TokenType::Int8)
    }

    fn int16_value(&self) -> Result<i16> {
        self.mismatch(TokenType::Int16)
    }

    fn int32_value(&self) -> Result<i32> {
        self.mismatch(TokenType::Int32)
    }

    fn int64_value(&self) -> Result<i64> {
        self.mismatch(TokenType::Int64)
    }

    fn uint32_value(&self) -> Result<u32> {
        self.mismatch(TokenType::UInt32)
    }

    fn float32_value(&self) -> Result<f32> {
        self.mismatch(TokenType::Float32)
    }

    fn float64_value(&self) -> Result<f64> {
        self.mismatch(TokenType::Float64)
    }

    fn guid_value(&self) -> Result<Uuid> {
        self.mismatch(TokenType::Guid)
    }

    fn binary_value(&self) -> Result<ByteBuffer> {
        self.mismatch(TokenType::Binary)
    }

    fn try_get_buffered_string_value(&self) -> Option<Utf8Buffer> {
        match self.token {
            TokenType::String | TokenType::FieldName if !self.escaped => Some(
                Utf8Buffer::from_validated(self.data.slice(self.span.clone())),
            ),
            _ => None,
        }
    }

    fn try_get_buffered_binary_value(&self) -> Option<ByteBuffer> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Result<Vec<(TokenType, usize)>> {
        let mut reader = TextReader::new(text);
        let mut out = Vec::new();
        while reader.read()? {
            out.push((reader.current_token_type(), reader.current_depth()));
        }
        Ok(out)
    }

    #[test]
    fn test_scenario_token_sequence() {
        use TokenType::*;
        assert_eq!(
            tokens(r#" {"a": 1, "b": [true, null, "x"]} "#).unwrap(),
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
    }

    #[test]
    fn test_read_after_end_keeps_returning_false() {
        let mut reader = TextReader::new("7");
        assert!(reader.read().unwrap());
        assert_eq!(reader.number_value().unwrap(), Number64::Int(7));
        assert!(!reader.read().unwrap());
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn test_numbers() {
        let mut reader = TextReader::new("[0, -12, 3.5, 1e3, 9223372036854775808, -0]");
        let mut values = Vec::new();
        reader.read().unwrap();
        while reader.read().unwrap() && reader.current_token_type() == TokenType::Number {
            values.push(reader.number_value().unwrap());
        }
        assert_eq!(values[0], Number64::Int(0));
        assert_eq!(values[1], Number64::Int(-12));
        assert!(values[2].is_double());
        assert!(values[3].is_double());
        assert_eq!(values[4], Number64::Double(9_223_372_036_854_775_808.0));
        assert!(values[5].is_integer());
    }

    #[test]
    fn test_strings_and_buffered_fast_path() {
        let mut reader = TextReader::new(r#"["plain", "esc\"aped"]"#);
        reader.read().unwrap();
        reader.read().unwrap();
        let buffered = reader.try_get_buffered_string_value().unwrap();
        assert_eq!(buffered, "plain");
        reader.read().unwrap();
        assert!(reader.try_get_buffered_string_value().is_none());
        assert_eq!(reader.string_value().unwrap(), "esc\"aped");
    }

    #[test]
    fn test_field_name_accessors() {
        let mut reader = TextReader::new(r#"{"key": "value"}"#);
        reader.read().unwrap();
        reader.read().unwrap();
        assert_eq!(reader.field_name().unwrap(), "key");
        assert_eq!(reader.string_value().unwrap(), "key");
        reader.read().unwrap();
        assert!(matches!(reader.field_name(), Err(Error::TypeMismatch { .. })));
        assert!(matches!(reader.int8_value(), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "",
            "[1,]",
            "{\"a\" 1}",
            "{\"a\":1,}",
            "[1 2]",
            "01",
            "1.",
            "-",
            "tru",
            "\"open",
            "\"tab\there\"",
            r#""\ud800""#,
            r#""\udc00""#,
            r#""\q""#,
            "[1]]",
            "{} x",
            "[}",
        ] {
            assert!(
                matches!(tokens(bad), Err(Error::Syntax { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_escapes_share_decoder_offsets() {
        let mut reader = TextReader::new(r#"["\ud83d\ude00 \u00e9"]"#);
        reader.read().unwrap();
        reader.read().unwrap();
        assert_eq!(reader.string_value().unwrap(), "😀 é");

        let mut reader = TextReader::new(r#"{"k":"ok","v":"x\ude00"}"#);
        let err = loop {
            match reader.read() {
                Ok(true) => continue,
                Ok(false) => panic!("accepted a lone low surrogate"),
                Err(e) => break e,
            }
        };
        assert_eq!(err, Error::syntax(16, "unpaired low surrogate"));
    }

    #[test]
    fn test_invalid_utf8_in_string() {
        let mut reader = TextReader::new(vec![b'"', 0xFF, b'"']);
        assert!(matches!(reader.read(), Err(Error::InvalidUtf8 { offset: 1 })));
    }

    #[test]
    fn test_depth_limit() {
        let mut reader = TextReader::with_max_depth("[[[1]]]", 2);
        reader.read().unwrap();
        reader.read().unwrap();
        assert!(matches!(reader.read(), Err(Error::DepthLimitExceeded(2))));
    }
}
