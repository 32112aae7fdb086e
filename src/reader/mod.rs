//! Pull-style readers.
//!
//! A [`JsonReader`] is a forward-only cursor over the tokens of one document.
//! Call [`JsonReader::read`] to advance, then inspect the token with the
//! accessor matching [`JsonReader::current_token_type`]. Accessors never
//! coerce: asking an `Int8` token for a `number_value` is a type mismatch.
//!
//! ```rust
//! use dual_json::{create_reader, TokenType};
//!
//! let mut reader = create_reader(br#"{"a":[1,"x"]}"#.to_vec()).unwrap();
//! let mut tokens = Vec::new();
//! while reader.read().unwrap() {
//!     tokens.push((reader.current_token_type(), reader.current_depth()));
//! }
//! assert_eq!(tokens, [
//!     (TokenType::BeginObject, 1),
//!     (TokenType::FieldName, 1),
//!     (TokenType::BeginArray, 2),
//!     (TokenType::Number, 2),
//!     (TokenType::String, 2),
//!     (TokenType::EndArray, 1),
//!     (TokenType::EndObject, 0),
//! ]);
//! ```

pub mod binary;
pub mod text;

pub use binary::BinaryReader;
pub use text::TextReader;

use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::types::TokenType;
use crate::utf8::Utf8Buffer;
use crate::writer::JsonWriter;
use uuid::Uuid;

/// The pull interface shared by the text, binary and navigator-backed readers.
pub trait JsonReader {
    fn serialization_format(&self) -> SerializationFormat;

    /// [`TokenType::NotStarted`] until the first successful `read`.
    fn current_token_type(&self) -> TokenType;

    /// Open containers after the current token.
    fn current_depth(&self) -> usize;

    /// Advances to the next token. Returns `Ok(false)` once the document is
    /// exhausted, on every call after that too.
    fn read(&mut self) -> Result<bool>;

    fn number_value(&self) -> Result<Number64>;

    /// The value of a `String` or `FieldName` token.
    fn string_value(&self) -> Result<AnyString>;

    fn field_name(&self) -> Result<AnyString>;

    fn int8_value(&self) -> Result<i8>;
    fn int16_value(&self) -> Result<i16>;
    fn int32_value(&self) -> Result<i32>;
    fn int64_value(&self) -> Result<i64>;
    fn uint32_value(&self) -> Result<u32>;
    fn float32_value(&self) -> Result<f32>;
    fn float64_value(&self) -> Result<f64>;
    fn guid_value(&self) -> Result<Uuid>;
    fn binary_value(&self) -> Result<ByteBuffer>;

    /// The raw UTF-8 of a `String` or `FieldName` token, when it can be
    /// handed out without unescaping.
    fn try_get_buffered_string_value(&self) -> Option<Utf8Buffer>;

    fn try_get_buffered_binary_value(&self) -> Option<ByteBuffer>;

    /// Writes the current token to `writer`. On a container start the whole
    /// container is consumed and written, leaving the reader on its end token.
    fn write_current_token(&mut self, writer: &mut dyn JsonWriter) -> Result<()> {
        let token = self.current_token_type();
        write_token(self, writer)?;
        if !token.is_container_start() {
            return Ok(());
        }
        let outer = self.current_depth().saturating_sub(1);
        while self.read()? {
            write_token(self, writer)?;
            if self.current_token_type().is_container_end() && self.current_depth() == outer {
                return Ok(());
            }
        }
        Err(Error::unbalanced("input ended inside a container"))
    }

    /// Writes every remaining token to `writer`.
    fn write_all(&mut self, writer: &mut dyn JsonWriter) -> Result<()> {
        while self.read()? {
            self.write_current_token(writer)?;
        }
        Ok(())
    }
}

/// Writes the single token the reader is positioned on.
fn write_token<R: JsonReader + ?Sized>(reader: &R, writer: &mut dyn JsonWriter) -> Result<()> {
    match reader.current_token_type() {
        TokenType::NotStarted => Err(Error::custom("reader is not positioned on a token")),
        TokenType::BeginArray => writer.write_array_start(),
        TokenType::EndArray => writer.write_array_end(),
        TokenType::BeginObject => writer.write_object_start(),
        TokenType::EndObject => writer.write_object_end(),
        TokenType::FieldName => writer.write_field_name(reader.field_name()?.as_str()),
        TokenType::String => writer.write_string_value(reader.string_value()?.as_str()),
        TokenType::Number => writer.write_number_value(reader.number_value()?),
        TokenType::True => writer.write_bool_value(true),
        TokenType::False => writer.write_bool_value(false),
        TokenType::Null => writer.write_null_value(),
        TokenType::Int8 => writer.write_int8_value(reader.int8_value()?),
        TokenType::Int16 => writer.write_int16_value(reader.int16_value()?),
        TokenType::Int32 => writer.write_int32_value(reader.int32_value()?),
        TokenType::Int64 => writer.write_int64_value(reader.int64_value()?),
        TokenType::UInt32 => writer.write_uint32_value(reader.uint32_value()?),
        TokenType::Float32 => writer.write_float32_value(reader.float32_value()?),
        TokenType::Float64 => writer.write_float64_value(reader.float64_value()?),
        TokenType::Guid => writer.write_guid_value(reader.guid_value()?),
        TokenType::Binary => writer.write_binary_value(&reader.binary_value()?),
    }
}
