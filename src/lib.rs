//! # dual_json
//!
//! A JSON codec with two interchangeable encodings behind one set of traits.
//!
//! ## What is it?
//!
//! Documents follow the JSON data model and can be stored either as ordinary
//! JSON text or as a compact binary encoding. Both encodings carry an extended
//! type system on top of JSON: fixed-width integers (`Int8`, `Int16`, `Int32`,
//! `Int64`, `UInt32`), `Float32`/`Float64`, `Guid` and `Binary`. Binary stores
//! these natively; text represents them with typed envelopes of the form
//! `{"$t": code, "$v": value}` so nothing is lost in either direction.
//!
//! ## Key Features
//!
//! - **Format agnostic**: [`JsonWriter`], [`JsonReader`] and [`JsonNavigator`] have
//!   a text and a binary implementation each; callers never branch on format
//! - **Lazy navigation**: the binary navigator decodes only what is asked for.
//!   Reading the last item of an array never decodes the items before it
//! - **Zero-copy strings**: [`JsonNavigator::try_get_buffered_string_value`]
//!   returns a view into the input when no unescaping is needed
//! - **Fast binary copies**: containers copied from a binary navigator into a
//!   binary writer are spliced in as raw bytes
//! - **Serde compatible**: [`to_text`], [`to_binary`] and [`from_slice`] work with any
//!   `#[derive(Serialize, Deserialize)]` type
//!
//! ## Quick Start
//!
//! ```rust
//! use dual_json::{create_navigator, create_writer, SerializationFormat, WriterOptions};
//!
//! let mut writer = create_writer(SerializationFormat::Binary, WriterOptions::new()).unwrap();
//! writer.write_object_start().unwrap();
//! writer.write_field_name("a").unwrap();
//! writer.write_int8_value(-128).unwrap();
//! writer.write_object_end().unwrap();
//! let bytes = writer.result().unwrap();
//!
//! let nav = create_navigator(bytes).unwrap();
//! let a = nav.try_get_object_property(nav.root_node(), "a").unwrap().unwrap();
//! assert_eq!(nav.int8_value(a.value).unwrap(), -128);
//! ```
//!
//! ### Converting Between Formats
//!
//! ```rust
//! use dual_json::{convert, SerializationFormat, WriterOptions};
//!
//! let text = br#"{"id":{"$t":10,"$v":7},"tags":["x"]}"#.to_vec();
//! let binary = convert(text.clone(), SerializationFormat::Binary, WriterOptions::new()).unwrap();
//! let back = convert(binary, SerializationFormat::Text, WriterOptions::new()).unwrap();
//! assert_eq!(back.as_slice(), &text[..]);
//! ```
//!
//! ### Serde
//!
//! ```rust
//! use dual_json::{from_slice, to_binary, to_text};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//!
//! let text = to_text(&user).unwrap();
//! assert_eq!(text, r#"{"id":123,"name":"Alice","active":true}"#);
//!
//! let binary = to_binary(&user).unwrap();
//! let back: User = from_slice(&binary).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result<T>`](Result), with one [`Error`]
//! enum for the whole crate. Operations that look something up return
//! `Option` for "not there" and reserve errors for malformed input and misuse.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for navigator construction and
//! format conversion, `trace` for per-container detail) and installs no
//! subscriber of its own.

pub mod any_string;
pub mod buffer;
pub mod de;
pub mod encoding;
pub mod envelope;
pub mod error;
mod escape;
pub mod format;
pub mod macros;
pub mod map;
pub mod navigator;
pub mod number;
pub mod options;
pub mod reader;
pub mod ser;
pub mod types;
pub mod utf8;
pub mod value;
pub mod writer;

pub use any_string::AnyString;
pub use buffer::ByteBuffer;
pub use de::NodeDeserializer;
pub use envelope::TypedNavigator;
pub use error::{Error, Result};
pub use format::SerializationFormat;
pub use map::JsonMap;
pub use navigator::{
    BinaryNavigator, JsonNavigator, NavigatorNode, NodeReader, ObjectProperty, TextNavigator,
};
pub use number::Number64;
pub use options::{ExtendedTypeHandling, NavigatorOptions, WriterOptions};
pub use reader::{BinaryReader, JsonReader, TextReader};
pub use ser::Serializer;
pub use types::{NodeType, TokenType};
pub use utf8::Utf8Buffer;
pub use value::Value;
pub use writer::{BinaryWriter, JsonWriter, PreblittedScope, TextWriter, TypedBinaryJsonWriter};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tracing::debug;

/// Creates an empty writer for `format`.
///
/// # Errors
///
/// [`Error::UnsupportedFormat`] for [`SerializationFormat::HybridRow`].
pub fn create_writer(
    format: SerializationFormat,
    options: WriterOptions,
) -> Result<Box<dyn JsonWriter>> {
    match format {
        SerializationFormat::Text => Ok(Box::new(TextWriter::new(options))),
        SerializationFormat::Binary => Ok(Box::new(BinaryWriter::new(options))),
        SerializationFormat::HybridRow => Err(Error::UnsupportedFormat(format)),
    }
}

/// Creates a reader over `buffer`, choosing the format from its first byte.
///
/// # Examples
///
/// ```rust
/// use dual_json::{create_reader, TokenType};
///
/// let mut reader = create_reader(b"[1]".to_vec()).unwrap();
/// assert!(reader.read().unwrap());
/// assert_eq!(reader.current_token_type(), TokenType::BeginArray);
/// ```
///
/// # Errors
///
/// [`Error::UnsupportedFormat`] for a HybridRow buffer. Malformed content is
/// reported by [`JsonReader::read`] as the reader reaches it.
pub fn create_reader(buffer: impl Into<ByteBuffer>) -> Result<Box<dyn JsonReader>> {
    let buffer = buffer.into();
    match SerializationFormat::detect(&buffer) {
        SerializationFormat::Text => Ok(Box::new(TextReader::new(buffer))),
        SerializationFormat::Binary => Ok(Box::new(BinaryReader::new(buffer)?)),
        format @ SerializationFormat::HybridRow => Err(Error::UnsupportedFormat(format)),
    }
}

/// Creates a navigator over `buffer` with default options: typed envelopes
/// are recognized and the depth limit is 256.
///
/// # Errors
///
/// Malformed input, or [`Error::UnsupportedFormat`] for a HybridRow buffer.
/// Text is parsed completely here, so any syntax error surfaces now.
pub fn create_navigator(buffer: impl Into<ByteBuffer>) -> Result<Box<dyn JsonNavigator>> {
    create_navigator_with(buffer, NavigatorOptions::default())
}

/// Creates a navigator over `buffer`.
///
/// # Examples
///
/// ```rust
/// use dual_json::{create_navigator_with, NavigatorOptions, NodeType};
///
/// let text = br#"{"$t":8,"$v":5}"#.to_vec();
/// let plain = create_navigator_with(text.clone(), NavigatorOptions::new().with_envelopes(false)).unwrap();
/// assert_eq!(plain.node_type(plain.root_node()).unwrap(), NodeType::Object);
///
/// let typed = create_navigator_with(text, NavigatorOptions::new()).unwrap();
/// assert_eq!(typed.node_type(typed.root_node()).unwrap(), NodeType::Int8);
/// ```
///
/// # Errors
///
/// See [`create_navigator`].
pub fn create_navigator_with(
    buffer: impl Into<ByteBuffer>,
    options: NavigatorOptions,
) -> Result<Box<dyn JsonNavigator>> {
    let buffer = buffer.into();
    match SerializationFormat::detect(&buffer) {
        SerializationFormat::Text => Ok(boxed(
            TextNavigator::with_options(buffer, &options)?,
            options.recognize_envelopes,
        )),
        SerializationFormat::Binary => Ok(boxed(
            BinaryNavigator::with_options(buffer, &options)?,
            options.recognize_envelopes,
        )),
        format @ SerializationFormat::HybridRow => Err(Error::UnsupportedFormat(format)),
    }
}

fn boxed<N: JsonNavigator + 'static>(nav: N, typed: bool) -> Box<dyn JsonNavigator> {
    if typed {
        Box::new(TypedNavigator::new(nav))
    } else {
        Box::new(nav)
    }
}

/// Re-encodes a whole document in `target` format.
///
/// Typed envelopes in a text source become native values in binary. A binary
/// source is copied container by container when the target is binary too.
///
/// # Errors
///
/// Malformed input, [`Error::UnsupportedFormat`] for HybridRow on either
/// side, or [`Error::NonFiniteNumber`] when a binary NaN or infinity meets a
/// text target.
pub fn convert(
    buffer: impl Into<ByteBuffer>,
    target: SerializationFormat,
    options: WriterOptions,
) -> Result<ByteBuffer> {
    let buffer = buffer.into();
    let source = SerializationFormat::detect(&buffer);
    let mut writer = create_writer(target, options)?;
    match source {
        SerializationFormat::Text => {
            let nav = TypedNavigator::new(TextNavigator::new(buffer.clone())?);
            nav.write_node(nav.root_node(), writer.as_mut())?;
        }
        SerializationFormat::Binary => {
            let nav = BinaryNavigator::new(buffer.clone())?;
            nav.write_node(nav.root_node(), writer.as_mut())?;
        }
        SerializationFormat::HybridRow => return Err(Error::UnsupportedFormat(source)),
    }
    let output = writer.result()?;
    debug!(
        ?source,
        ?target,
        input_len = buffer.len(),
        output_len = output.len(),
        "converted document"
    );
    Ok(output)
}

/// Serializes `value` through an existing writer.
///
/// # Examples
///
/// ```rust
/// use dual_json::{to_writer, JsonWriter, TextWriter, WriterOptions};
///
/// let mut writer = TextWriter::new(WriterOptions::new());
/// writer.write_array_start().unwrap();
/// to_writer(&"first", &mut writer).unwrap();
/// to_writer(&vec![1, 2], &mut writer).unwrap();
/// writer.write_array_end().unwrap();
/// assert_eq!(writer.into_string().unwrap(), r#"["first",[1,2]]"#);
/// ```
///
/// # Errors
///
/// Serialization failures and writer grammar violations.
pub fn to_writer<T>(value: &T, writer: &mut dyn JsonWriter) -> Result<()>
where
    T: ?Sized + Serialize,
{
    value.serialize(&mut Serializer::new(writer))
}

/// Serializes `value` as compact JSON text.
///
/// # Errors
///
/// Serialization failures, including non-finite floats.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_text_with_options(value, WriterOptions::new())
}

/// Serializes `value` as indented JSON text.
///
/// # Errors
///
/// See [`to_text`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text_pretty<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_text_with_options(value, WriterOptions::pretty())
}

/// Serializes `value` as JSON text with custom options.
///
/// # Errors
///
/// See [`to_text`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text_with_options<T>(value: &T, options: WriterOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let mut writer = TextWriter::new(options);
    to_writer(value, &mut writer)?;
    writer.into_string()
}

/// Serializes `value` in the binary encoding.
///
/// # Errors
///
/// Serialization failures.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_binary<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut writer = BinaryWriter::new(WriterOptions::new());
    to_writer(value, &mut writer)?;
    writer.into_bytes()
}

/// Serializes `value` in `format` to an I/O sink.
///
/// # Errors
///
/// Serialization failures, [`Error::UnsupportedFormat`], or [`Error::Io`]
/// when writing to `out` fails.
pub fn to_io<W, T>(mut out: W, value: &T, format: SerializationFormat) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let mut writer = create_writer(format, WriterOptions::new())?;
    to_writer(value, writer.as_mut())?;
    out.write_all(&writer.result()?)
        .map_err(|e| Error::io(&e.to_string()))
}

/// Converts `value` to an owned [`Value`].
///
/// # Examples
///
/// ```rust
/// use dual_json::{to_value, Value};
///
/// let value = to_value(&vec![("a", 1)]).unwrap();
/// assert_eq!(value, Value::Array(vec![Value::Array(vec![Value::from("a"), Value::from(1)])]));
/// ```
///
/// # Errors
///
/// Serialization failures.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    let nav = BinaryNavigator::new(to_binary(value)?)?;
    Value::from_navigator(&nav, nav.root_node())
}

/// Deserializes `T` from the subtree at `node`.
///
/// # Errors
///
/// Malformed input met along the way, or a document that does not match `T`.
pub fn from_navigator<T, N>(nav: &N, node: NavigatorNode) -> Result<T>
where
    T: DeserializeOwned,
    N: JsonNavigator + ?Sized,
{
    T::deserialize(NodeDeserializer::new(nav, node))
}

/// Deserializes `T` from a text or binary document.
///
/// # Errors
///
/// See [`create_navigator`] and [`from_navigator`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let nav = create_navigator(bytes)?;
    from_navigator(&*nav, nav.root_node())
}

/// Deserializes `T` from an I/O source holding a text or binary document.
///
/// # Errors
///
/// [`Error::Io`] when reading fails, otherwise as [`from_slice`].
pub fn from_io<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&bytes)
}

/// Deserializes `T` from an owned [`Value`].
///
/// # Errors
///
/// A value that does not match `T`.
pub fn from_value<T>(value: &Value) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut writer = BinaryWriter::new(WriterOptions::new());
    value.write_to(&mut writer)?;
    let nav = BinaryNavigator::new(writer.into_bytes()?)?;
    from_navigator(&nav, nav.root_node())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_factories_reject_hybrid_row() {
        assert_eq!(
            create_writer(SerializationFormat::HybridRow, WriterOptions::new()).err(),
            Some(Error::UnsupportedFormat(SerializationFormat::HybridRow))
        );
        assert!(matches!(
            create_reader(vec![0x81, 0x00]),
            Err(Error::UnsupportedFormat(SerializationFormat::HybridRow))
        ));
        assert!(matches!(
            create_navigator(vec![0x81]),
            Err(Error::UnsupportedFormat(SerializationFormat::HybridRow))
        ));
    }

    #[test]
    fn test_factory_formats() {
        let writer = create_writer(SerializationFormat::Binary, WriterOptions::new()).unwrap();
        assert_eq!(writer.serialization_format(), SerializationFormat::Binary);
        let reader = create_reader(vec![0x80, 0xD0]).unwrap();
        assert_eq!(reader.serialization_format(), SerializationFormat::Binary);
        let nav = create_navigator("null").unwrap();
        assert_eq!(nav.serialization_format(), SerializationFormat::Text);
    }

    #[test]
    fn test_convert_binary_to_binary_is_identity() {
        let binary = to_binary(&vec![vec!["a", "b"], vec![]]).unwrap();
        let copied = convert(binary.clone(), SerializationFormat::Binary, WriterOptions::new())
            .unwrap();
        assert_eq!(copied.as_slice(), &binary[..]);
    }

    #[test]
    fn test_convert_non_finite_to_text() {
        let binary = to_binary(&f64::NAN).unwrap();
        assert!(matches!(
            convert(binary, SerializationFormat::Text, WriterOptions::new()),
            Err(Error::NonFiniteNumber(_))
        ));
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Item {
        name: String,
        count: u16,
        payload: Option<Vec<i64>>,
    }

    #[test]
    fn test_serde_round_trips() {
        let item = Item {
            name: "widget".to_string(),
            count: 3,
            payload: Some(vec![-1, i64::MAX]),
        };
        assert_eq!(from_slice::<Item>(to_text(&item).unwrap().as_bytes()).unwrap(), item);
        assert_eq!(from_slice::<Item>(&to_binary(&item).unwrap()).unwrap(), item);
        assert_eq!(from_value::<Item>(&to_value(&item).unwrap()).unwrap(), item);

        let mut out = Vec::new();
        to_io(&mut out, &item, SerializationFormat::Binary).unwrap();
        assert_eq!(from_io::<_, Item>(&out[..]).unwrap(), item);
    }

    #[test]
    fn test_pretty_text() {
        assert_eq!(to_text_pretty(&vec![1, 2]).unwrap(), "[\n  1,\n  2\n]");
    }
}
