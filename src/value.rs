//! Owned, dynamically-typed document values.
//!
//! [`Value`] holds a whole document in memory. Unlike a navigator it owns its
//! data, so it is the convenient shape for building documents by hand,
//! comparing two documents, or moving one between formats.
//!
//! Every [`NodeType`] has a variant, including the extended kinds, so a value
//! read from a navigator and written back out produces the same kinds it was
//! read from.
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use dual_json::{json_value, Value};
//!
//! let number = Value::from(42);
//! let text = Value::from("hello");
//! let narrow = Value::Int8(-5);
//!
//! let obj = json_value!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(obj.is_object());
//! ```
//!
//! ### Reading a Document
//!
//! ```rust
//! use dual_json::{create_navigator, Value};
//!
//! let nav = create_navigator(br#"{"id":{"$t":16,"$v":"6ba7b810-9dad-11d1-80b4-00c04fd430c8"}}"#.to_vec()).unwrap();
//! let value = Value::from_navigator(&*nav, nav.root_node()).unwrap();
//! assert!(value.get("id").unwrap().as_guid().is_some());
//! ```
//!
//! ### Writing a Document
//!
//! ```rust
//! use dual_json::{BinaryWriter, JsonWriter, Value, WriterOptions};
//!
//! let mut writer = BinaryWriter::new(WriterOptions::new());
//! Value::Int16(300).write_to(&mut writer).unwrap();
//! assert_eq!(writer.into_bytes().unwrap(), vec![0x80, 0xD9, 0x2C, 0x01]);
//! ```

use crate::error::{Error, Result};
use crate::navigator::{JsonNavigator, NavigatorNode};
use crate::number::Number64;
use crate::options::WriterOptions;
use crate::reader::JsonReader;
use crate::types::{NodeType, TokenType};
use crate::writer::{JsonWriter, TextWriter};
use crate::JsonMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// A complete document value.
///
/// # Examples
///
/// ```rust
/// use dual_json::{NodeType, Value};
///
/// let value = Value::Float32(1.5);
/// assert_eq!(value.node_type(), NodeType::Float32);
/// assert_eq!(value.as_f64(), Some(1.5));
/// assert!(value.is_extended());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number64),
    String(String),
    Array(Vec<Value>),
    Object(JsonMap),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    Guid(Uuid),
    Binary(Vec<u8>),
}

// Newtype-struct names that carry an extended kind through serde. Other
// serializers see an ordinary transparent newtype.
const INT8_MARKER: &str = "$dual_json::Int8";
const INT16_MARKER: &str = "$dual_json::Int16";
const INT32_MARKER: &str = "$dual_json::Int32";
const INT64_MARKER: &str = "$dual_json::Int64";
const UINT32_MARKER: &str = "$dual_json::UInt32";
const FLOAT32_MARKER: &str = "$dual_json::Float32";
const FLOAT64_MARKER: &str = "$dual_json::Float64";
const GUID_MARKER: &str = "$dual_json::Guid";

/// The extended kind a serde newtype name stands for, if any.
pub(crate) fn marker_kind(name: &str) -> Option<NodeType> {
    Some(match name {
        INT8_MARKER => NodeType::Int8,
        INT16_MARKER => NodeType::Int16,
        INT32_MARKER => NodeType::Int32,
        INT64_MARKER => NodeType::Int64,
        UINT32_MARKER => NodeType::UInt32,
        FLOAT32_MARKER => NodeType::Float32,
        FLOAT64_MARKER => NodeType::Float64,
        GUID_MARKER => NodeType::Guid,
        _ => return None,
    })
}

impl Value {
    /// The node kind this value is written as.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::Null => NodeType::Null,
            Value::Bool(false) => NodeType::False,
            Value::Bool(true) => NodeType::True,
            Value::Number(_) => NodeType::Number64,
            Value::String(_) => NodeType::String,
            Value::Array(_) => NodeType::Array,
            Value::Object(_) => NodeType::Object,
            Value::Int8(_) => NodeType::Int8,
            Value::Int16(_) => NodeType::Int16,
            Value::Int32(_) => NodeType::Int32,
            Value::Int64(_) => NodeType::Int64,
            Value::UInt32(_) => NodeType::UInt32,
            Value::Float32(_) => NodeType::Float32,
            Value::Float64(_) => NodeType::Float64,
            Value::Guid(_) => NodeType::Guid,
            Value::Binary(_) => NodeType::Binary,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` for a generic JSON number. Extended numeric kinds are
    /// not `Number64`.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.node_type().is_extended()
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as `i64`, for any numeric kind holding an integral value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::Value;
    ///
    /// assert_eq!(Value::from(42).as_i64(), Some(42));
    /// assert_eq!(Value::Int8(-3).as_i64(), Some(-3));
    /// assert_eq!(Value::from(42.5).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Number(n) => n.as_i64(),
            Value::Int8(v) => Some(i64::from(v)),
            Value::Int16(v) => Some(i64::from(v)),
            Value::Int32(v) => Some(i64::from(v)),
            Value::Int64(v) => Some(v),
            Value::UInt32(v) => Some(i64::from(v)),
            Value::Float32(v) => Number64::from(v).as_i64(),
            Value::Float64(v) => Number64::from(v).as_i64(),
            _ => None,
        }
    }

    /// The value as `f64`, for any numeric kind.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Number(n) => Some(n.as_f64()),
            Value::Float32(v) => Some(f64::from(v)),
            Value::Float64(v) => Some(v),
            _ => self.as_i64().map(|i| i as f64),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&JsonMap> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Looks up a field of an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    /// Writes this value through `writer`, one call per token.
    ///
    /// # Errors
    ///
    /// Whatever the writer reports: a grammar violation when the writer is
    /// not expecting a value, or a non-finite number on a text writer.
    pub fn write_to(&self, writer: &mut dyn JsonWriter) -> Result<()> {
        match self {
            Value::Null => writer.write_null_value(),
            Value::Bool(b) => writer.write_bool_value(*b),
            Value::Number(n) => writer.write_number_value(*n),
            Value::String(s) => writer.write_string_value(s),
            Value::Array(items) => {
                writer.write_array_start()?;
                for item in items {
                    item.write_to(writer)?;
                }
                writer.write_array_end()
            }
            Value::Object(map) => {
                writer.write_object_start()?;
                for (key, value) in map {
                    writer.write_field_name(key)?;
                    value.write_to(writer)?;
                }
                writer.write_object_end()
            }
            Value::Int8(v) => writer.write_int8_value(*v),
            Value::Int16(v) => writer.write_int16_value(*v),
            Value::Int32(v) => writer.write_int32_value(*v),
            Value::Int64(v) => writer.write_int64_value(*v),
            Value::UInt32(v) => writer.write_uint32_value(*v),
            Value::Float32(v) => writer.write_float32_value(*v),
            Value::Float64(v) => writer.write_float64_value(*v),
            Value::Guid(g) => writer.write_guid_value(*g),
            Value::Binary(b) => writer.write_binary_value(b),
        }
    }

    /// Materializes the subtree at `node`.
    ///
    /// Repeated field names collapse into one entry that keeps the position
    /// of the first occurrence and the value of the last.
    ///
    /// # Errors
    ///
    /// Any error the navigator reports for the subtree, or
    /// [`Error::DepthLimitExceeded`] past the navigator's depth limit.
    pub fn from_navigator<N: JsonNavigator + ?Sized>(
        nav: &N,
        node: NavigatorNode,
    ) -> Result<Value> {
        build_from_node(nav, node, 0)
    }

    /// Reads one complete value from `reader`.
    ///
    /// A reader that has not started yet is advanced to its first token. On
    /// return the reader sits on the last token of the value.
    ///
    /// # Errors
    ///
    /// Malformed input, or a reader positioned on a token that does not start
    /// a value (a field name or a container end).
    pub fn from_reader(reader: &mut dyn JsonReader) -> Result<Value> {
        if reader.current_token_type() == TokenType::NotStarted && !reader.read()? {
            return Err(Error::custom("reader has no value to read"));
        }
        build_from_reader(reader)
    }
}

fn build_from_node<N: JsonNavigator + ?Sized>(
    nav: &N,
    node: NavigatorNode,
    depth: usize,
) -> Result<Value> {
    let value = match nav.node_type(node)? {
        NodeType::Null => Value::Null,
        NodeType::False => Value::Bool(false),
        NodeType::True => Value::Bool(true),
        NodeType::Number64 => Value::Number(nav.number_value(node)?),
        NodeType::String => Value::String(nav.string_value(node)?.into_string()),
        NodeType::Int8 => Value::Int8(nav.int8_value(node)?),
        NodeType::Int16 => Value::Int16(nav.int16_value(node)?),
        NodeType::Int32 => Value::Int32(nav.int32_value(node)?),
        NodeType::Int64 => Value::Int64(nav.int64_value(node)?),
        NodeType::UInt32 => Value::UInt32(nav.uint32_value(node)?),
        NodeType::Float32 => Value::Float32(nav.float32_value(node)?),
        NodeType::Float64 => Value::Float64(nav.float64_value(node)?),
        NodeType::Guid => Value::Guid(nav.guid_value(node)?),
        NodeType::Binary => Value::Binary(nav.binary_value(node)?.to_vec()),
        NodeType::Array => {
            if depth >= nav.max_depth() {
                return Err(Error::DepthLimitExceeded(nav.max_depth()));
            }
            let mut items = Vec::with_capacity(nav.array_item_count(node)?);
            for item in nav.array_items(node)? {
                items.push(build_from_node(nav, item?, depth + 1)?);
            }
            Value::Array(items)
        }
        NodeType::Object => {
            if depth >= nav.max_depth() {
                return Err(Error::DepthLimitExceeded(nav.max_depth()));
            }
            let mut map = JsonMap::new();
            for property in nav.object_properties(node)? {
                let property = property?;
                let name = nav.string_value(property.name)?.into_string();
                map.insert(name, build_from_node(nav, property.value, depth + 1)?);
            }
            Value::Object(map)
        }
        other @ (NodeType::FieldName | NodeType::Unknown) => {
            return Err(Error::node_mismatch("a value node", other));
        }
    };
    Ok(value)
}

fn build_from_reader(reader: &mut dyn JsonReader) -> Result<Value> {
    let value = match reader.current_token_type() {
        TokenType::Null => Value::Null,
        TokenType::False => Value::Bool(false),
        TokenType::True => Value::Bool(true),
        TokenType::Number => Value::Number(reader.number_value()?),
        TokenType::String => Value::String(reader.string_value()?.into_string()),
        TokenType::Int8 => Value::Int8(reader.int8_value()?),
        TokenType::Int16 => Value::Int16(reader.int16_value()?),
        TokenType::Int32 => Value::Int32(reader.int32_value()?),
        TokenType::Int64 => Value::Int64(reader.int64_value()?),
        TokenType::UInt32 => Value::UInt32(reader.uint32_value()?),
        TokenType::Float32 => Value::Float32(reader.float32_value()?),
        TokenType::Float64 => Value::Float64(reader.float64_value()?),
        TokenType::Guid => Value::Guid(reader.guid_value()?),
        TokenType::Binary => Value::Binary(reader.binary_value()?.to_vec()),
        TokenType::BeginArray => {
            let mut items = Vec::new();
            loop {
                expect_more(reader)?;
                if reader.current_token_type() == TokenType::EndArray {
                    break;
                }
                items.push(build_from_reader(reader)?);
            }
            Value::Array(items)
        }
        TokenType::BeginObject => {
            let mut map = JsonMap::new();
            loop {
                expect_more(reader)?;
                if reader.current_token_type() == TokenType::EndObject {
                    break;
                }
                let name = reader.field_name()?.into_string();
                expect_more(reader)?;
                map.insert(name, build_from_reader(reader)?);
            }
            Value::Object(map)
        }
        other => return Err(Error::node_mismatch("a value token", other)),
    };
    Ok(value)
}

fn expect_more(reader: &mut dyn JsonReader) -> Result<()> {
    if reader.read()? {
        Ok(())
    } else {
        Err(Error::unbalanced("input ended inside a container"))
    }
}

/// Compact text form, with extended kinds as typed envelopes. The alternate
/// flag (`{:#}`) pretty-prints.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = if f.alternate() {
            WriterOptions::pretty()
        } else {
            WriterOptions::new()
        };
        let mut writer = TextWriter::new(options);
        match self.write_to(&mut writer).and_then(|()| writer.into_string()) {
            Ok(text) => f.write_str(&text),
            // Only non-finite numbers fail here; fall back to the debug form.
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number64::Int(i)) => serializer.serialize_i64(*i),
            Value::Number(Number64::Double(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Int8(v) => serializer.serialize_newtype_struct(INT8_MARKER, v),
            Value::Int16(v) => serializer.serialize_newtype_struct(INT16_MARKER, v),
            Value::Int32(v) => serializer.serialize_newtype_struct(INT32_MARKER, v),
            Value::Int64(v) => serializer.serialize_newtype_struct(INT64_MARKER, v),
            Value::UInt32(v) => serializer.serialize_newtype_struct(UINT32_MARKER, v),
            Value::Float32(v) => serializer.serialize_newtype_struct(FLOAT32_MARKER, v),
            Value::Float64(v) => serializer.serialize_newtype_struct(FLOAT64_MARKER, v),
            Value::Guid(g) => serializer
                .serialize_newtype_struct(GUID_MARKER, g.hyphenated().to_string().as_str()),
            Value::Binary(b) => serializer.serialize_bytes(b),
        }
    }
}

/// Narrow numeric kinds survive deserialization through their serde width
/// (`i8`, `i16`, `i32`, `u32`, `f32`). `i64`, `f64` and strings arrive as the
/// generic kinds; use [`Value::from_navigator`] to keep every kind.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid JSON value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i8<E>(self, value: i8) -> std::result::Result<Value, E> {
                Ok(Value::Int8(value))
            }

            fn visit_i16<E>(self, value: i16) -> std::result::Result<Value, E> {
                Ok(Value::Int16(value))
            }

            fn visit_i32<E>(self, value: i32) -> std::result::Result<Value, E> {
                Ok(Value::Int32(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number64::Int(value)))
            }

            fn visit_u32<E>(self, value: u32) -> std::result::Result<Value, E> {
                Ok(Value::UInt32(value))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(Value::Number(match i64::try_from(value) {
                    Ok(i) => Number64::Int(i),
                    Err(_) => Number64::Double(value as f64),
                }))
            }

            fn visit_f32<E>(self, value: f32) -> std::result::Result<Value, E> {
                Ok(Value::Float32(value))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number64::Double(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Value, E> {
                Ok(Value::Binary(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Value, E> {
                Ok(Value::Binary(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = JsonMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::node_mismatch("an integral number", value.node_type()))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::node_mismatch("a number", value.node_type()))
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::node_mismatch("a boolean", value.node_type()))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::type_mismatch(NodeType::String, other.node_type())),
        }
    }
}

impl TryFrom<Value> for Uuid {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_guid()
            .ok_or_else(|| Error::type_mismatch(NodeType::Guid, value.node_type()))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Number(Number64::from(value))
                }
            }
        )*
    };
}

// Plain Rust numbers are generic JSON numbers; the extended variants are
// constructed explicitly.
value_from_number!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

impl From<Number64> for Value {
    fn from(value: Number64) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Guid(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Binary(value.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<JsonMap> for Value {
    fn from(value: JsonMap) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{BinaryNavigator, TextNavigator};
    use crate::reader::{BinaryReader, TextReader};
    use crate::writer::BinaryWriter;
    use crate::TypedNavigator;

    fn sample() -> Value {
        let mut inner = JsonMap::new();
        inner.insert("flag".to_string(), Value::Bool(false));
        inner.insert("bytes".to_string(), Value::Binary(vec![0, 1, 255]));
        let mut map = JsonMap::new();
        map.insert("n".to_string(), Value::from(1.25));
        map.insert("s".to_string(), Value::from("a\"b"));
        map.insert(
            "list".to_string(),
            Value::Array(vec![Value::Int8(-128), Value::UInt32(u32::MAX), Value::Null]),
        );
        map.insert("inner".to_string(), Value::Object(inner));
        map.insert("id".to_string(), Value::Guid(Uuid::from_u128(0x1234)));
        Value::Object(map)
    }

    #[test]
    fn test_binary_round_trip_keeps_kinds() {
        let value = sample();
        let mut writer = BinaryWriter::new(WriterOptions::new());
        value.write_to(&mut writer).unwrap();
        let nav = BinaryNavigator::new(writer.into_bytes().unwrap()).unwrap();
        assert_eq!(Value::from_navigator(&nav, nav.root_node()).unwrap(), value);
    }

    #[test]
    fn test_text_round_trip_through_envelopes() {
        let value = sample();
        let text = value.to_string();
        let nav = TypedNavigator::new(TextNavigator::new(text).unwrap());
        assert_eq!(Value::from_navigator(&nav, nav.root_node()).unwrap(), value);
    }

    #[test]
    fn test_duplicate_fields_keep_first_position_last_value() {
        let nav = TextNavigator::new(r#"{"k":1,"m":true,"k":2}"#).unwrap();
        let value = Value::from_navigator(&nav, nav.root_node()).unwrap();
        let entries: Vec<_> = value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("k".to_string(), Value::from(2)),
                ("m".to_string(), Value::Bool(true))
            ]
        );
    }

    #[test]
    fn test_from_reader_matches_from_navigator() {
        let text = r#"[{"a":[1,2,{}]},"x",null,[]]"#;
        let nav = TextNavigator::new(text).unwrap();
        let mut reader = TextReader::new(text);
        let from_reader = Value::from_reader(&mut reader).unwrap();
        assert_eq!(from_reader, Value::from_navigator(&nav, nav.root_node()).unwrap());
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn test_from_reader_binary_extended() {
        let mut writer = BinaryWriter::new(WriterOptions::new());
        Value::Array(vec![Value::Float32(0.5), Value::Int64(-9)])
            .write_to(&mut writer)
            .unwrap();
        let mut reader = BinaryReader::new(writer.into_bytes().unwrap()).unwrap();
        assert_eq!(
            Value::from_reader(&mut reader).unwrap(),
            Value::Array(vec![Value::Float32(0.5), Value::Int64(-9)])
        );
    }

    #[test]
    fn test_from_reader_rejects_field_name() {
        let mut reader = TextReader::new(r#"{"a":1}"#);
        reader.read().unwrap();
        reader.read().unwrap();
        assert!(matches!(
            Value::from_reader(&mut reader),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let nav = TextNavigator::with_options(
            "[[[1]]]",
            &crate::options::NavigatorOptions::new().with_max_depth(3),
        )
        .unwrap();
        assert!(Value::from_navigator(&nav, nav.root_node()).is_ok());

        let nav = TextNavigator::new("[[[1]]]").unwrap();
        let inner = nav.array_item_at(nav.root_node(), 0).unwrap();
        assert_eq!(
            build_from_node(&nav, inner, nav.max_depth()),
            Err(Error::DepthLimitExceeded(nav.max_depth()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int32(7).to_string(), r#"{"$t":10,"$v":7}"#);
        assert_eq!(
            Value::Array(vec![Value::from(1), Value::from("x")]).to_string(),
            r#"[1,"x"]"#
        );
        assert!(Value::from(f64::NAN).to_string().contains("NaN"));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::UInt32(7).as_i64(), Some(7));
        assert_eq!(Value::Float32(2.0).as_i64(), Some(2));
        assert_eq!(Value::from("x").as_i64(), None);
        assert_eq!(Value::Int16(3).as_f64(), Some(3.0));
        assert_eq!(sample().get("s").and_then(Value::as_str), Some("a\"b"));
        assert!(i64::try_from(Value::from("x")).is_err());
        assert_eq!(String::try_from(Value::from("x")).unwrap(), "x");
        assert_eq!(
            Uuid::try_from(Value::Guid(Uuid::nil())).unwrap(),
            Uuid::nil()
        );
    }

    #[test]
    fn test_markers() {
        assert_eq!(marker_kind(GUID_MARKER), Some(NodeType::Guid));
        assert_eq!(marker_kind("Wrapper"), None);
    }

    #[test]
    fn test_serde_json_sees_transparent_values() {
        let value = Value::Array(vec![Value::Int8(5), Value::Guid(Uuid::nil())]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"[5,"00000000-0000-0000-0000-000000000000"]"#
        );
        let back: Value = serde_json::from_str(r#"{"a":[1,2.5,"s",null]}"#).unwrap();
        assert_eq!(
            back.get("a").unwrap(),
            &Value::Array(vec![
                Value::from(1),
                Value::from(2.5),
                Value::from("s"),
                Value::Null
            ])
        );
    }
}
