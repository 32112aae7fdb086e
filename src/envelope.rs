//! Typed envelopes: extended kinds carried through JSON text.
//!
//! JSON text has no notation for an `Int8`, a `Guid` or a byte string, so the
//! text writer represents them as a two-property object:
//!
//! ```text
//! {"$t": <type code>, "$v": <value>}
//! ```
//!
//! The type code is the [`NodeType`] discriminant. `$v` holds:
//!
//! | Kind | `$v` |
//! |------|------|
//! | Int8, Int16, Int32, Int64, UInt32 | JSON integer |
//! | Float32, Float64 | JSON number, or `"NaN"`, `"Infinity"`, `"-Infinity"` |
//! | Binary | standard base64 string with padding |
//! | Guid | hyphenated 8-4-4-4-12 hex string |
//!
//! [`TypedNavigator`] wraps any navigator and reports such objects as the kind
//! they carry. Recognition is structural: exactly the two names `$t` and `$v`
//! in either order, a known type code, and a `$v` of the listed JSON kind.
//! Anything else stays a plain object. A recognized envelope whose `$v` cannot
//! be decoded (an integer out of range, bad base64) fails on access with
//! [`Error::InvalidEnvelope`].
//!
//! ```rust
//! use dual_json::{create_navigator, NodeType};
//!
//! let nav = create_navigator(br#"[{"$t":8,"$v":-5},{"$t":8}]"#.to_vec()).unwrap();
//! let first = nav.array_item_at(nav.root_node(), 0).unwrap();
//! let second = nav.array_item_at(nav.root_node(), 1).unwrap();
//! assert_eq!(nav.node_type(first).unwrap(), NodeType::Int8);
//! assert_eq!(nav.int8_value(first).unwrap(), -5);
//! assert_eq!(nav.node_type(second).unwrap(), NodeType::Object);
//! ```

use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::navigator::{
    write_node_walk, JsonNavigator, NavigatorNode, NodeIter, NodeReader, ObjectProperty,
    PropertyIter,
};
use crate::number::Number64;
use crate::reader::JsonReader;
use crate::types::NodeType;
use crate::utf8::Utf8Buffer;
use crate::writer::JsonWriter;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::trace;
use uuid::Uuid;

pub const TYPE_FIELD: &str = "$t";
pub const VALUE_FIELD: &str = "$v";

/// A navigator that reports typed envelopes as their extended kinds.
pub struct TypedNavigator<N> {
    inner: N,
}

impl<N: JsonNavigator> TypedNavigator<N> {
    pub fn new(inner: N) -> Self {
        TypedNavigator { inner }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn into_inner(self) -> N {
        self.inner
    }

    /// The carried kind and the `$v` node, when `node` is an envelope.
    fn envelope(&self, node: NavigatorNode) -> Result<Option<(NodeType, NavigatorNode)>> {
        if self.inner.node_type(node)? != NodeType::Object
            || self.inner.object_property_count(node)? != 2
        {
            return Ok(None);
        }
        let mut code = None;
        let mut value = None;
        for property in self.inner.object_properties(node)? {
            let property = property?;
            let name = self.inner.string_value(property.name)?;
            let slot = match name.as_str() {
                TYPE_FIELD => &mut code,
                VALUE_FIELD => &mut value,
                _ => return Ok(None),
            };
            if slot.replace(property.value).is_some() {
                return Ok(None);
            }
        }
        let (Some(code), Some(value)) = (code, value) else {
            return Ok(None);
        };
        if self.inner.node_type(code)? != NodeType::Number64 {
            return Ok(None);
        }
        let kind = match self
            .inner
            .number_value(code)?
            .as_i64()
            .and_then(|c| u8::try_from(c).ok())
            .and_then(NodeType::from_type_code)
        {
            Some(kind) => kind,
            None => return Ok(None),
        };
        let value_type = self.inner.node_type(value)?;
        let shape_ok = match kind {
            NodeType::Float32 | NodeType::Float64 => {
                matches!(value_type, NodeType::Number64 | NodeType::String)
            }
            NodeType::Binary | NodeType::Guid => value_type == NodeType::String,
            _ => value_type == NodeType::Number64,
        };
        if !shape_ok {
            return Ok(None);
        }
        trace!(?kind, "recognized typed envelope");
        Ok(Some((kind, value)))
    }

    /// The `$v` node when `node` is an envelope of kind `expected`.
    fn value_of(&self, node: NavigatorNode, expected: NodeType) -> Result<Option<NavigatorNode>> {
        Ok(match self.envelope(node)? {
            Some((kind, value)) if kind == expected => Some(value),
            Some((kind, _)) => return Err(Error::type_mismatch(expected, kind)),
            None => None,
        })
    }

    fn integer<T: TryFrom<i64>>(&self, value: NavigatorNode, kind: NodeType) -> Result<T> {
        let number = self.inner.number_value(value)?;
        number
            .as_i64()
            .and_then(|i| T::try_from(i).ok())
            .ok_or_else(|| Error::invalid_envelope(format!("{} is not a valid {:?}", number, kind)))
    }

    fn float(&self, value: NavigatorNode, kind: NodeType) -> Result<f64> {
        if self.inner.node_type(value)? == NodeType::Number64 {
            return Ok(self.inner.number_value(value)?.as_f64());
        }
        let text = self.inner.string_value(value)?;
        match text.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(Error::invalid_envelope(format!(
                "{:?} is not a valid {:?}",
                other, kind
            ))),
        }
    }

    fn text(&self, value: NavigatorNode) -> Result<AnyString> {
        self.inner.string_value(value)
    }

    /// Whether any object in the subtree at `node` is an envelope.
    fn contains_envelope(&self, node: NavigatorNode, depth: usize) -> Result<bool> {
        let nested = match self.inner.node_type(node)? {
            NodeType::Array => false,
            NodeType::Object => {
                if self.envelope(node)?.is_some() {
                    return Ok(true);
                }
                true
            }
            _ => return Ok(false),
        };
        if depth >= self.inner.max_depth() {
            return Err(Error::DepthLimitExceeded(self.inner.max_depth()));
        }
        if nested {
            for property in self.inner.object_properties(node)? {
                if self.contains_envelope(property?.value, depth + 1)? {
                    return Ok(true);
                }
            }
        } else {
            for item in self.inner.array_items(node)? {
                if self.contains_envelope(item?, depth + 1)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Parses the `$v` text of a Guid envelope.
pub(crate) fn parse_guid(text: &str) -> Result<Uuid> {
    if text.len() != 36 {
        return Err(Error::invalid_envelope(format!(
            "{:?} is not a hyphenated GUID",
            text
        )));
    }
    Uuid::parse_str(text).map_err(|e| Error::invalid_envelope(format!("{:?}: {}", text, e)))
}

/// Decodes the `$v` text of a Binary envelope.
pub(crate) fn decode_binary(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| Error::invalid_envelope(format!("invalid base64: {}", e)))
}

impl<N: JsonNavigator> JsonNavigator for TypedNavigator<N> {
    fn serialization_format(&self) -> SerializationFormat {
        self.inner.serialization_format()
    }

    fn root_node(&self) -> NavigatorNode {
        self.inner.root_node()
    }

    fn node_type(&self, node: NavigatorNode) -> Result<NodeType> {
        match self.envelope(node)? {
            Some((kind, _)) => Ok(kind),
            None => self.inner.node_type(node),
        }
    }

    fn number_value(&self, node: NavigatorNode) -> Result<Number64> {
        self.inner.number_value(node)
    }

    fn string_value(&self, node: NavigatorNode) -> Result<AnyString> {
        self.inner.string_value(node)
    }

    fn bool_value(&self, node: NavigatorNode) -> Result<bool> {
        self.inner.bool_value(node)
    }

    fn int8_value(&self, node: NavigatorNode) -> Result<i8> {
        match self.value_of(node, NodeType::Int8)? {
            Some(value) => self.integer(value, NodeType::Int8),
            None => self.inner.int8_value(node),
        }
    }

    fn int16_value(&self, node: NavigatorNode) -> Result<i16> {
        match self.value_of(node, NodeType::Int16)? {
            Some(value) => self.integer(value, NodeType::Int16),
            None => self.inner.int16_value(node),
        }
    }

    fn int32_value(&self, node: NavigatorNode) -> Result<i32> {
        match self.value_of(node, NodeType::Int32)? {
            Some(value) => self.integer(value, NodeType::Int32),
            None => self.inner.int32_value(node),
        }
    }

    fn int64_value(&self, node: NavigatorNode) -> Result<i64> {
        match self.value_of(node, NodeType::Int64)? {
            Some(value) => self.integer(value, NodeType::Int64),
            None => self.inner.int64_value(node),
        }
    }

    fn uint32_value(&self, node: NavigatorNode) -> Result<u32> {
        match self.value_of(node, NodeType::UInt32)? {
            Some(value) => self.integer(value, NodeType::UInt32),
            None => self.inner.uint32_value(node),
        }
    }

    fn float32_value(&self, node: NavigatorNode) -> Result<f32> {
        match self.value_of(node, NodeType::Float32)? {
            Some(value) => {
                let wide = self.float(value, NodeType::Float32)?;
                let narrow = wide as f32;
                if wide.is_finite() && !narrow.is_finite() {
                    return Err(Error::invalid_envelope(format!(
                        "{} is out of range for Float32",
                        wide
                    )));
                }
                Ok(narrow)
            }
            None => self.inner.float32_value(node),
        }
    }

    fn float64_value(&self, node: NavigatorNode) -> Result<f64> {
        match self.value_of(node, NodeType::Float64)? {
            Some(value) => self.float(value, NodeType::Float64),
            None => self.inner.float64_value(node),
        }
    }

    fn guid_value(&self, node: NavigatorNode) -> Result<Uuid> {
        match self.value_of(node, NodeType::Guid)? {
            Some(value) => parse_guid(self.text(value)?.as_str()),
            None => self.inner.guid_value(node),
        }
    }

    fn binary_value(&self, node: NavigatorNode) -> Result<ByteBuffer> {
        match self.value_of(node, NodeType::Binary)? {
            Some(value) => Ok(ByteBuffer::from(decode_binary(self.text(value)?.as_str())?)),
            None => self.inner.binary_value(node),
        }
    }

    fn try_get_buffered_string_value(&self, node: NavigatorNode) -> Option<Utf8Buffer> {
        self.inner.try_get_buffered_string_value(node)
    }

    /// Envelope payloads need decoding, so only native binary values qualify.
    fn try_get_buffered_binary_value(&self, node: NavigatorNode) -> Option<ByteBuffer> {
        match self.envelope(node) {
            Ok(None) => self.inner.try_get_buffered_binary_value(node),
            _ => None,
        }
    }

    fn array_item_count(&self, node: NavigatorNode) -> Result<usize> {
        self.inner.array_item_count(node)
    }

    fn array_item_at(&self, node: NavigatorNode, index: usize) -> Result<NavigatorNode> {
        self.inner.array_item_at(node, index)
    }

    fn array_items<'a>(&'a self, node: NavigatorNode) -> Result<NodeIter<'a>> {
        self.inner.array_items(node)
    }

    fn object_property_count(&self, node: NavigatorNode) -> Result<usize> {
        self.inner.object_property_count(node)
    }

    fn try_get_object_property(
        &self,
        node: NavigatorNode,
        name: &str,
    ) -> Result<Option<ObjectProperty>> {
        self.inner.try_get_object_property(node, name)
    }

    fn object_properties<'a>(&'a self, node: NavigatorNode) -> Result<PropertyIter<'a>> {
        self.inner.object_properties(node)
    }

    fn create_reader<'a>(&'a self, node: NavigatorNode) -> Result<Box<dyn JsonReader + 'a>> {
        Ok(Box::new(NodeReader::new(self, node)))
    }

    /// A binary subtree without envelopes reads the same typed or raw, so it
    /// goes to the inner navigator, which copies containers verbatim.
    fn write_node(&self, node: NavigatorNode, writer: &mut dyn JsonWriter) -> Result<()> {
        if self.inner.serialization_format() == SerializationFormat::Binary
            && !self.contains_envelope(node, 0)?
        {
            return self.inner.write_node(node, writer);
        }
        write_node_walk(self, node, writer)
    }

    fn max_depth(&self) -> usize {
        self.inner.max_depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{BinaryNavigator, TextNavigator};
    use crate::options::WriterOptions;
    use crate::types::TokenType;
    use crate::writer::{BinaryWriter, JsonWriter};

    fn typed(text: &str) -> TypedNavigator<TextNavigator> {
        TypedNavigator::new(TextNavigator::new(text).unwrap())
    }

    fn item(nav: &TypedNavigator<TextNavigator>, index: usize) -> NavigatorNode {
        nav.array_item_at(nav.root_node(), index).unwrap()
    }

    #[test]
    fn test_recognizes_each_kind() {
        let nav = typed(concat!(
            r#"[{"$t":8,"$v":-128},{"$v":127,"$t":8},{"$t":12,"$v":4294967295},"#,
            r#"{"$t":13,"$v":1.5},{"$t":14,"$v":"NaN"},{"$t":15,"$v":"AQID"},"#,
            r#"{"$t":16,"$v":"01234567-89ab-cdef-0123-456789abcdef"}]"#
        ));
        assert_eq!(nav.int8_value(item(&nav, 0)).unwrap(), -128);
        assert_eq!(nav.int8_value(item(&nav, 1)).unwrap(), 127);
        assert_eq!(nav.uint32_value(item(&nav, 2)).unwrap(), u32::MAX);
        assert_eq!(nav.float32_value(item(&nav, 3)).unwrap(), 1.5);
        assert!(nav.float64_value(item(&nav, 4)).unwrap().is_nan());
        assert_eq!(nav.binary_value(item(&nav, 5)).unwrap(), [1u8, 2, 3][..]);
        assert_eq!(
            nav.guid_value(item(&nav, 6)).unwrap(),
            Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef)
        );
        assert_eq!(nav.node_type(item(&nav, 6)).unwrap(), NodeType::Guid);
    }

    #[test]
    fn test_near_misses_stay_objects() {
        let nav = typed(concat!(
            r#"[{"$t":8},{"$t":8,"$v":1,"x":0},{"$t":4,"$v":"s"},{"$t":"8","$v":1},"#,
            r#"{"$t":8,"$v":"1"},{"$t":8,"$t":8},{"$T":8,"$v":1},{"$t":16,"$v":5}]"#
        ));
        for index in 0..8 {
            assert_eq!(
                nav.node_type(item(&nav, index)).unwrap(),
                NodeType::Object,
                "item {}",
                index
            );
        }
    }

    #[test]
    fn test_undecodable_values() {
        let nav = typed(concat!(
            r#"[{"$t":8,"$v":128},{"$t":12,"$v":-1},{"$t":15,"$v":"%%"},"#,
            r#"{"$t":16,"$v":"not-a-guid"},{"$t":14,"$v":"Inf"},{"$t":10,"$v":1.5}]"#
        ));
        assert!(matches!(nav.int8_value(item(&nav, 0)), Err(Error::InvalidEnvelope(_))));
        assert!(matches!(nav.uint32_value(item(&nav, 1)), Err(Error::InvalidEnvelope(_))));
        assert!(matches!(nav.binary_value(item(&nav, 2)), Err(Error::InvalidEnvelope(_))));
        assert!(matches!(nav.guid_value(item(&nav, 3)), Err(Error::InvalidEnvelope(_))));
        assert!(matches!(nav.float64_value(item(&nav, 4)), Err(Error::InvalidEnvelope(_))));
        assert!(matches!(nav.int32_value(item(&nav, 5)), Err(Error::InvalidEnvelope(_))));
    }

    #[test]
    fn test_wrong_accessor_on_envelope() {
        let nav = typed(r#"{"$t":9,"$v":3}"#);
        let root = nav.root_node();
        assert_eq!(nav.int16_value(root).unwrap(), 3);
        assert!(matches!(nav.int32_value(root), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_reader_emits_extended_tokens() {
        let nav = typed(r#"{"id":{"$t":10,"$v":7}}"#);
        let mut reader = nav.create_reader(nav.root_node()).unwrap();
        let mut tokens = Vec::new();
        while reader.read().unwrap() {
            tokens.push(reader.current_token_type());
        }
        assert_eq!(
            tokens,
            [
                TokenType::BeginObject,
                TokenType::FieldName,
                TokenType::Int32,
                TokenType::EndObject
            ]
        );
    }

    #[test]
    fn test_write_node_emits_native_tags() {
        let nav = typed(r#"[{"$t":8,"$v":-1}]"#);
        let mut writer = BinaryWriter::new(WriterOptions::new());
        nav.write_node(nav.root_node(), &mut writer).unwrap();
        assert_eq!(&*writer.result().unwrap(), &[0x80, 0xE1, 0xD8, 0xFF]);
    }

    #[test]
    fn test_binary_without_envelopes_copies_verbatim() {
        let source = vec![0x80, 0xE2, 0x02, 0xD2, 0xD1];
        let nav = TypedNavigator::new(BinaryNavigator::new(source.clone()).unwrap());
        let mut writer = BinaryWriter::new(WriterOptions::new());
        nav.write_node(nav.root_node(), &mut writer).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), source);
    }

    #[test]
    fn test_binary_with_envelope_is_rewritten_natively() {
        let mut source = BinaryWriter::new(WriterOptions::new());
        source.write_array_start().unwrap();
        source.write_object_start().unwrap();
        source.write_field_name(TYPE_FIELD).unwrap();
        source.write_number_value(Number64::from(10)).unwrap();
        source.write_field_name(VALUE_FIELD).unwrap();
        source.write_number_value(Number64::from(7)).unwrap();
        source.write_object_end().unwrap();
        source.write_array_end().unwrap();
        let inner = BinaryNavigator::new(source.into_bytes().unwrap()).unwrap();
        let nav = TypedNavigator::new(inner);
        let mut writer = BinaryWriter::new(WriterOptions::new());
        nav.write_node(nav.root_node(), &mut writer).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), [0x80, 0xE1, 0xDA, 7, 0, 0, 0]);
    }
}
