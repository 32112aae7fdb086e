//! Serde deserialization from a navigator node.
//!
//! [`NodeDeserializer`] drives a serde visitor straight off a
//! [`JsonNavigator`], so only the parts of the document the target type asks
//! for are decoded. Ignored fields are skipped without touching their bytes.
//!
//! Strings are handed to visitors as short-lived borrows, so targets must own
//! their data ([`serde::de::DeserializeOwned`]).
//!
//! Extended kinds reach visitors through their natural serde width: an
//! `Int16` node calls `visit_i16`, a `Guid` node calls `visit_str` with the
//! hyphenated form, and a `Binary` node calls `visit_byte_buf`.
//!
//! ## Usage
//!
//! ```rust
//! use dual_json::from_slice;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Data { x: i32, y: i32 }
//!
//! let data: Data = from_slice(br#"{"x": 1, "y": 2, "z": [1, 2, 3]}"#).unwrap();
//! assert_eq!(data, Data { x: 1, y: 2 });
//! ```

use crate::error::{Error, Result};
use crate::navigator::{JsonNavigator, NavigatorNode, NodeIter, PropertyIter};
use crate::number::Number64;
use crate::types::NodeType;
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};

/// Deserializes the subtree at one navigator node.
pub struct NodeDeserializer<'n, N: JsonNavigator + ?Sized> {
    nav: &'n N,
    node: NavigatorNode,
    depth: usize,
}

impl<'n, N: JsonNavigator + ?Sized> NodeDeserializer<'n, N> {
    pub fn new(nav: &'n N, node: NavigatorNode) -> Self {
        NodeDeserializer { nav, node, depth: 0 }
    }

    fn child(&self, node: NavigatorNode) -> Self {
        NodeDeserializer {
            nav: self.nav,
            node,
            depth: self.depth + 1,
        }
    }

    fn enter(&self) -> Result<()> {
        if self.depth >= self.nav.max_depth() {
            Err(Error::DepthLimitExceeded(self.nav.max_depth()))
        } else {
            Ok(())
        }
    }
}

impl<'de, 'n, N: JsonNavigator + ?Sized> de::Deserializer<'de> for NodeDeserializer<'n, N> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let nav = self.nav;
        let node = self.node;
        match nav.node_type(node)? {
            NodeType::Null => visitor.visit_unit(),
            NodeType::False => visitor.visit_bool(false),
            NodeType::True => visitor.visit_bool(true),
            NodeType::Number64 => match nav.number_value(node)? {
                Number64::Int(i) => visitor.visit_i64(i),
                Number64::Double(f) => visitor.visit_f64(f),
            },
            NodeType::String | NodeType::FieldName => {
                visitor.visit_str(nav.string_value(node)?.as_str())
            }
            NodeType::Int8 => visitor.visit_i8(nav.int8_value(node)?),
            NodeType::Int16 => visitor.visit_i16(nav.int16_value(node)?),
            NodeType::Int32 => visitor.visit_i32(nav.int32_value(node)?),
            NodeType::Int64 => visitor.visit_i64(nav.int64_value(node)?),
            NodeType::UInt32 => visitor.visit_u32(nav.uint32_value(node)?),
            NodeType::Float32 => visitor.visit_f32(nav.float32_value(node)?),
            NodeType::Float64 => visitor.visit_f64(nav.float64_value(node)?),
            NodeType::Guid => visitor.visit_str(&nav.guid_value(node)?.hyphenated().to_string()),
            NodeType::Binary => visitor.visit_byte_buf(nav.binary_value(node)?.to_vec()),
            NodeType::Array => {
                self.enter()?;
                visitor.visit_seq(SeqDeserializer {
                    items: nav.array_items(node)?,
                    parent: self,
                })
            }
            NodeType::Object => {
                self.enter()?;
                visitor.visit_map(MapDeserializer {
                    properties: nav.object_properties(node)?,
                    value: None,
                    parent: self,
                })
            }
            NodeType::Unknown => Err(Error::node_mismatch("a value node", NodeType::Unknown)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.nav.node_type(self.node)? {
            NodeType::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let nav = self.nav;
        match nav.node_type(self.node)? {
            NodeType::String => {
                let variant: de::value::StringDeserializer<Error> =
                    nav.string_value(self.node)?.into_string().into_deserializer();
                visitor.visit_enum(variant)
            }
            NodeType::Object => {
                let mut properties = nav.object_properties(self.node)?;
                let property = match (properties.next(), properties.next()) {
                    (Some(property), None) => property?,
                    _ => {
                        return Err(Error::custom(
                            "an enum object must have exactly one property",
                        ))
                    }
                };
                self.enter()?;
                visitor.visit_enum(EnumDeserializer {
                    name: self.child(property.name),
                    value: self.child(property.value),
                })
            }
            other => Err(Error::node_mismatch("a string or an object", other)),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct identifier
    }
}

struct SeqDeserializer<'n, N: JsonNavigator + ?Sized> {
    items: NodeIter<'n>,
    parent: NodeDeserializer<'n, N>,
}

impl<'de, 'n, N: JsonNavigator + ?Sized> de::SeqAccess<'de> for SeqDeserializer<'n, N> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(item) => seed.deserialize(self.parent.child(item?)).map(Some),
            None => Ok(None),
        }
    }
}

struct MapDeserializer<'n, N: JsonNavigator + ?Sized> {
    properties: PropertyIter<'n>,
    value: Option<NavigatorNode>,
    parent: NodeDeserializer<'n, N>,
}

impl<'de, 'n, N: JsonNavigator + ?Sized> de::MapAccess<'de> for MapDeserializer<'n, N> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.properties.next() {
            Some(property) => {
                let property = property?;
                self.value = Some(property.value);
                seed.deserialize(self.parent.child(property.name)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(self.parent.child(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

struct EnumDeserializer<'n, N: JsonNavigator + ?Sized> {
    name: NodeDeserializer<'n, N>,
    value: NodeDeserializer<'n, N>,
}

impl<'de, 'n, N: JsonNavigator + ?Sized> de::EnumAccess<'de> for EnumDeserializer<'n, N> {
    type Error = Error;
    type Variant = NodeDeserializer<'n, N>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(self.name)?;
        Ok((variant, self.value))
    }
}

impl<'de, 'n, N: JsonNavigator + ?Sized> de::VariantAccess<'de> for NodeDeserializer<'n, N> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.nav.node_type(self.node)? {
            NodeType::Null => Ok(()),
            other => Err(Error::node_mismatch("null for a unit variant", other)),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{BinaryNavigator, TextNavigator};
    use crate::options::WriterOptions;
    use crate::writer::{BinaryWriter, JsonWriter};
    use crate::{TypedNavigator, Value};
    use serde::de::DeserializeOwned;
    use serde::Deserialize;
    use std::collections::HashMap;

    fn from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
        let nav = TextNavigator::new(text)?;
        T::deserialize(NodeDeserializer::new(&nav, nav.root_node()))
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Shape {
        Empty,
        Circle(f64),
        Line(i32, i32),
        Rect { w: u8, h: u8 },
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Record {
        name: String,
        tags: Vec<String>,
        score: Option<f32>,
        shapes: Vec<Shape>,
    }

    #[test]
    fn test_struct_with_enums() {
        let record: Record = from_text(
            r#"{"name":"n","tags":["a"],"score":null,"unused":{"deep":[1,2]},
                "shapes":["Empty",{"Circle":2.0},{"Line":[1,2]},{"Rect":{"w":1,"h":2}}]}"#,
        )
        .unwrap();
        assert_eq!(
            record,
            Record {
                name: "n".to_string(),
                tags: vec!["a".to_string()],
                score: None,
                shapes: vec![
                    Shape::Empty,
                    Shape::Circle(2.0),
                    Shape::Line(1, 2),
                    Shape::Rect { w: 1, h: 2 }
                ],
            }
        );
    }

    #[test]
    fn test_enum_object_with_two_properties() {
        assert!(from_text::<Shape>(r#"{"Circle":1.0,"Empty":null}"#).is_err());
    }

    mod serde_bytes_vec {
        use serde::Deserializer;

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
            struct BytesVisitor;
            impl<'de> serde::de::Visitor<'de> for BytesVisitor {
                type Value = Vec<u8>;
                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    f.write_str("bytes")
                }
                fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
                    Ok(v)
                }
            }
            d.deserialize_byte_buf(BytesVisitor)
        }
    }

    #[test]
    fn test_extended_kinds_from_binary() {
        let mut writer = BinaryWriter::new(WriterOptions::new());
        writer.write_object_start().unwrap();
        writer.write_field_name("small").unwrap();
        writer.write_int8_value(-3).unwrap();
        writer.write_field_name("blob").unwrap();
        writer.write_binary_value(&[9, 8]).unwrap();
        writer.write_object_end().unwrap();
        let nav = BinaryNavigator::new(writer.into_bytes().unwrap()).unwrap();

        #[derive(Deserialize)]
        struct Narrow {
            small: i64,
            #[serde(with = "serde_bytes_vec")]
            blob: Vec<u8>,
        }

        let narrow: Narrow =
            Narrow::deserialize(NodeDeserializer::new(&nav, nav.root_node())).unwrap();
        assert_eq!(narrow.small, -3);
        assert_eq!(narrow.blob, vec![9, 8]);

        let value = Value::deserialize(NodeDeserializer::new(&nav, nav.root_node())).unwrap();
        assert_eq!(value.get("small"), Some(&Value::Int8(-3)));
        assert_eq!(value.get("blob"), Some(&Value::Binary(vec![9, 8])));
    }

    #[test]
    fn test_guid_envelope_as_string() {
        let nav = TypedNavigator::new(
            TextNavigator::new(r#"{"$t":16,"$v":"6ba7b810-9dad-11d1-80b4-00c04fd430c8"}"#)
                .unwrap(),
        );
        let text = String::deserialize(NodeDeserializer::new(&nav, nav.root_node())).unwrap();
        assert_eq!(text, "6ba7b810-9dad-11d1-80b4-00c04fd430c8");
    }

    #[test]
    fn test_maps_and_mismatches() {
        let map: HashMap<String, i64> = from_text(r#"{"a":1,"b":2}"#).unwrap();
        assert_eq!(map["b"], 2);
        assert!(from_text::<Vec<i32>>(r#"{"a":1}"#).is_err());
        assert!(from_text::<i32>("1.5").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let nav = TextNavigator::new("[[[]]]").unwrap();
        let mut de = NodeDeserializer::new(&nav, nav.root_node());
        de.depth = nav.max_depth();
        assert_eq!(
            Vec::<Vec<Vec<u8>>>::deserialize(de).unwrap_err(),
            Error::DepthLimitExceeded(nav.max_depth())
        );
    }
}
