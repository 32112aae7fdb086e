//! Random-access navigation over a complete document.
//!
//! A [`JsonNavigator`] is built once over an immutable buffer and hands out
//! [`NavigatorNode`] handles. Every accessor takes a node, so any number of
//! callers can walk the same document concurrently without a shared cursor.
//!
//! ```rust
//! use dual_json::{create_navigator, NodeType};
//!
//! let nav = create_navigator(br#"{"a":1,"b":[true,null,"x"]}"#.to_vec()).unwrap();
//! let root = nav.root_node();
//! let b = nav.try_get_object_property(root, "b").unwrap().unwrap();
//! let x = nav.array_item_at(b.value, 2).unwrap();
//! assert_eq!(nav.node_type(x).unwrap(), NodeType::String);
//! assert_eq!(nav.string_value(x).unwrap(), "x");
//! ```

pub mod binary;
pub mod node_reader;
pub mod text;

pub use binary::BinaryNavigator;
pub use node_reader::NodeReader;
pub use text::TextNavigator;

use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::reader::JsonReader;
use crate::types::NodeType;
use crate::utf8::Utf8Buffer;
use crate::writer::JsonWriter;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_NAVIGATOR_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_navigator_id() -> u64 {
    NEXT_NAVIGATOR_ID.fetch_add(1, Ordering::Relaxed)
}

/// A handle to one value (or field name) of a navigator's document.
///
/// Nodes are plain data: copying one is free and it stays valid as long as
/// the navigator that produced it. Passing it to any other navigator fails
/// with [`Error::ForeignNode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NavigatorNode {
    owner: u64,
    position: usize,
    is_field_name: bool,
}

impl NavigatorNode {
    pub(crate) fn new(owner: u64, position: usize) -> Self {
        NavigatorNode {
            owner,
            position,
            is_field_name: false,
        }
    }

    pub(crate) fn field_name(owner: u64, position: usize) -> Self {
        NavigatorNode {
            owner,
            position,
            is_field_name: true,
        }
    }

    /// The position inside the owning navigator, after checking ownership.
    pub(crate) fn position_in(self, owner: u64) -> Result<usize> {
        if self.owner == owner {
            Ok(self.position)
        } else {
            Err(Error::ForeignNode)
        }
    }

    pub(crate) fn is_field_name(self) -> bool {
        self.is_field_name
    }
}

/// One property of an object: the field name node and its value node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectProperty {
    pub name: NavigatorNode,
    pub value: NavigatorNode,
}

pub type NodeIter<'a> = Box<dyn Iterator<Item = Result<NavigatorNode>> + 'a>;
pub type PropertyIter<'a> = Box<dyn Iterator<Item = Result<ObjectProperty>> + 'a>;

/// Random access to the nodes of one document.
pub trait JsonNavigator: Send + Sync {
    fn serialization_format(&self) -> SerializationFormat;

    fn root_node(&self) -> NavigatorNode;

    fn node_type(&self, node: NavigatorNode) -> Result<NodeType>;

    fn number_value(&self, node: NavigatorNode) -> Result<Number64>;

    /// The value of a `String` or `FieldName` node.
    fn string_value(&self, node: NavigatorNode) -> Result<AnyString>;

    fn bool_value(&self, node: NavigatorNode) -> Result<bool>;

    fn int8_value(&self, node: NavigatorNode) -> Result<i8>;
    fn int16_value(&self, node: NavigatorNode) -> Result<i16>;
    fn int32_value(&self, node: NavigatorNode) -> Result<i32>;
    fn int64_value(&self, node: NavigatorNode) -> Result<i64>;
    fn uint32_value(&self, node: NavigatorNode) -> Result<u32>;
    fn float32_value(&self, node: NavigatorNode) -> Result<f32>;
    fn float64_value(&self, node: NavigatorNode) -> Result<f64>;
    fn guid_value(&self, node: NavigatorNode) -> Result<Uuid>;
    fn binary_value(&self, node: NavigatorNode) -> Result<ByteBuffer>;

    /// The UTF-8 of a string or field name as stored, when no unescaping is
    /// needed. Never copies.
    fn try_get_buffered_string_value(&self, node: NavigatorNode) -> Option<Utf8Buffer>;

    fn try_get_buffered_binary_value(&self, node: NavigatorNode) -> Option<ByteBuffer>;

    fn array_item_count(&self, node: NavigatorNode) -> Result<usize>;

    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] when `index` is not below the item count.
    fn array_item_at(&self, node: NavigatorNode, index: usize) -> Result<NavigatorNode>;

    /// The items in order. Each call starts a fresh pass.
    fn array_items<'a>(&'a self, node: NavigatorNode) -> Result<NodeIter<'a>>;

    fn object_property_count(&self, node: NavigatorNode) -> Result<usize>;

    /// Looks a property up by exact, case-sensitive name. When a name occurs
    /// more than once the last occurrence wins.
    fn try_get_object_property(
        &self,
        node: NavigatorNode,
        name: &str,
    ) -> Result<Option<ObjectProperty>>;

    /// The properties in encoding order, duplicates included.
    fn object_properties<'a>(&'a self, node: NavigatorNode) -> Result<PropertyIter<'a>>;

    /// A reader positioned before the first token of `node`.
    fn create_reader<'a>(&'a self, node: NavigatorNode) -> Result<Box<dyn JsonReader + 'a>>;

    /// Writes the subtree at `node` to `writer`.
    fn write_node(&self, node: NavigatorNode, writer: &mut dyn JsonWriter) -> Result<()> {
        write_node_walk(self, node, writer)
    }

    /// Deepest nesting accepted by recursive walks.
    fn max_depth(&self) -> usize {
        crate::options::NavigatorOptions::default().max_depth
    }
}

/// Writes a subtree through the navigator's accessors, depth first.
pub(crate) fn write_node_walk<N: JsonNavigator + ?Sized>(
    nav: &N,
    node: NavigatorNode,
    writer: &mut dyn JsonWriter,
) -> Result<()> {
    walk(nav, node, writer, 0)
}

fn walk<N: JsonNavigator + ?Sized>(
    nav: &N,
    node: NavigatorNode,
    writer: &mut dyn JsonWriter,
    depth: usize,
) -> Result<()> {
    match nav.node_type(node)? {
        NodeType::Null => writer.write_null_value(),
        NodeType::False => writer.write_bool_value(false),
        NodeType::True => writer.write_bool_value(true),
        NodeType::Number64 => writer.write_number_value(nav.number_value(node)?),
        NodeType::String => writer.write_string_value(nav.string_value(node)?.as_str()),
        NodeType::FieldName => writer.write_field_name(nav.string_value(node)?.as_str()),
        NodeType::Int8 => writer.write_int8_value(nav.int8_value(node)?),
        NodeType::Int16 => writer.write_int16_value(nav.int16_value(node)?),
        NodeType::Int32 => writer.write_int32_value(nav.int32_value(node)?),
        NodeType::Int64 => writer.write_int64_value(nav.int64_value(node)?),
        NodeType::UInt32 => writer.write_uint32_value(nav.uint32_value(node)?),
        NodeType::Float32 => writer.write_float32_value(nav.float32_value(node)?),
        NodeType::Float64 => writer.write_float64_value(nav.float64_value(node)?),
        NodeType::Guid => writer.write_guid_value(nav.guid_value(node)?),
        NodeType::Binary => writer.write_binary_value(&nav.binary_value(node)?),
        NodeType::Array => {
            check_depth(nav, depth)?;
            writer.write_array_start()?;
            for item in nav.array_items(node)? {
                walk(nav, item?, writer, depth + 1)?;
            }
            writer.write_array_end()
        }
        NodeType::Object => {
            check_depth(nav, depth)?;
            writer.write_object_start()?;
            for property in nav.object_properties(node)? {
                let property = property?;
                writer.write_field_name(nav.string_value(property.name)?.as_str())?;
                walk(nav, property.value, writer, depth + 1)?;
            }
            writer.write_object_end()
        }
        NodeType::Unknown => Err(Error::node_mismatch("a known node kind", NodeType::Unknown)),
    }
}

fn check_depth<N: JsonNavigator + ?Sized>(nav: &N, depth: usize) -> Result<()> {
    if depth >= nav.max_depth() {
        Err(Error::DepthLimitExceeded(nav.max_depth()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ownership() {
        let node = NavigatorNode::new(7, 3);
        assert_eq!(node.position_in(7).unwrap(), 3);
        assert_eq!(node.position_in(8), Err(Error::ForeignNode));
        assert!(NavigatorNode::field_name(7, 3).is_field_name());
        assert_ne!(node, NavigatorNode::field_name(7, 3));
    }

    #[test]
    fn test_navigator_ids_are_unique() {
        let first = next_navigator_id();
        let second = next_navigator_id();
        assert_ne!(first, second);
    }
}
