//! Navigator over the binary encoding.
//!
//! Nodes are byte offsets. Construction validates the format byte and that
//! the root value's header fits the buffer; everything else is decoded on
//! demand, and moving past a sibling only reads its header.

use super::{
    next_navigator_id, write_node_walk, JsonNavigator, NavigatorNode, NodeIter, ObjectProperty,
    PropertyIter,
};
use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::encoding::{self, marker, Header};
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::options::NavigatorOptions;
use crate::reader::binary::check_prefix;
use crate::reader::{BinaryReader, JsonReader};
use crate::types::NodeType;
use crate::utf8::Utf8Buffer;
use crate::writer::{JsonWriter, PreblittedScope};
use tracing::debug;
use uuid::Uuid;

/// Random access over a binary document.
pub struct BinaryNavigator {
    id: u64,
    data: ByteBuffer,
    max_depth: usize,
}

impl BinaryNavigator {
    /// # Errors
    ///
    /// When the format byte is missing or wrong, the root header is invalid,
    /// or bytes follow the root value.
    pub fn new(buffer: impl Into<ByteBuffer>) -> Result<Self> {
        BinaryNavigator::with_options(buffer, &NavigatorOptions::default())
    }

    pub fn with_options(buffer: impl Into<ByteBuffer>, options: &NavigatorOptions) -> Result<Self> {
        let data = buffer.into();
        check_prefix(&data)?;
        let root_len = encoding::value_len(&data, 1)?;
        encoding::read_header(&data, 1)?;
        if 1 + root_len != data.len() {
            return Err(Error::syntax(1 + root_len, "trailing bytes after the root value"));
        }
        debug!(format = ?SerializationFormat::Binary, len = data.len(), "created navigator");
        Ok(BinaryNavigator {
            id: next_navigator_id(),
            data,
            max_depth: options.max_depth,
        })
    }

    /// The document this navigator reads.
    #[must_use]
    pub fn buffer(&self) -> &ByteBuffer {
        &self.data
    }

    fn node(&self, offset: usize) -> NavigatorNode {
        NavigatorNode::new(self.id, offset)
    }

    fn locate(&self, node: NavigatorNode) -> Result<(usize, Header)> {
        let offset = node.position_in(self.id)?;
        Ok((offset, encoding::read_header(&self.data, offset)?))
    }

    fn located_type(node: NavigatorNode, header: &Header) -> NodeType {
        if node.is_field_name() {
            NodeType::FieldName
        } else {
            header.node_type
        }
    }

    fn fixed<const N: usize>(&self, node: NavigatorNode, expected: NodeType) -> Result<[u8; N]> {
        let (offset, header) = self.locate(node)?;
        encoding::read_fixed(&self.data, offset, &header, expected)
    }

    fn utf8(&self, offset: usize, header: &Header) -> Result<Utf8Buffer> {
        Utf8Buffer::new(self.data.slice(encoding::payload_range(offset, header))).map_err(|e| {
            match e {
                Error::InvalidUtf8 { offset: at } => Error::InvalidUtf8 {
                    offset: offset + header.header_len + at,
                },
                other => other,
            }
        })
    }

    fn string_header(&self, node: NavigatorNode) -> Result<(usize, Header)> {
        let (offset, header) = self.locate(node)?;
        if !marker::is_string(header.marker) {
            return Err(Error::node_mismatch("String", header.node_type));
        }
        Ok((offset, header))
    }

    /// Payload bounds of a container of the given kind.
    fn children(&self, node: NavigatorNode, kind: NodeType) -> Result<Children> {
        let (offset, header) = self.locate(node)?;
        let found = Self::located_type(node, &header);
        if found != kind {
            return Err(Error::type_mismatch(kind, found));
        }
        let start = offset + header.header_len;
        Ok(Children {
            pos: start,
            end: start + header.payload_len,
            count: header.count,
        })
    }

    /// Length of the value at `pos`, which must end by `end`.
    fn step(&self, pos: usize, end: usize) -> Result<usize> {
        let len = encoding::value_len(&self.data, pos)?;
        if pos + len > end {
            return Err(Error::truncated(pos, pos + len - end));
        }
        Ok(len)
    }

    /// Reads one name/value pair at `pos`, returning the property and the
    /// offset after it.
    fn property_at(&self, pos: usize, end: usize) -> Result<(ObjectProperty, usize)> {
        let name = encoding::read_header(&self.data, pos)?;
        if !marker::is_string(name.marker) {
            return Err(Error::invalid_marker(pos, name.marker));
        }
        let value_pos = pos + self.step(pos, end)?;
        if value_pos >= end {
            return Err(Error::syntax(value_pos, "object ends after a field name"));
        }
        let next = value_pos + self.step(value_pos, end)?;
        let property = ObjectProperty {
            name: NavigatorNode::field_name(self.id, pos),
            value: self.node(value_pos),
        };
        Ok((property, next))
    }
}

struct Children {
    pos: usize,
    end: usize,
    count: Option<usize>,
}

struct ItemIter<'a> {
    nav: &'a BinaryNavigator,
    pos: usize,
    end: usize,
}

impl Iterator for ItemIter<'_> {
    type Item = Result<NavigatorNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let pos = self.pos;
        match self.nav.step(pos, self.end) {
            Ok(len) => {
                self.pos += len;
                Some(Ok(self.nav.node(pos)))
            }
            Err(e) => {
                self.pos = self.end;
                Some(Err(e))
            }
        }
    }
}

struct PropertyIterImpl<'a> {
    nav: &'a BinaryNavigator,
    pos: usize,
    end: usize,
}

impl Iterator for PropertyIterImpl<'_> {
    type Item = Result<ObjectProperty>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        match self.nav.property_at(self.pos, self.end) {
            Ok((property, next)) => {
                self.pos = next;
                Some(Ok(property))
            }
            Err(e) => {
                self.pos = self.end;
                Some(Err(e))
            }
        }
    }
}

impl JsonNavigator for BinaryNavigator {
    fn serialization_format(&self) -> SerializationFormat {
        SerializationFormat::Binary
    }

    fn root_node(&self) -> NavigatorNode {
        self.node(1)
    }

    fn node_type(&self, node: NavigatorNode) -> Result<NodeType> {
        let (_, header) = self.locate(node)?;
        Ok(Self::located_type(node, &header))
    }

    fn number_value(&self, node: NavigatorNode) -> Result<Number64> {
        let (offset, header) = self.locate(node)?;
        encoding::read_number64(&self.data, offset, &header)
    }

    fn string_value(&self, node: NavigatorNode) -> Result<AnyString> {
        let (offset, header) = self.string_header(node)?;
        Ok(AnyString::from_utf8(self.utf8(offset, &header)?))
    }

    fn bool_value(&self, node: NavigatorNode) -> Result<bool> {
        let (_, header) = self.locate(node)?;
        match header.node_type {
            NodeType::True => Ok(true),
            NodeType::False => Ok(false),
            other => Err(Error::node_mismatch("True or False", other)),
        }
    }

    fn int8_value(&self, node: NavigatorNode) -> Result<i8> {
        Ok(i8::from_le_bytes(self.fixed(node, NodeType::Int8)?))
    }

    fn int16_value(&self, node: NavigatorNode) -> Result<i16> {
        Ok(i16::from_le_bytes(self.fixed(node, NodeType::Int16)?))
    }

    fn int32_value(&self, node: NavigatorNode) -> Result<i32> {
        Ok(i32::from_le_bytes(self.fixed(node, NodeType::Int32)?))
    }

    fn int64_value(&self, node: NavigatorNode) -> Result<i64> {
        Ok(i64::from_le_bytes(self.fixed(node, NodeType::Int64)?))
    }

    fn uint32_value(&self, node: NavigatorNode) -> Result<u32> {
        Ok(u32::from_le_bytes(self.fixed(node, NodeType::UInt32)?))
    }

    fn float32_value(&self, node: NavigatorNode) -> Result<f32> {
        Ok(f32::from_le_bytes(self.fixed(node, NodeType::Float32)?))
    }

    fn float64_value(&self, node: NavigatorNode) -> Result<f64> {
        Ok(f64::from_le_bytes(self.fixed(node, NodeType::Float64)?))
    }

    fn guid_value(&self, node: NavigatorNode) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.fixed(node, NodeType::Guid)?))
    }

    fn binary_value(&self, node: NavigatorNode) -> Result<ByteBuffer> {
        let (offset, header) = self.locate(node)?;
        if header.node_type != NodeType::Binary {
            return Err(Error::type_mismatch(NodeType::Binary, header.node_type));
        }
        Ok(self.data.slice(encoding::payload_range(offset, &header)))
    }

    fn try_get_buffered_string_value(&self, node: NavigatorNode) -> Option<Utf8Buffer> {
        let (offset, header) = self.string_header(node).ok()?;
        self.utf8(offset, &header).ok()
    }

    fn try_get_buffered_binary_value(&self, node: NavigatorNode) -> Option<ByteBuffer> {
        self.binary_value(node).ok()
    }

    fn array_item_count(&self, node: NavigatorNode) -> Result<usize> {
        let children = self.children(node, NodeType::Array)?;
        if let Some(count) = children.count {
            return Ok(count);
        }
        let mut count = 0;
        let mut pos = children.pos;
        while pos < children.end {
            pos += self.step(pos, children.end)?;
            count += 1;
        }
        Ok(count)
    }

    fn array_item_at(&self, node: NavigatorNode, index: usize) -> Result<NavigatorNode> {
        let children = self.children(node, NodeType::Array)?;
        if let Some(len) = children.count.filter(|&len| index >= len) {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let mut pos = children.pos;
        for skipped in 0..index {
            if pos >= children.end {
                return Err(Error::IndexOutOfBounds {
                    index,
                    len: skipped,
                });
            }
            pos += self.step(pos, children.end)?;
        }
        if pos >= children.end {
            return Err(Error::IndexOutOfBounds { index, len: index });
        }
        Ok(self.node(pos))
    }

    fn array_items<'a>(&'a self, node: NavigatorNode) -> Result<NodeIter<'a>> {
        let children = self.children(node, NodeType::Array)?;
        Ok(Box::new(ItemIter {
            nav: self,
            pos: children.pos,
            end: children.end,
        }))
    }

    fn object_property_count(&self, node: NavigatorNode) -> Result<usize> {
        let children = self.children(node, NodeType::Object)?;
        if let Some(count) = children.count {
            return Ok(count);
        }
        let mut count = 0;
        let mut pos = children.pos;
        while pos < children.end {
            pos = self.property_at(pos, children.end)?.1;
            count += 1;
        }
        Ok(count)
    }

    fn try_get_object_property(
        &self,
        node: NavigatorNode,
        name: &str,
    ) -> Result<Option<ObjectProperty>> {
        let children = self.children(node, NodeType::Object)?;
        let mut found = None;
        let mut pos = children.pos;
        while pos < children.end {
            let (property, next) = self.property_at(pos, children.end)?;
            let header = encoding::read_header(&self.data, pos)?;
            if self.data[encoding::payload_range(pos, &header)] == *name.as_bytes() {
                found = Some(property);
            }
            pos = next;
        }
        Ok(found)
    }

    fn object_properties<'a>(&'a self, node: NavigatorNode) -> Result<PropertyIter<'a>> {
        let children = self.children(node, NodeType::Object)?;
        Ok(Box::new(PropertyIterImpl {
            nav: self,
            pos: children.pos,
            end: children.end,
        }))
    }

    fn create_reader<'a>(&'a self, node: NavigatorNode) -> Result<Box<dyn JsonReader + 'a>> {
        let offset = node.position_in(self.id)?;
        let reader =
            BinaryReader::for_value(self.data.clone(), offset)?.with_max_depth(self.max_depth);
        Ok(Box::new(reader))
    }

    /// Containers written to a binary writer are copied as encoded bytes.
    fn write_node(&self, node: NavigatorNode, writer: &mut dyn JsonWriter) -> Result<()> {
        let (offset, header) = self.locate(node)?;
        if node.is_field_name() || !header.node_type.is_container() {
            return write_node_walk(self, node, writer);
        }
        match writer.as_typed_binary() {
            Some(binary) => {
                let len = encoding::value_len(&self.data, offset)?;
                let scope =
                    PreblittedScope::new(self.data.slice(offset..offset + len), header.node_type);
                binary.write_preblitted_scope(&scope)
            }
            None => write_node_walk(self, node, writer),
        }
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }
}
