//! Navigator over JSON text.
//!
//! Construction runs the text reader once and records every token's span in
//! a flat preorder arena. Nothing is decoded up front: strings keep their
//! escapes and numbers stay as text until an accessor asks for them.

use super::{
    next_navigator_id, JsonNavigator, NavigatorNode, NodeIter, ObjectProperty, PropertyIter,
};
use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::options::NavigatorOptions;
use crate::reader::text::parse_number;
use crate::reader::{JsonReader, TextReader};
use crate::types::{NodeType, TokenType};
use crate::utf8::Utf8Buffer;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct TextNode {
    kind: NodeType,
    /// Token text; string bodies exclude the quotes, containers span from
    /// the opening to just past the closing bracket.
    start: usize,
    end: usize,
    escaped: bool,
    /// Items, or properties for objects.
    count: usize,
    /// Arena index just past this node's subtree.
    next: usize,
}

/// Random access over a JSON text document.
pub struct TextNavigator {
    id: u64,
    data: ByteBuffer,
    nodes: Vec<TextNode>,
    max_depth: usize,
}

impl TextNavigator {
    /// # Errors
    ///
    /// Any syntax error in the document.
    pub fn new(buffer: impl Into<ByteBuffer>) -> Result<Self> {
        TextNavigator::with_options(buffer, &NavigatorOptions::default())
    }

    pub fn with_options(buffer: impl Into<ByteBuffer>, options: &NavigatorOptions) -> Result<Self> {
        let data = buffer.into();
        let mut reader = TextReader::with_max_depth(data.clone(), options.max_depth);
        let mut nodes: Vec<TextNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        while reader.read()? {
            let token = reader.current_token_type();
            let span = reader.token_span();
            let index = nodes.len();
            let kind = match token {
                TokenType::EndArray | TokenType::EndObject => {
                    if let Some(container) = open.pop() {
                        nodes[container].end = span.end;
                        nodes[container].next = index;
                    }
                    continue;
                }
                TokenType::FieldName => NodeType::FieldName,
                TokenType::BeginArray => NodeType::Array,
                TokenType::BeginObject => NodeType::Object,
                TokenType::String => NodeType::String,
                TokenType::Number => NodeType::Number64,
                TokenType::True => NodeType::True,
                TokenType::False => NodeType::False,
                TokenType::Null => NodeType::Null,
                other => return Err(Error::type_mismatch("a JSON text token", other)),
            };
            if kind != NodeType::FieldName {
                if let Some(&parent) = open.last() {
                    nodes[parent].count += 1;
                }
            }
            nodes.push(TextNode {
                kind,
                start: span.start,
                end: span.end,
                escaped: reader.token_escaped(),
                count: 0,
                next: index + 1,
            });
            if kind.is_container() {
                open.push(index);
            }
        }

        debug!(
            format = ?SerializationFormat::Text,
            len = data.len(),
            nodes = nodes.len(),
            "created navigator"
        );
        Ok(TextNavigator {
            id: next_navigator_id(),
            data,
            nodes,
            max_depth: options.max_depth,
        })
    }

    fn node(&self, index: usize) -> NavigatorNode {
        NavigatorNode::new(self.id, index)
    }

    fn entry(&self, node: NavigatorNode) -> Result<(usize, &TextNode)> {
        let index = node.position_in(self.id)?;
        let entry = self
            .nodes
            .get(index)
            .ok_or(Error::IndexOutOfBounds {
                index,
                len: self.nodes.len(),
            })?;
        Ok((index, entry))
    }

    fn expect(&self, node: NavigatorNode, kind: NodeType) -> Result<(usize, &TextNode)> {
        let (index, entry) = self.entry(node)?;
        if entry.kind != kind {
            return Err(Error::type_mismatch(kind, entry.kind));
        }
        Ok((index, entry))
    }

    fn string_entry(&self, node: NavigatorNode) -> Result<&TextNode> {
        let (_, entry) = self.entry(node)?;
        match entry.kind {
            NodeType::String | NodeType::FieldName => Ok(entry),
            other => Err(Error::node_mismatch("String", other)),
        }
    }

    fn mismatch<T>(&self, node: NavigatorNode, expected: NodeType) -> Result<T> {
        let (_, entry) = self.entry(node)?;
        Err(Error::type_mismatch(expected, entry.kind))
    }

    fn name_matches(&self, entry: &TextNode, name: &str) -> Result<bool> {
        let raw = &self.data[entry.start..entry.end];
        if !entry.escaped {
            return Ok(raw == name.as_bytes());
        }
        Ok(crate::escape::unescape(raw, entry.start)? == name)
    }
}

struct ItemIter<'a> {
    nav: &'a TextNavigator,
    next: usize,
    remaining: usize,
}

impl Iterator for ItemIter<'_> {
    type Item = Result<NavigatorNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let index = self.next;
        self.next = self.nav.nodes.get(index).map_or(index + 1, |n| n.next);
        Some(Ok(self.nav.node(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

struct PropertyIterImpl<'a> {
    nav: &'a TextNavigator,
    next: usize,
    remaining: usize,
}

impl Iterator for PropertyIterImpl<'_> {
    type Item = Result<ObjectProperty>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let name = self.next;
        let value = name + 1;
        self.next = self.nav.nodes.get(value).map_or(value + 1, |n| n.next);
        Some(Ok(ObjectProperty {
            name: self.nav.node(name),
            value: self.nav.node(value),
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl JsonNavigator for TextNavigator {
    fn serialization_format(&self) -> SerializationFormat {
        SerializationFormat::Text
    }

    fn root_node(&self) -> NavigatorNode {
        self.node(0)
    }

    fn node_type(&self, node: NavigatorNode) -> Result<NodeType> {
        Ok(self.entry(node)?.1.kind)
    }

    fn number_value(&self, node: NavigatorNode) -> Result<Number64> {
        let (_, entry) = self.expect(node, NodeType::Number64)?;
        parse_number(&self.data[entry.start..entry.end], entry.start)
    }

    fn string_value(&self, node: NavigatorNode) -> Result<AnyString> {
        let entry = self.string_entry(node)?;
        let bytes = Utf8Buffer::from_validated(self.data.slice(entry.start..entry.end));
        if entry.escaped {
            AnyString::from_escaped_utf8(bytes)
        } else {
            Ok(AnyString::from_utf8(bytes))
        }
    }

    fn bool_value(&self, node: NavigatorNode) -> Result<bool> {
        let (_, entry) = self.entry(node)?;
        match entry.kind {
            NodeType::True => Ok(true),
            NodeType::False => Ok(false),
            other => Err(Error::node_mismatch("True or False", other)),
        }
    }

    fn int8_value(&self, node: NavigatorNode) -> Result<i8> {
        self.mismatch(node, NodeType::Int8)
    }

    fn int16_value(&self, node: NavigatorNode) -> Result<i16> {
        self.mismatch(node, NodeType::Int16)
    }

    fn int32_value(&self, node: NavigatorNode) -> Result<i32> {
        self.mismatch(node, NodeType::Int32)
    }

    fn int64_value(&self, node: NavigatorNode) -> Result<i64> {
        self.mismatch(node, NodeType::Int64)
    }

    fn uint32_value(&self, node: NavigatorNode) -> Result<u32> {
        self.mismatch(node, NodeType::UInt32)
    }

    fn float32_value(&self, node: NavigatorNode) -> Result<f32> {
        self.mismatch(node, NodeType::Float32)
    }

    fn float64_value(&self, node: NavigatorNode) -> Result<f64> {
        self.mismatch(node, NodeType::Float64)
    }

    fn guid_value(&self, node: NavigatorNode) -> Result<Uuid> {
        self.mismatch(node, NodeType::Guid)
    }

    fn binary_value(&self, node: NavigatorNode) -> Result<ByteBuffer> {
        self.mismatch(node, NodeType::Binary)
    }

    fn try_get_buffered_string_value(&self, node: NavigatorNode) -> Option<Utf8Buffer> {
        let entry = self.string_entry(node).ok()?;
        if entry.escaped {
            return None;
        }
        Some(Utf8Buffer::from_validated(
            self.data.slice(entry.start..entry.end),
        ))
    }

    fn try_get_buffered_binary_value(&self, _node: NavigatorNode) -> Option<ByteBuffer> {
        None
    }

    fn array_item_count(&self, node: NavigatorNode) -> Result<usize> {
        Ok(self.expect(node, NodeType::Array)?.1.count)
    }

    fn array_item_at(&self, node: NavigatorNode, index: usize) -> Result<NavigatorNode> {
        let (position, entry) = self.expect(node, NodeType::Array)?;
        if index >= entry.count {
            return Err(Error::IndexOutOfBounds {
                index,
                len: entry.count,
            });
        }
        let mut child = position + 1;
        for _ in 0..index {
            child = self.nodes[child].next;
        }
        Ok(self.node(child))
    }

    fn array_items<'a>(&'a self, node: NavigatorNode) -> Result<NodeIter<'a>> {
        let (position, entry) = self.expect(node, NodeType::Array)?;
        Ok(Box::new(ItemIter {
            nav: self,
            next: position + 1,
            remaining: entry.count,
        }))
    }

    fn object_property_count(&self, node: NavigatorNode) -> Result<usize> {
        Ok(self.expect(node, NodeType::Object)?.1.count)
    }

    fn try_get_object_property(
        &self,
        node: NavigatorNode,
        name: &str,
    ) -> Result<Option<ObjectProperty>> {
        let (position, entry) = self.expect(node, NodeType::Object)?;
        let mut found = None;
        let mut index = position + 1;
        for _ in 0..entry.count {
            let value = index + 1;
            if self.name_matches(&self.nodes[index], name)? {
                found = Some(ObjectProperty {
                    name: self.node(index),
                    value: self.node(value),
                });
            }
            index = self.nodes[value].next;
        }
        Ok(found)
    }

    fn object_properties<'a>(&'a self, node: NavigatorNode) -> Result<PropertyIter<'a>> {
        let (position, entry) = self.expect(node, NodeType::Object)?;
        Ok(Box::new(PropertyIterImpl {
            nav: self,
            next: position + 1,
            remaining: entry.count,
        }))
    }

    fn create_reader<'a>(&'a self, node: NavigatorNode) -> Result<Box<dyn JsonReader + 'a>> {
        let (_, entry) = self.entry(node)?;
        let span = match entry.kind {
            NodeType::String | NodeType::FieldName => entry.start - 1..entry.end + 1,
            _ => entry.start..entry.end,
        };
        Ok(Box::new(TextReader::with_max_depth(
            self.data.slice(span),
            self.max_depth,
        )))
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }
}
