//! A reader that walks a navigator subtree.
//!
//! Emits the same token stream a format reader would, but takes every node
//! kind from [`JsonNavigator::node_type`], so navigators that reinterpret
//! nodes (such as the typed-envelope navigator) surface their kinds as tokens.

use super::{JsonNavigator, NavigatorNode, NodeIter, PropertyIter};
use crate::any_string::AnyString;
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::reader::JsonReader;
use crate::types::{NodeType, TokenType};
use crate::utf8::Utf8Buffer;
use uuid::Uuid;

enum Frame<'a> {
    Array(NodeIter<'a>),
    Object {
        properties: PropertyIter<'a>,
        pending_value: Option<NavigatorNode>,
    },
}

/// Reads the subtree under one navigator node.
pub struct NodeReader<'a, N: JsonNavigator + ?Sized> {
    nav: &'a N,
    start: Option<NavigatorNode>,
    stack: Vec<Frame<'a>>,
    token: TokenType,
    /// Node behind the current token, for value and name tokens.
    current: Option<NavigatorNode>,
    finished: bool,
}

impl<'a, N: JsonNavigator + ?Sized> NodeReader<'a, N> {
    pub fn new(nav: &'a N, node: NavigatorNode) -> Self {
        NodeReader {
            nav,
            start: Some(node),
            stack: Vec::new(),
            token: TokenType::NotStarted,
            current: None,
            finished: false,
        }
    }

    fn enter(&mut self, node: NavigatorNode) -> Result<()> {
        let node_type = self.nav.node_type(node)?;
        if node_type.is_container() && self.stack.len() >= self.nav.max_depth() {
            return Err(Error::DepthLimitExceeded(self.nav.max_depth()));
        }
        match node_type {
            NodeType::Array => self.stack.push(Frame::Array(self.nav.array_items(node)?)),
            NodeType::Object => self.stack.push(Frame::Object {
                properties: self.nav.object_properties(node)?,
                pending_value: None,
            }),
            _ => {}
        }
        self.token = TokenType::from_node_type(node_type)
            .ok_or_else(|| Error::node_mismatch("a known node kind", node_type))?;
        self.current = Some(node);
        Ok(())
    }

    fn end(&mut self, token: TokenType) {
        self.stack.pop();
        self.token = token;
        self.current = None;
    }

    fn node(&self, expected: TokenType) -> Result<NavigatorNode> {
        match self.current {
            Some(node) if self.token == expected => Ok(node),
            _ => Err(Error::type_mismatch(expected, self.token)),
        }
    }
}

impl<N: JsonNavigator + ?Sized> JsonReader for NodeReader<'_, N> {
    fn serialization_format(&self) -> SerializationFormat {
        self.nav.serialization_format()
    }

    fn current_token_type(&self) -> TokenType {
        self.token
    }

    fn current_depth(&self) -> usize {
        self.stack.len()
    }

    fn read(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        if let Some(node) = self.start.take() {
            self.enter(node)?;
            return Ok(true);
        }
        let next = match self.stack.last_mut() {
            None => {
                self.finished = true;
                return Ok(false);
            }
            Some(Frame::Array(items)) => match items.next() {
                Some(item) => item?,
                None => {
                    self.end(TokenType::EndArray);
                    return Ok(true);
                }
            },
            Some(Frame::Object {
                properties,
                pending_value,
            }) => match pending_value.take() {
                Some(value) => value,
                None => match properties.next() {
                    Some(property) => {
                        let property = property?;
                        *pending_value = Some(property.value);
                        self.token = TokenType::FieldName;
                        self.current = Some(property.name);
                        return Ok(true);
                    }
                    None => {
                        self.end(TokenType::EndObject);
                        return Ok(true);
                    }
                },
            },
        };
        self.enter(next)?;
        Ok(true)
    }

    fn number_value(&self) -> Result<Number64> {
        self.nav.number_value(self.node(TokenType::Number)?)
    }

    fn string_value(&self) -> Result<AnyString> {
        match (self.current, self.token) {
            (Some(node), TokenType::String | TokenType::FieldName) => self.nav.string_value(node),
            _ => Err(Error::type_mismatch(TokenType::String, self.token)),
        }
    }

    fn field_name(&self) -> Result<AnyString> {
        self.nav.string_value(self.node(TokenType::FieldName)?)
    }

    fn int8_value(&self) -> Result<i8> {
        self.nav.int8_value(self.node(TokenType::Int8)?)
    }

    fn int16_value(&self) -> Result<i16> {
        self.nav.int16_value(self.node(TokenType::Int16)?)
    }

    fn int32_value(&self) -> Result<i32> {
        self.nav.int32_value(self.node(TokenType::Int32)?)
    }

    fn int64_value(&self) -> Result<i64> {
        self.nav.int64_value(self.node(TokenType::Int64)?)
    }

    fn uint32_value(&self) -> Result<u32> {
        self.nav.uint32_value(self.node(TokenType::UInt32)?)
    }

    fn float32_value(&self) -> Result<f32> {
        self.nav.float32_value(self.node(TokenType::Float32)?)
    }

    fn float64_value(&self) -> Result<f64> {
        self.nav.float64_value(self.node(TokenType::Float64)?)
    }

    fn guid_value(&self) -> Result<Uuid> {
        self.nav.guid_value(self.node(TokenType::Guid)?)
    }

    fn binary_value(&self) -> Result<ByteBuffer> {
        self.nav.binary_value(self.node(TokenType::Binary)?)
    }

    fn try_get_buffered_string_value(&self) -> Option<Utf8Buffer> {
        match self.token {
            TokenType::String | TokenType::FieldName => {
                self.nav.try_get_buffered_string_value(self.current?)
            }
            _ => None,
        }
    }

    fn try_get_buffered_binary_value(&self) -> Option<ByteBuffer> {
        self.nav
            .try_get_buffered_binary_value(self.node(TokenType::Binary).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{BinaryNavigator, TextNavigator};
    use crate::options::WriterOptions;
    use crate::writer::{BinaryWriter, JsonWriter};

    #[test]
    fn test_token_sequence_matches_text_reader() {
        let text = r#"{"a": 1, "b": [true, null, "x"], "c": {}}"#;
        let nav = TextNavigator::new(text).unwrap();
        let mut walked = NodeReader::new(&nav, nav.root_node());
        let mut parsed = crate::reader::TextReader::new(text);
        loop {
            let more = walked.read().unwrap();
            assert_eq!(more, parsed.read().unwrap());
            if !more {
                break;
            }
            assert_eq!(walked.current_token_type(), parsed.current_token_type());
            assert_eq!(walked.current_depth(), parsed.current_depth());
        }
        assert!(!walked.read().unwrap());
    }

    #[test]
    fn test_extended_tokens_from_binary() {
        let mut writer = BinaryWriter::new(WriterOptions::new());
        writer.write_array_start().unwrap();
        writer.write_int16_value(-7).unwrap();
        writer.write_binary_value(&[1, 2]).unwrap();
        writer.write_array_end().unwrap();
        let nav = BinaryNavigator::new(writer.result().unwrap()).unwrap();

        let mut reader = NodeReader::new(&nav, nav.root_node());
        assert!(reader.read().unwrap());
        assert!(reader.read().unwrap());
        assert_eq!(reader.current_token_type(), TokenType::Int16);
        assert_eq!(reader.int16_value().unwrap(), -7);
        assert!(matches!(reader.number_value(), Err(Error::TypeMismatch { .. })));
        assert!(reader.read().unwrap());
        assert_eq!(reader.try_get_buffered_binary_value().unwrap(), [1u8, 2][..]);
        assert!(reader.read().unwrap());
        assert_eq!(reader.current_token_type(), TokenType::EndArray);
        assert_eq!(reader.current_depth(), 0);
        assert!(!reader.read().unwrap());
    }
}
