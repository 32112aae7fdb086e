//! The closed kind enumerations shared by readers, writers and navigators.
//!
//! - [`NodeType`]: the kind of a navigator node, i.e. of a complete value.
//! - [`TokenType`]: the kind of the token a reader cursor is positioned on.
//!
//! The extended kinds (`Int8` .. `Guid`) carry their width as part of their
//! identity: an `Int8` is never reported as an `Int32` or a `Number64`.

/// The value kind of a navigator node.
///
/// The discriminants double as the `$t` type codes of the typed envelope
/// convention (see [`crate::envelope`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Null = 0,
    False = 1,
    True = 2,
    Number64 = 3,
    String = 4,
    Array = 5,
    Object = 6,
    FieldName = 7,
    Int8 = 8,
    Int16 = 9,
    Int32 = 10,
    Int64 = 11,
    UInt32 = 12,
    Float32 = 13,
    Float64 = 14,
    Binary = 15,
    Guid = 16,
    Unknown = 255,
}

impl NodeType {
    /// Returns the kind for a `$t` type code, if the code names an extended kind.
    ///
    /// Only the kinds that have no native JSON representation have a type code.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dual_json::NodeType;
    ///
    /// assert_eq!(NodeType::from_type_code(16), Some(NodeType::Guid));
    /// assert_eq!(NodeType::from_type_code(4), None);
    /// ```
    #[must_use]
    pub const fn from_type_code(code: u8) -> Option<Self> {
        match code {
            8 => Some(NodeType::Int8),
            9 => Some(NodeType::Int16),
            10 => Some(NodeType::Int32),
            11 => Some(NodeType::Int64),
            12 => Some(NodeType::UInt32),
            13 => Some(NodeType::Float32),
            14 => Some(NodeType::Float64),
            15 => Some(NodeType::Binary),
            16 => Some(NodeType::Guid),
            _ => None,
        }
    }

    /// The `$t` type code of this kind.
    #[inline]
    #[must_use]
    pub const fn type_code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for kinds outside the vanilla JSON lattice.
    #[inline]
    #[must_use]
    pub const fn is_extended(self) -> bool {
        Self::from_type_code(self as u8).is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, NodeType::Array | NodeType::Object)
    }
}

/// The kind of token a reader is positioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenType {
    NotStarted,
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    String,
    Number,
    True,
    False,
    Null,
    FieldName,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt32,
    Float32,
    Float64,
    Guid,
    Binary,
}

impl TokenType {
    /// The token that starts a value of the given node kind.
    ///
    /// Containers map to their begin token. `Unknown` has no token.
    #[must_use]
    pub const fn from_node_type(node_type: NodeType) -> Option<Self> {
        Some(match node_type {
            NodeType::Null => TokenType::Null,
            NodeType::False => TokenType::False,
            NodeType::True => TokenType::True,
            NodeType::Number64 => TokenType::Number,
            NodeType::String => TokenType::String,
            NodeType::Array => TokenType::BeginArray,
            NodeType::Object => TokenType::BeginObject,
            NodeType::FieldName => TokenType::FieldName,
            NodeType::Int8 => TokenType::Int8,
            NodeType::Int16 => TokenType::Int16,
            NodeType::Int32 => TokenType::Int32,
            NodeType::Int64 => TokenType::Int64,
            NodeType::UInt32 => TokenType::UInt32,
            NodeType::Float32 => TokenType::Float32,
            NodeType::Float64 => TokenType::Float64,
            NodeType::Binary => TokenType::Binary,
            NodeType::Guid => TokenType::Guid,
            NodeType::Unknown => return None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn is_container_start(self) -> bool {
        matches!(self, TokenType::BeginArray | TokenType::BeginObject)
    }

    #[inline]
    #[must_use]
    pub const fn is_container_end(self) -> bool {
        matches!(self, TokenType::EndArray | TokenType::EndObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes_round_trip() {
        for code in 0..=255u8 {
            if let Some(node_type) = NodeType::from_type_code(code) {
                assert_eq!(node_type.type_code(), code);
                assert!(node_type.is_extended());
            }
        }
        assert!(!NodeType::Object.is_extended());
        assert!(!NodeType::Number64.is_extended());
    }

    #[test]
    fn test_token_for_node() {
        assert_eq!(
            TokenType::from_node_type(NodeType::Object),
            Some(TokenType::BeginObject)
        );
        assert_eq!(
            TokenType::from_node_type(NodeType::Number64),
            Some(TokenType::Number)
        );
        assert_eq!(TokenType::from_node_type(NodeType::Unknown), None);
    }
}
