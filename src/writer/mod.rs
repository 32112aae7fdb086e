//! Push-style writers.
//!
//! A [`JsonWriter`] receives one call per token. Both implementations enforce
//! the same grammar:
//!
//! - object and array starts/ends balance
//! - inside an object every value is preceded by exactly one field name
//! - arrays and the root never take field names
//! - a document has exactly one root value
//!
//! A call that breaks the grammar fails with [`Error::Grammar`] and leaves the
//! output untouched, so a partial or corrupt document is never observable.
//!
//! ## Usage
//!
//! ```rust
//! use dual_json::{create_writer, SerializationFormat, WriterOptions};
//!
//! let mut writer = create_writer(SerializationFormat::Text, WriterOptions::new()).unwrap();
//! writer.write_object_start().unwrap();
//! writer.write_field_name("id").unwrap();
//! writer.write_int32_value(7).unwrap();
//! writer.write_object_end().unwrap();
//!
//! assert_eq!(&*writer.result().unwrap(), br#"{"id":{"$t":10,"$v":7}}"#);
//! ```

pub mod binary;
pub mod text;

pub use binary::{BinaryWriter, PreblittedScope, TypedBinaryJsonWriter};
pub use text::TextWriter;

use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use uuid::Uuid;

/// The push interface shared by the text and binary writers.
pub trait JsonWriter {
    fn serialization_format(&self) -> SerializationFormat;

    /// Bytes written so far, including partially written containers.
    fn current_length(&self) -> usize;

    fn write_object_start(&mut self) -> Result<()>;
    fn write_object_end(&mut self) -> Result<()>;
    fn write_array_start(&mut self) -> Result<()>;
    fn write_array_end(&mut self) -> Result<()>;
    fn write_field_name(&mut self, name: &str) -> Result<()>;

    fn write_string_value(&mut self, value: &str) -> Result<()>;
    fn write_number_value(&mut self, value: Number64) -> Result<()>;
    fn write_bool_value(&mut self, value: bool) -> Result<()>;
    fn write_null_value(&mut self) -> Result<()>;

    fn write_int8_value(&mut self, value: i8) -> Result<()>;
    fn write_int16_value(&mut self, value: i16) -> Result<()>;
    fn write_int32_value(&mut self, value: i32) -> Result<()>;
    fn write_int64_value(&mut self, value: i64) -> Result<()>;
    fn write_uint32_value(&mut self, value: u32) -> Result<()>;
    fn write_float32_value(&mut self, value: f32) -> Result<()>;
    fn write_float64_value(&mut self, value: f64) -> Result<()>;
    fn write_guid_value(&mut self, value: Uuid) -> Result<()>;
    fn write_binary_value(&mut self, value: &[u8]) -> Result<()>;

    /// The finished document.
    ///
    /// # Errors
    ///
    /// [`Error::UnbalancedDocument`] while a scope is open or before the root
    /// value has been written.
    fn result(&self) -> Result<ByteBuffer>;

    /// Access to the binary-only operations, when this is a binary writer.
    fn as_typed_binary(&mut self) -> Option<&mut dyn TypedBinaryJsonWriter> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Array,
    Object,
}

#[derive(Clone, Debug)]
pub(crate) struct Scope {
    pub kind: ScopeKind,
    /// Output offset of the container's first byte.
    pub start: usize,
    /// Completed items, or completed properties for objects.
    pub count: usize,
    /// An object's field name has been written and its value is pending.
    pub awaiting_value: bool,
    /// A typed envelope that closes itself once its `$v` value is complete.
    pub envelope: bool,
}

/// Grammar bookkeeping shared by the writers.
///
/// Writers call a `check_*` method, emit their bytes, then call the matching
/// update method; nothing is updated when a check fails.
#[derive(Debug, Default)]
pub(crate) struct Grammar {
    scopes: Vec<Scope>,
    root_written: bool,
}

impl Grammar {
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn top(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn check_value(&self) -> Result<()> {
        match self.scopes.last() {
            None if self.root_written => Err(Error::grammar("document already has a root value")),
            None => Ok(()),
            Some(scope) if scope.kind == ScopeKind::Object && !scope.awaiting_value => Err(
                Error::grammar("a value inside an object must be preceded by a field name"),
            ),
            Some(_) => Ok(()),
        }
    }

    pub fn check_field_name(&self) -> Result<()> {
        match self.scopes.last() {
            Some(scope) if scope.kind == ScopeKind::Object => {
                if scope.awaiting_value {
                    Err(Error::grammar("field name written twice without a value"))
                } else {
                    Ok(())
                }
            }
            Some(_) => Err(Error::grammar("field names are only allowed inside objects")),
            None => Err(Error::grammar("field name outside of any object")),
        }
    }

    pub fn check_end(&self, kind: ScopeKind) -> Result<()> {
        match self.scopes.last() {
            Some(scope) if scope.kind == kind => {
                if scope.awaiting_value {
                    Err(Error::grammar("object closed after a field name without a value"))
                } else {
                    Ok(())
                }
            }
            Some(scope) => Err(Error::grammar(&format!(
                "{:?} end does not match the open {:?}",
                kind, scope.kind
            ))),
            None => Err(Error::grammar(&format!("{:?} end without a start", kind))),
        }
    }

    pub fn check_complete(&self) -> Result<()> {
        if let Some(scope) = self.scopes.last() {
            return Err(Error::unbalanced(&format!(
                "{} scope(s) still open, innermost is {:?}",
                self.scopes.len(),
                scope.kind
            )));
        }
        if !self.root_written {
            return Err(Error::unbalanced("no value has been written"));
        }
        Ok(())
    }

    pub fn push(&mut self, kind: ScopeKind, start: usize) {
        self.scopes.push(Scope {
            kind,
            start,
            count: 0,
            awaiting_value: false,
            envelope: false,
        });
    }

    pub fn mark_envelope(&mut self) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.envelope = true;
        }
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn field_name_done(&mut self) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.awaiting_value = true;
        }
    }

    pub fn value_done(&mut self) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.awaiting_value = false;
                scope.count += 1;
            }
            None => self.root_written = true,
        }
    }

    /// Whether the innermost scope is an envelope whose value just completed.
    pub fn envelope_complete(&self) -> bool {
        matches!(self.scopes.last(), Some(scope) if scope.envelope && scope.count == 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_accepts_single_value() {
        let mut grammar = Grammar::default();
        assert!(grammar.check_value().is_ok());
        grammar.value_done();
        assert!(grammar.check_complete().is_ok());
        assert!(matches!(grammar.check_value(), Err(Error::Grammar(_))));
    }

    #[test]
    fn test_object_requires_field_names() {
        let mut grammar = Grammar::default();
        grammar.push(ScopeKind::Object, 0);
        assert!(grammar.check_value().is_err());
        assert!(grammar.check_field_name().is_ok());
        grammar.field_name_done();
        assert!(grammar.check_field_name().is_err());
        assert!(grammar.check_end(ScopeKind::Object).is_err());
        assert!(grammar.check_value().is_ok());
        grammar.value_done();
        assert!(grammar.check_end(ScopeKind::Array).is_err());
        assert!(grammar.check_end(ScopeKind::Object).is_ok());
    }

    #[test]
    fn test_incomplete_document() {
        let mut grammar = Grammar::default();
        assert!(matches!(
            grammar.check_complete(),
            Err(Error::UnbalancedDocument(_))
        ));
        grammar.push(ScopeKind::Array, 0);
        assert!(grammar.check_field_name().is_err());
        assert!(matches!(
            grammar.check_complete(),
            Err(Error::UnbalancedDocument(_))
        ));
    }
}
