//! JSON text writer.
//!
//! Produces RFC 8259 text, compact by default or pretty-printed with
//! [`WriterOptions::pretty`]. Kinds JSON has no notation for are written
//! according to [`ExtendedTypeHandling`]:
//!
//! ```rust
//! use dual_json::{ExtendedTypeHandling, JsonWriter, TextWriter, WriterOptions};
//!
//! let mut lossless = TextWriter::new(WriterOptions::new());
//! lossless.write_int16_value(-3).unwrap();
//! assert_eq!(&*lossless.result().unwrap(), br#"{"$t":9,"$v":-3}"#);
//!
//! let mut plain = TextWriter::new(
//!     WriterOptions::new().with_extended_types(ExtendedTypeHandling::Plain),
//! );
//! plain.write_int16_value(-3).unwrap();
//! assert_eq!(&*plain.result().unwrap(), b"-3");
//! ```

use super::{Grammar, JsonWriter, ScopeKind};
use crate::buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::escape;
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::options::{ExtendedTypeHandling, WriterOptions};
use crate::types::NodeType;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use uuid::Uuid;

/// Writes JSON text.
pub struct TextWriter {
    out: Vec<u8>,
    grammar: Grammar,
    options: WriterOptions,
}

impl TextWriter {
    pub fn new(options: WriterOptions) -> Self {
        TextWriter {
            out: Vec::with_capacity(options.initial_capacity),
            grammar: Grammar::default(),
            options,
        }
    }

    /// Consumes the writer and returns the finished text.
    ///
    /// # Errors
    ///
    /// Same as [`JsonWriter::result`].
    pub fn into_string(self) -> Result<String> {
        self.grammar.check_complete()?;
        String::from_utf8(self.out).map_err(|e| Error::InvalidUtf8 {
            offset: e.utf8_error().valid_up_to(),
        })
    }

    fn newline(&mut self, depth: usize) {
        self.out.push(b'\n');
        self.out
            .extend(std::iter::repeat(b' ').take(depth * self.options.indent));
    }

    /// Separator and indentation ahead of a value or field name.
    fn prefix(&mut self) {
        let (count, awaiting_value) = match self.grammar.top() {
            Some(scope) => (scope.count, scope.awaiting_value),
            None => return,
        };
        if awaiting_value {
            return;
        }
        if count > 0 {
            self.out.push(b',');
        }
        if self.options.pretty {
            self.newline(self.grammar.depth());
        }
    }

    fn write_raw_value(&mut self, raw: &[u8]) -> Result<()> {
        self.grammar.check_value()?;
        self.prefix();
        self.out.extend_from_slice(raw);
        self.grammar.value_done();
        Ok(())
    }

    fn write_start(&mut self, kind: ScopeKind) -> Result<()> {
        self.grammar.check_value()?;
        self.prefix();
        let start = self.out.len();
        self.out.push(match kind {
            ScopeKind::Array => b'[',
            ScopeKind::Object => b'{',
        });
        self.grammar.push(kind, start);
        Ok(())
    }

    fn write_end(&mut self, kind: ScopeKind) -> Result<()> {
        self.grammar.check_end(kind)?;
        if let Some(scope) = self.grammar.pop() {
            if self.options.pretty && scope.count > 0 {
                self.newline(self.grammar.depth());
            }
        }
        self.out.push(match kind {
            ScopeKind::Array => b']',
            ScopeKind::Object => b'}',
        });
        self.grammar.value_done();
        Ok(())
    }

    /// Writes `{"$t": code, "$v": <raw>}`.
    fn write_envelope_raw(&mut self, node_type: NodeType, raw: &[u8]) -> Result<()> {
        self.write_object_start()?;
        self.write_field_name("$t")?;
        self.write_raw_value(node_type.type_code().to_string().as_bytes())?;
        self.write_field_name("$v")?;
        self.write_raw_value(raw)?;
        self.write_object_end()
    }

    fn write_envelope_string(&mut self, node_type: NodeType, value: &str) -> Result<()> {
        self.write_object_start()?;
        self.write_field_name("$t")?;
        self.write_raw_value(node_type.type_code().to_string().as_bytes())?;
        self.write_field_name("$v")?;
        self.write_string_value(value)?;
        self.write_object_end()
    }

    fn write_extended_integer(&mut self, node_type: NodeType, value: i64) -> Result<()> {
        let raw = value.to_string();
        match self.options.extended_types {
            ExtendedTypeHandling::Envelope => self.write_envelope_raw(node_type, raw.as_bytes()),
            ExtendedTypeHandling::Plain => self.write_raw_value(raw.as_bytes()),
        }
    }

    /// `finite` is the number's JSON notation when it has one.
    fn write_extended_float(
        &mut self,
        node_type: NodeType,
        value: f64,
        finite: Option<String>,
    ) -> Result<()> {
        match (self.options.extended_types, finite) {
            (ExtendedTypeHandling::Envelope, Some(raw)) => {
                self.write_envelope_raw(node_type, raw.as_bytes())
            }
            (ExtendedTypeHandling::Envelope, None) => {
                self.write_envelope_string(node_type, non_finite_name(value))
            }
            (ExtendedTypeHandling::Plain, Some(raw)) => self.write_raw_value(raw.as_bytes()),
            (ExtendedTypeHandling::Plain, None) => Err(Error::NonFiniteNumber(value)),
        }
    }
}

pub(crate) fn non_finite_name(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

impl JsonWriter for TextWriter {
    fn serialization_format(&self) -> SerializationFormat {
        SerializationFormat::Text
    }

    fn current_length(&self) -> usize {
        self.out.len()
    }

    fn write_object_start(&mut self) -> Result<()> {
        self.write_start(ScopeKind::Object)
    }

    fn write_object_end(&mut self) -> Result<()> {
        self.write_end(ScopeKind::Object)
    }

    fn write_array_start(&mut self) -> Result<()> {
        self.write_start(ScopeKind::Array)
    }

    fn write_array_end(&mut self) -> Result<()> {
        self.write_end(ScopeKind::Array)
    }

    fn write_field_name(&mut self, name: &str) -> Result<()> {
        self.grammar.check_field_name()?;
        self.prefix();
        self.out.push(b'"');
        escape::escape_into(&mut self.out, name);
        self.out.push(b'"');
        self.out.push(b':');
        if self.options.pretty {
            self.out.push(b' ');
        }
        self.grammar.field_name_done();
        Ok(())
    }

    fn write_string_value(&mut self, value: &str) -> Result<()> {
        self.grammar.check_value()?;
        self.prefix();
        self.out.push(b'"');
        escape::escape_into(&mut self.out, value);
        self.out.push(b'"');
        self.grammar.value_done();
        Ok(())
    }

    fn write_number_value(&mut self, value: Number64) -> Result<()> {
        match value {
            Number64::Int(i) => self.write_raw_value(i.to_string().as_bytes()),
            Number64::Double(d) if d.is_finite() => {
                self.write_raw_value(format!("{:?}", d).as_bytes())
            }
            Number64::Double(d) => Err(Error::NonFiniteNumber(d)),
        }
    }

    fn write_bool_value(&mut self, value: bool) -> Result<()> {
        self.write_raw_value(if value { b"true" } else { b"false" })
    }

    fn write_null_value(&mut self) -> Result<()> {
        self.write_raw_value(b"null")
    }

    fn write_int8_value(&mut self, value: i8) -> Result<()> {
        self.write_extended_integer(NodeType::Int8, value.into())
    }

    fn write_int16_value(&mut self, value: i16) -> Result<()> {
        self.write_extended_integer(NodeType::Int16, value.into())
    }

    fn write_int32_value(&mut self, value: i32) -> Result<()> {
        self.write_extended_integer(NodeType::Int32, value.into())
    }

    fn write_int64_value(&mut self, value: i64) -> Result<()> {
        self.write_extended_integer(NodeType::Int64, value)
    }

    fn write_uint32_value(&mut self, value: u32) -> Result<()> {
        self.write_extended_integer(NodeType::UInt32, value.into())
    }

    fn write_float32_value(&mut self, value: f32) -> Result<()> {
        let finite = value.is_finite().then(|| format!("{:?}", value));
        self.write_extended_float(NodeType::Float32, value.into(), finite)
    }

    fn write_float64_value(&mut self, value: f64) -> Result<()> {
        let finite = value.is_finite().then(|| format!("{:?}", value));
        self.write_extended_float(NodeType::Float64, value, finite)
    }

    fn write_guid_value(&mut self, value: Uuid) -> Result<()> {
        let text = value.hyphenated().to_string();
        match self.options.extended_types {
            ExtendedTypeHandling::Envelope => self.write_envelope_string(NodeType::Guid, &text),
            ExtendedTypeHandling::Plain => self.write_string_value(&text),
        }
    }

    fn write_binary_value(&mut self, value: &[u8]) -> Result<()> {
        let text = STANDARD.encode(value);
        match self.options.extended_types {
            ExtendedTypeHandling::Envelope => self.write_envelope_string(NodeType::Binary, &text),
            ExtendedTypeHandling::Plain => self.write_string_value(&text),
        }
    }

    fn result(&self) -> Result<ByteBuffer> {
        self.grammar.check_complete()?;
        Ok(ByteBuffer::from(self.out.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact() -> TextWriter {
        TextWriter::new(WriterOptions::new())
    }

    fn text(writer: &TextWriter) -> String {
        String::from_utf8(writer.result().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_compact_document() {
        let mut w = compact();
        w.write_object_start().unwrap();
        w.write_field_name("a").unwrap();
        w.write_number_value(Number64::Int(1)).unwrap();
        w.write_field_name("b").unwrap();
        w.write_array_start().unwrap();
        w.write_bool_value(true).unwrap();
        w.write_null_value().unwrap();
        w.write_string_value("x").unwrap();
        w.write_array_end().unwrap();
        w.write_object_end().unwrap();
        assert_eq!(text(&w), r#"{"a":1,"b":[true,null,"x"]}"#);
    }

    #[test]
    fn test_pretty_document() {
        let mut w = TextWriter::new(WriterOptions::pretty());
        w.write_object_start().unwrap();
        w.write_field_name("list").unwrap();
        w.write_array_start().unwrap();
        w.write_number_value(Number64::Int(1)).unwrap();
        w.write_number_value(Number64::Double(2.5)).unwrap();
        w.write_array_end().unwrap();
        w.write_field_name("empty").unwrap();
        w.write_object_start().unwrap();
        w.write_object_end().unwrap();
        w.write_object_end().unwrap();
        assert_eq!(
            text(&w),
            "{\n  \"list\": [\n    1,\n    2.5\n  ],\n  \"empty\": {}\n}"
        );
    }

    #[test]
    fn test_escaping() {
        let mut w = compact();
        w.write_string_value("a\"b\n\u{1}").unwrap();
        assert_eq!(text(&w), r#""a\"b\n\u0001""#);
    }

    #[test]
    fn test_envelopes() {
        let mut w = compact();
        w.write_array_start().unwrap();
        w.write_int8_value(-128).unwrap();
        w.write_uint32_value(u32::MAX).unwrap();
        w.write_float32_value(1.5).unwrap();
        w.write_float64_value(f64::NEG_INFINITY).unwrap();
        w.write_binary_value(&[1, 2, 3]).unwrap();
        w.write_array_end().unwrap();
        assert_eq!(
            text(&w),
            concat!(
                r#"[{"$t":8,"$v":-128},{"$t":12,"$v":4294967295},"#,
                r#"{"$t":13,"$v":1.5},{"$t":14,"$v":"-Infinity"},"#,
                r#"{"$t":15,"$v":"AQID"}]"#
            )
        );
    }

    #[test]
    fn test_guid_envelope() {
        let guid = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let mut w = compact();
        w.write_guid_value(guid).unwrap();
        assert_eq!(
            text(&w),
            r#"{"$t":16,"$v":"01234567-89ab-cdef-0123-456789abcdef"}"#
        );
    }

    #[test]
    fn test_plain_extended_types() {
        let mut w = TextWriter::new(
            WriterOptions::new().with_extended_types(ExtendedTypeHandling::Plain),
        );
        w.write_array_start().unwrap();
        w.write_int64_value(-5).unwrap();
        w.write_float64_value(0.25).unwrap();
        w.write_binary_value(b"hi").unwrap();
        assert!(matches!(
            w.write_float32_value(f32::NAN),
            Err(Error::NonFiniteNumber(_))
        ));
        w.write_array_end().unwrap();
        assert_eq!(text(&w), r#"[-5,0.25,"aGk="]"#);
    }

    #[test]
    fn test_number_formatting() {
        let mut w = compact();
        w.write_array_start().unwrap();
        w.write_number_value(Number64::Double(3.0)).unwrap();
        w.write_number_value(Number64::Double(1e300)).unwrap();
        w.write_number_value(Number64::Int(i64::MIN)).unwrap();
        assert!(matches!(
            w.write_number_value(Number64::Double(f64::NAN)),
            Err(Error::NonFiniteNumber(_))
        ));
        w.write_array_end().unwrap();
        let out = text(&w);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0].as_f64(), Some(3.0));
        assert_eq!(parsed[1].as_f64(), Some(1e300));
        assert_eq!(parsed[2].as_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_grammar_violation_writes_nothing() {
        let mut w = compact();
        w.write_object_start().unwrap();
        let before = w.current_length();
        assert!(matches!(w.write_null_value(), Err(Error::Grammar(_))));
        assert!(matches!(w.write_array_end(), Err(Error::Grammar(_))));
        assert_eq!(w.current_length(), before);
        assert!(matches!(w.result(), Err(Error::UnbalancedDocument(_))));
    }
}
