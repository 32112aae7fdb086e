//! Binary writer.
//!
//! Containers are written with a reserved 9-byte header (marker, u32 length,
//! u32 count). When the container closes its real size is known, the header
//! is rewritten in the narrowest form and the payload moved back over the
//! unused bytes.

use super::{Grammar, JsonWriter, ScopeKind};
use crate::buffer::ByteBuffer;
use crate::encoding::{self, marker};
use crate::error::{Error, Result};
use crate::format::SerializationFormat;
use crate::number::Number64;
use crate::options::WriterOptions;
use crate::types::NodeType;
use tracing::trace;
use uuid::Uuid;

const RESERVED_HEADER: usize = 9;

/// An already-encoded binary array or object, copied verbatim into the output.
///
/// # Examples
///
/// ```rust
/// use dual_json::{BinaryWriter, JsonWriter, NodeType, PreblittedScope, TypedBinaryJsonWriter, WriterOptions};
///
/// // [true, null]
/// let scope = PreblittedScope::new(vec![0xE5, 0x02, 0x02, 0xD2, 0xD0], NodeType::Array);
/// let mut writer = BinaryWriter::new(WriterOptions::new());
/// writer.write_preblitted_scope(&scope).unwrap();
/// assert_eq!(&*writer.result().unwrap(), &[0x80, 0xE5, 0x02, 0x02, 0xD2, 0xD0]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreblittedScope {
    bytes: ByteBuffer,
    node_type: NodeType,
}

impl PreblittedScope {
    pub fn new(bytes: impl Into<ByteBuffer>, node_type: NodeType) -> Self {
        PreblittedScope {
            bytes: bytes.into(),
            node_type,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &ByteBuffer {
        &self.bytes
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }
}

/// Operations only the binary writer supports.
pub trait TypedBinaryJsonWriter: JsonWriter {
    /// Splices an encoded array or object in as the next value.
    ///
    /// # Errors
    ///
    /// [`Error::Grammar`] when a value is not allowed here, and
    /// [`Error::InvalidMarker`] / [`Error::TypeMismatch`] when the bytes are not
    /// exactly one value of the declared container kind.
    fn write_preblitted_scope(&mut self, scope: &PreblittedScope) -> Result<()>;

    /// Opens `{"$t": code, "$v":` for an extended kind. The envelope closes
    /// itself once the next complete value has been written.
    ///
    /// The value is not checked against the declared kind.
    fn write_typed_envelope_head(&mut self, node_type: NodeType) -> Result<()>;

    /// An envelope head followed by an array start. The matching
    /// `write_array_end` closes both.
    fn write_typed_envelope_array_start(&mut self, node_type: NodeType) -> Result<()> {
        self.write_typed_envelope_head(node_type)?;
        self.write_array_start()
    }

    /// An envelope head followed by an object start. The matching
    /// `write_object_end` closes both.
    fn write_typed_envelope_object_start(&mut self, node_type: NodeType) -> Result<()> {
        self.write_typed_envelope_head(node_type)?;
        self.write_object_start()
    }
}

/// Writes the binary encoding.
pub struct BinaryWriter {
    out: Vec<u8>,
    grammar: Grammar,
}

impl BinaryWriter {
    pub fn new(options: WriterOptions) -> Self {
        let mut out = Vec::with_capacity(options.initial_capacity.max(1));
        out.push(SerializationFormat::Binary.tag());
        BinaryWriter {
            out,
            grammar: Grammar::default(),
        }
    }

    /// Consumes the writer and returns the finished document.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.grammar.check_complete()?;
        Ok(self.out)
    }

    fn write_scalar(&mut self, bytes: &[u8]) -> Result<()> {
        self.grammar.check_value()?;
        self.out.extend_from_slice(bytes);
        self.complete_value()
    }

    fn tagged<const N: usize>(&mut self, tag: u8, payload: [u8; N]) -> Result<()> {
        self.grammar.check_value()?;
        self.out.push(tag);
        self.out.extend_from_slice(&payload);
        self.complete_value()
    }

    fn write_start(&mut self, kind: ScopeKind) -> Result<()> {
        self.grammar.check_value()?;
        let start = self.out.len();
        self.out.resize(start + RESERVED_HEADER, 0);
        self.grammar.push(kind, start);
        Ok(())
    }

    fn write_end(&mut self, kind: ScopeKind) -> Result<()> {
        self.grammar.check_end(kind)?;
        self.close_scope()?;
        self.complete_value()
    }

    /// Rewrites the innermost container's header and pops its scope.
    ///
    /// The payload shifts left by whatever the final header saves over the
    /// reserved slot, so every enclosing container moves a byte once more
    /// on its own close. Output cost is O(bytes x depth); flat documents
    /// stay linear.
    fn close_scope(&mut self) -> Result<()> {
        let (kind, start, count) = match self.grammar.top() {
            Some(scope) => (scope.kind, scope.start, scope.count),
            None => return Err(Error::grammar("no open container")),
        };
        let node_type = match kind {
            ScopeKind::Array => NodeType::Array,
            ScopeKind::Object => NodeType::Object,
        };
        let payload_start = start + RESERVED_HEADER;
        let payload_len = self.out.len() - payload_start;
        let header = encoding::encode_container_header(node_type, payload_len, count)?;
        self.grammar.pop();

        let header_end = start + header.len();
        if header_end != payload_start {
            self.out.copy_within(payload_start.., header_end);
            self.out.truncate(header_end + payload_len);
        }
        self.out[start..header_end].copy_from_slice(&header);
        trace!(
            ?node_type,
            count,
            payload_len,
            header_len = header.len(),
            "compacted container header"
        );
        Ok(())
    }

    /// Records a finished value and closes any envelopes it completes.
    fn complete_value(&mut self) -> Result<()> {
        self.grammar.value_done();
        while self.grammar.envelope_complete() {
            self.close_scope()?;
            self.grammar.value_done();
        }
        Ok(())
    }

    fn encode_name(&mut self, name: &str) -> Result<()> {
        let mut header = Vec::with_capacity(5);
        encoding::encode_string_header(&mut header, name.len())?;
        self.out.extend_from_slice(&header);
        self.out.extend_from_slice(name.as_bytes());
        Ok(())
    }
}

impl JsonWriter for BinaryWriter {
    fn serialization_format(&self) -> SerializationFormat {
        SerializationFormat::Binary
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
        self.encode_name(name)?;
        self.grammar.field_name_done();
        Ok(())
    }

    fn write_string_value(&mut self, value: &str) -> Result<()> {
        self.grammar.check_value()?;
        self.encode_name(value)?;
        self.complete_value()
    }

    fn write_number_value(&mut self, value: Number64) -> Result<()> {
        let mut encoded = Vec::with_capacity(9);
        encoding::encode_number64(&mut encoded, value);
        self.write_scalar(&encoded)
    }

    fn write_bool_value(&mut self, value: bool) -> Result<()> {
        self.write_scalar(&[if value { marker::TRUE } else { marker::FALSE }])
    }

    fn write_null_value(&mut self) -> Result<()> {
        self.write_scalar(&[marker::NULL])
    }

    fn write_int8_value(&mut self, value: i8) -> Result<()> {
        self.tagged(marker::INT8, value.to_le_bytes())
    }

    fn write_int16_value(&mut self, value: i16) -> Result<()> {
        self.tagged(marker::INT16, value.to_le_bytes())
    }

    fn write_int32_value(&mut self, value: i32) -> Result<()> {
        self.tagged(marker::INT32, value.to_le_bytes())
    }

    fn write_int64_value(&mut self, value: i64) -> Result<()> {
        self.tagged(marker::INT64, value.to_le_bytes())
    }

    fn write_uint32_value(&mut self, value: u32) -> Result<()> {
        self.tagged(marker::UINT32, value.to_le_bytes())
    }

    fn write_float32_value(&mut self, value: f32) -> Result<()> {
        self.tagged(marker::FLOAT32, value.to_le_bytes())
    }

    fn write_float64_value(&mut self, value: f64) -> Result<()> {
        self.tagged(marker::FLOAT64, value.to_le_bytes())
    }

    fn write_guid_value(&mut self, value: Uuid) -> Result<()> {
        self.tagged(marker::GUID, *value.as_bytes())
    }

    fn write_binary_value(&mut self, value: &[u8]) -> Result<()> {
        self.grammar.check_value()?;
        let mut header = Vec::with_capacity(5);
        encoding::encode_binary_header(&mut header, value.len())?;
        self.out.extend_from_slice(&header);
        self.out.extend_from_slice(value);
        self.complete_value()
    }

    fn result(&self) -> Result<ByteBuffer> {
        self.grammar.check_complete()?;
        Ok(ByteBuffer::from(self.out.clone()))
    }

    fn as_typed_binary(&mut self) -> Option<&mut dyn TypedBinaryJsonWriter> {
        Some(self)
    }
}

impl TypedBinaryJsonWriter for BinaryWriter {
    fn write_preblitted_scope(&mut self, scope: &PreblittedScope) -> Result<()> {
        if !scope.node_type.is_container() {
            return Err(Error::node_mismatch("Array or Object", scope.node_type));
        }
        self.grammar.check_value()?;
        let bytes = scope.bytes.as_slice();
        let header = encoding::read_header(bytes, 0)?;
        if header.node_type != scope.node_type {
            return Err(Error::type_mismatch(scope.node_type, header.node_type));
        }
        let len = encoding::value_len(bytes, 0)?;
        if len != bytes.len() {
            return Err(Error::custom(format!(
                "preblitted scope holds {} bytes after its {:?}",
                bytes.len() - len.min(bytes.len()),
                scope.node_type
            )));
        }
        self.out.extend_from_slice(bytes);
        self.complete_value()
    }

    fn write_typed_envelope_head(&mut self, node_type: NodeType) -> Result<()> {
        if !node_type.is_extended() {
            return Err(Error::invalid_envelope(format!(
                "{:?} has no type code",
                node_type
            )));
        }
        self.write_object_start()?;
        self.grammar.mark_envelope();
        self.write_field_name("$t")?;
        self.write_number_value(Number64::Int(node_type.type_code().into()))?;
        self.write_field_name("$v")
    }
}
