//! The binary encoding.
//!
//! A binary document is the format byte `0x80` followed by exactly one value.
//! Every value starts with a one-byte type marker, so the kind of any value is
//! known from its first byte, and the size of any value is known from its
//! header alone. Skipping a value never requires decoding it.
//!
//! All multi-byte integers and floats are little-endian. Lengths count payload
//! bytes, i.e. the bytes after the header.
//!
//! | Marker | Kind | Payload |
//! |--------|------|---------|
//! | `0x00..=0x1F` | Number64 literal `0..=31` | none |
//! | `0x80..=0xBF` | String, length `marker - 0x80` | UTF-8 |
//! | `0xC0` / `0xC1` / `0xC2` | String, length u8 / u16 / u32 | UTF-8 |
//! | `0xC8` / `0xC9` / `0xCA` / `0xCB` | Number64 as u8 / i16 / i32 / i64 | 1 / 2 / 4 / 8 |
//! | `0xCC` | Number64 as f64 | 8 |
//! | `0xCD` / `0xCE` | Float32 / Float64 | 4 / 8 |
//! | `0xD0` / `0xD1` / `0xD2` | Null / False / True | none |
//! | `0xD3` | Guid (RFC 4122 byte order) | 16 |
//! | `0xD8` / `0xD9` / `0xDA` / `0xDB` | Int8 / Int16 / Int32 / Int64 | 1 / 2 / 4 / 8 |
//! | `0xDC` | UInt32 | 4 |
//! | `0xDD` / `0xDE` / `0xDF` | Binary, length u8 / u16 / u32 | bytes |
//! | `0xE0` | empty array | none |
//! | `0xE1` | array of one item | the item |
//! | `0xE2` / `0xE3` / `0xE4` | array, length u8 / u16 / u32 | items |
//! | `0xE5` / `0xE6` / `0xE7` | array, length and count u8 / u16 / u32 | items |
//! | `0xE8` | empty object | none |
//! | `0xE9` | object of one property | name, value |
//! | `0xEA` / `0xEB` / `0xEC` | object, length u8 / u16 / u32 | name/value pairs |
//! | `0xED` / `0xEE` / `0xEF` | object, length and count u8 / u16 / u32 | name/value pairs |
//!
//! Object property names use the string markers. Markers not listed are invalid.
//!
//! ## Example
//!
//! ```text
//! {"a": 1, "b": [true, null]}
//!
//! 80          format: binary
//! ED 0A 02    object, 10 payload bytes, 2 properties
//! 81 61       "a"
//! 01          1
//! 81 62       "b"
//! E5 02 02    array, 2 payload bytes, 2 items
//! D2          true
//! D0          null
//! ```

use crate::error::{Error, Result};
use crate::number::Number64;
use crate::types::NodeType;

/// Type marker values.
pub mod marker {
    pub const LITERAL_INT_MAX: u8 = 0x1F;

    pub const STRING_INLINE_MIN: u8 = 0x80;
    pub const STRING_INLINE_MAX: u8 = 0xBF;
    pub const STRING_L1: u8 = 0xC0;
    pub const STRING_L2: u8 = 0xC1;
    pub const STRING_L4: u8 = 0xC2;

    pub const NUMBER_UINT8: u8 = 0xC8;
    pub const NUMBER_INT16: u8 = 0xC9;
    pub const NUMBER_INT32: u8 = 0xCA;
    pub const NUMBER_INT64: u8 = 0xCB;
    pub const NUMBER_DOUBLE: u8 = 0xCC;

    pub const FLOAT32: u8 = 0xCD;
    pub const FLOAT64: u8 = 0xCE;

    pub const NULL: u8 = 0xD0;
    pub const FALSE: u8 = 0xD1;
    pub const TRUE: u8 = 0xD2;
    pub const GUID: u8 = 0xD3;

    pub const INT8: u8 = 0xD8;
    pub const INT16: u8 = 0xD9;
    pub const INT32: u8 = 0xDA;
    pub const INT64: u8 = 0xDB;
    pub const UINT32: u8 = 0xDC;

    pub const BINARY_L1: u8 = 0xDD;
    pub const BINARY_L2: u8 = 0xDE;
    pub const BINARY_L4: u8 = 0xDF;

    pub const ARRAY_EMPTY: u8 = 0xE0;
    pub const ARRAY_SINGLE: u8 = 0xE1;
    pub const ARRAY_L1: u8 = 0xE2;
    pub const ARRAY_L2: u8 = 0xE3;
    pub const ARRAY_L4: u8 = 0xE4;
    pub const ARRAY_LC1: u8 = 0xE5;
    pub const ARRAY_LC2: u8 = 0xE6;
    pub const ARRAY_LC4: u8 = 0xE7;

    pub const OBJECT_EMPTY: u8 = 0xE8;
    pub const OBJECT_SINGLE: u8 = 0xE9;
    pub const OBJECT_L1: u8 = 0xEA;
    pub const OBJECT_L2: u8 = 0xEB;
    pub const OBJECT_L4: u8 = 0xEC;
    pub const OBJECT_LC1: u8 = 0xED;
    pub const OBJECT_LC2: u8 = 0xEE;
    pub const OBJECT_LC4: u8 = 0xEF;

    #[inline]
    pub const fn is_string(m: u8) -> bool {
        matches!(m, STRING_INLINE_MIN..=STRING_INLINE_MAX | STRING_L1 | STRING_L2 | STRING_L4)
    }
}

/// The decoded header of one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub marker: u8,
    pub node_type: NodeType,
    /// Bytes from the marker to the first payload byte.
    pub header_len: usize,
    pub payload_len: usize,
    /// Item or property count, when the header stores it.
    pub count: Option<usize>,
}

impl Header {
    #[inline]
    pub fn total_len(&self) -> usize {
        self.header_len + self.payload_len
    }
}

#[inline]
fn need(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset.saturating_add(len)).ok_or_else(|| {
        Error::truncated(offset, offset.saturating_add(len).saturating_sub(data.len()))
    })
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(need(data, offset, 1)?[0])
}

pub(crate) fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(need(data, offset, N)?);
    Ok(out)
}

fn read_len(data: &[u8], offset: usize, width: usize) -> Result<usize> {
    Ok(match width {
        1 => read_u8(data, offset)? as usize,
        2 => u16::from_le_bytes(read_array(data, offset)?) as usize,
        _ => u32::from_le_bytes(read_array(data, offset)?) as usize,
    })
}

fn scalar(marker: u8, node_type: NodeType, payload_len: usize) -> Header {
    Header {
        marker,
        node_type,
        header_len: 1,
        payload_len,
        count: None,
    }
}

/// Reads the header of the value at `offset` without checking that the
/// payload fits in `data`; see [`read_header`].
fn decode_header(data: &[u8], offset: usize) -> Result<Header> {
    use marker::*;

    let m = read_u8(data, offset)?;
    let header = match m {
        0x00..=LITERAL_INT_MAX => scalar(m, NodeType::Number64, 0),
        STRING_INLINE_MIN..=STRING_INLINE_MAX => {
            scalar(m, NodeType::String, (m - STRING_INLINE_MIN) as usize)
        }
        STRING_L1 | STRING_L2 | STRING_L4 | BINARY_L1 | BINARY_L2 | BINARY_L4 => {
            let width = match m {
                STRING_L1 | BINARY_L1 => 1,
                STRING_L2 | BINARY_L2 => 2,
                _ => 4,
            };
            let node_type = if marker::is_string(m) {
                NodeType::String
            } else {
                NodeType::Binary
            };
            Header {
                marker: m,
                node_type,
                header_len: 1 + width,
                payload_len: read_len(data, offset + 1, width)?,
                count: None,
            }
        }
        NUMBER_UINT8 => scalar(m, NodeType::Number64, 1),
        NUMBER_INT16 => scalar(m, NodeType::Number64, 2),
        NUMBER_INT32 => scalar(m, NodeType::Number64, 4),
        NUMBER_INT64 | NUMBER_DOUBLE => scalar(m, NodeType::Number64, 8),
        FLOAT32 => scalar(m, NodeType::Float32, 4),
        FLOAT64 => scalar(m, NodeType::Float64, 8),
        NULL => scalar(m, NodeType::Null, 0),
        FALSE => scalar(m, NodeType::False, 0),
        TRUE => scalar(m, NodeType::True, 0),
        GUID => scalar(m, NodeType::Guid, 16),
        INT8 => scalar(m, NodeType::Int8, 1),
        INT16 => scalar(m, NodeType::Int16, 2),
        INT32 => scalar(m, NodeType::Int32, 4),
        INT64 => scalar(m, NodeType::Int64, 8),
        UINT32 => scalar(m, NodeType::UInt32, 4),
        ARRAY_EMPTY | OBJECT_EMPTY => Header {
            count: Some(0),
            ..scalar(m, container_type(m), 0)
        },
        ARRAY_SINGLE | OBJECT_SINGLE => Header {
            count: Some(1),
            payload_len: value_len(data, offset)? - 1,
            ..scalar(m, container_type(m), 0)
        },
        ARRAY_L1..=ARRAY_L4 | OBJECT_L1..=OBJECT_L4 => {
            let width = width_of(m - first_sized(m));
            Header {
                marker: m,
                node_type: container_type(m),
                header_len: 1 + width,
                payload_len: read_len(data, offset + 1, width)?,
                count: None,
            }
        }
        ARRAY_LC1..=ARRAY_LC4 | OBJECT_LC1..=OBJECT_LC4 => {
            let width = width_of(m - first_sized(m) - 3);
            Header {
                marker: m,
                node_type: container_type(m),
                header_len: 1 + 2 * width,
                payload_len: read_len(data, offset + 1, width)?,
                count: Some(read_len(data, offset + 1 + width, width)?),
            }
        }
        _ => return Err(Error::invalid_marker(offset, m)),
    };
    Ok(header)
}

#[inline]
fn container_type(m: u8) -> NodeType {
    if m < marker::OBJECT_EMPTY {
        NodeType::Array
    } else {
        NodeType::Object
    }
}

#[inline]
fn first_sized(m: u8) -> u8 {
    if m < marker::OBJECT_EMPTY {
        marker::ARRAY_L1
    } else {
        marker::OBJECT_L1
    }
}

#[inline]
fn width_of(step: u8) -> usize {
    match step {
        0 => 1,
        1 => 2,
        _ => 4,
    }
}

/// Reads the header of the value at `offset` and checks that the whole value
/// lies inside `data`.
pub(crate) fn read_header(data: &[u8], offset: usize) -> Result<Header> {
    let header = decode_header(data, offset)?;
    let end = offset.saturating_add(header.total_len());
    if end > data.len() {
        return Err(Error::truncated(offset, end - data.len()));
    }
    Ok(header)
}

/// Total encoded size of the value at `offset`, from headers only.
///
/// Single-item containers have no length field, so chains of them are walked
/// iteratively down to the first value that has one.
pub(crate) fn value_len(data: &[u8], offset: usize) -> Result<usize> {
    let mut prefix = 0usize;
    let mut pos = offset;
    loop {
        match read_u8(data, pos)? {
            marker::ARRAY_SINGLE => {
                prefix += 1;
                pos += 1;
            }
            marker::OBJECT_SINGLE => {
                let name = decode_header(data, pos + 1)?;
                if !marker::is_string(name.marker) {
                    return Err(Error::invalid_marker(pos + 1, name.marker));
                }
                prefix += 1 + name.total_len();
                pos += 1 + name.total_len();
            }
            _ => return Ok(prefix + decode_header(data, pos)?.total_len()),
        }
    }
}

/// Decodes a Number64 value whose header was read at `offset`.
pub(crate) fn read_number64(data: &[u8], offset: usize, header: &Header) -> Result<Number64> {
    use marker::*;

    let at = offset + 1;
    Ok(match header.marker {
        0x00..=LITERAL_INT_MAX => Number64::Int(header.marker as i64),
        NUMBER_UINT8 => Number64::Int(read_u8(data, at)? as i64),
        NUMBER_INT16 => Number64::Int(i16::from_le_bytes(read_array(data, at)?) as i64),
        NUMBER_INT32 => Number64::Int(i32::from_le_bytes(read_array(data, at)?) as i64),
        NUMBER_INT64 => Number64::Int(i64::from_le_bytes(read_array(data, at)?)),
        NUMBER_DOUBLE => Number64::Double(f64::from_le_bytes(read_array(data, at)?)),
        _ => return Err(Error::node_mismatch("Number64", header.node_type)),
    })
}

/// The fixed-size payload of a value of kind `expected` at `offset`.
pub(crate) fn read_fixed<const N: usize>(
    data: &[u8],
    offset: usize,
    header: &Header,
    expected: NodeType,
) -> Result<[u8; N]> {
    if header.node_type != expected {
        return Err(Error::type_mismatch(expected, header.node_type));
    }
    read_array(data, offset + header.header_len)
}

/// Byte range of a string or binary payload.
pub(crate) fn payload_range(offset: usize, header: &Header) -> std::ops::Range<usize> {
    let start = offset + header.header_len;
    start..start + header.payload_len
}

/// Appends the shortest header for a string of `len` bytes.
pub(crate) fn encode_string_header(out: &mut Vec<u8>, len: usize) -> Result<()> {
    use marker::*;

    if len <= (STRING_INLINE_MAX - STRING_INLINE_MIN) as usize {
        out.push(STRING_INLINE_MIN + len as u8);
    } else {
        encode_sized_header(out, len, [STRING_L1, STRING_L2, STRING_L4])?;
    }
    Ok(())
}

pub(crate) fn encode_binary_header(out: &mut Vec<u8>, len: usize) -> Result<()> {
    encode_sized_header(
        out,
        len,
        [marker::BINARY_L1, marker::BINARY_L2, marker::BINARY_L4],
    )
}

fn encode_sized_header(out: &mut Vec<u8>, len: usize, markers: [u8; 3]) -> Result<()> {
    if let Ok(len) = u8::try_from(len) {
        out.push(markers[0]);
        out.push(len);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(markers[1]);
        out.extend_from_slice(&len.to_le_bytes());
    } else {
        let len = u32::try_from(len)
            .map_err(|_| Error::custom(format!("value of {} bytes is too large to encode", len)))?;
        out.push(markers[2]);
        out.extend_from_slice(&len.to_le_bytes());
    }
    Ok(())
}

/// Builds the narrowest container header for a payload of `len` bytes
/// holding `count` items (or properties).
pub(crate) fn encode_container_header(
    node_type: NodeType,
    len: usize,
    count: usize,
) -> Result<Vec<u8>> {
    let base = if node_type == NodeType::Array {
        marker::ARRAY_EMPTY
    } else {
        marker::OBJECT_EMPTY
    };
    let mut header = Vec::with_capacity(9);
    match count {
        0 => header.push(base),
        1 => header.push(base + 1),
        _ => {
            let widest = len.max(count);
            if u8::try_from(widest).is_ok() {
                header.push(base + 5);
                header.push(len as u8);
                header.push(count as u8);
            } else if u16::try_from(widest).is_ok() {
                header.push(base + 6);
                header.extend_from_slice(&(len as u16).to_le_bytes());
                header.extend_from_slice(&(count as u16).to_le_bytes());
            } else {
                let len = u32::try_from(len).map_err(|_| {
                    Error::custom(format!("container of {} bytes is too large to encode", len))
                })?;
                header.push(base + 7);
                header.extend_from_slice(&len.to_le_bytes());
                header.extend_from_slice(&(count as u32).to_le_bytes());
            }
        }
    }
    Ok(header)
}

/// Appends the narrowest Number64 encoding of `value`.
pub(crate) fn encode_number64(out: &mut Vec<u8>, value: Number64) {
    use marker::*;

    let integer = match value {
        Number64::Int(i) => Some(i),
        Number64::Double(d) => crate::number::double_as_i64(d),
    };
    match integer {
        Some(i) if (0..=LITERAL_INT_MAX as i64).contains(&i) => out.push(i as u8),
        Some(i) if (0..=u8::MAX as i64).contains(&i) => {
            out.push(NUMBER_UINT8);
            out.push(i as u8);
        }
        Some(i) if i16::try_from(i).is_ok() => {
            out.push(NUMBER_INT16);
            out.extend_from_slice(&(i as i16).to_le_bytes());
        }
        Some(i) if i32::try_from(i).is_ok() => {
            out.push(NUMBER_INT32);
            out.extend_from_slice(&(i as i32).to_le_bytes());
        }
        Some(i) => {
            out.push(NUMBER_INT64);
            out.extend_from_slice(&i.to_le_bytes());
        }
        None => {
            out.push(NUMBER_DOUBLE);
            out.extend_from_slice(&value.as_f64().to_le_bytes());
        }
    }
}
