//! Serde serialization onto a [`JsonWriter`].
//!
//! The [`Serializer`] turns each serde event into one writer call, so a
//! value streams straight into either format without an intermediate tree.
//!
//! ## Mapping
//!
//! - Rust integers and floats become `Number64`. A `u64` above `i64::MAX`
//!   has no exact `Number64` and fails with [`Error::Custom`].
//! - Byte slices (`serialize_bytes`) become `Binary`.
//! - `Option::None` and `()` become `null`.
//! - Enums are externally tagged: `"Unit"`, `{"Newtype": value}`,
//!   `{"Tuple": [..]}`, `{"Struct": {..}}`.
//! - Map keys must serialize as strings, integers, chars or bools. Non-string
//!   keys are written in their decimal or literal text form.
//! - [`Value`](crate::Value) keeps its extended kinds: a `Value::Int16` is
//!   written with [`JsonWriter::write_int16_value`], not as a plain number.
//!
//! ## Usage
//!
//! ```rust
//! use dual_json::{to_text, to_binary};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let text = to_text(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(text, r#"{"x":1,"y":2}"#);
//!
//! let bytes = to_binary(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(bytes[0], 0x80);
//! ```

use crate::error::{Error, Result};
use crate::number::Number64;
use crate::types::NodeType;
use crate::value::marker_kind;
use crate::writer::JsonWriter;
use serde::{ser, Serialize};
use uuid::Uuid;

/// Streams serde events into a writer.
pub struct Serializer<'w> {
    writer: &'w mut dyn JsonWriter,
    /// Extended kind requested by the enclosing marker newtype, consumed by
    /// the next primitive.
    extended: Option<NodeType>,
}

impl<'w> Serializer<'w> {
    pub fn new(writer: &'w mut dyn JsonWriter) -> Self {
        Serializer {
            writer,
            extended: None,
        }
    }

    fn take_extended(&mut self) -> Option<NodeType> {
        self.extended.take()
    }

    fn number(&mut self, value: Number64) -> Result<()> {
        self.extended = None;
        self.writer.write_number_value(value)
    }

    fn variant_start(&mut self, variant: &str) -> Result<()> {
        self.writer.write_object_start()?;
        self.writer.write_field_name(variant)
    }
}

impl<'a, 'w> ser::Serializer for &'a mut Serializer<'w> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a, 'w>;
    type SerializeTuple = Compound<'a, 'w>;
    type SerializeTupleStruct = Compound<'a, 'w>;
    type SerializeTupleVariant = Compound<'a, 'w>;
    type SerializeMap = Compound<'a, 'w>;
    type SerializeStruct = Compound<'a, 'w>;
    type SerializeStructVariant = Compound<'a, 'w>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer.write_bool_value(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Int8) => self.writer.write_int8_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Int16) => self.writer.write_int16_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Int32) => self.writer.write_int32_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Int64) => self.writer.write_int64_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.number(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.number(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::UInt32) => self.writer.write_uint32_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        let v = i64::try_from(v)
            .map_err(|_| Error::custom(format!("{} does not fit a signed 64-bit number", v)))?;
        self.number(v.into())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Float32) => self.writer.write_float32_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Float64) => self.writer.write_float64_value(v),
            _ => self.number(v.into()),
        }
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        match self.take_extended() {
            Some(NodeType::Guid) => {
                let guid = Uuid::parse_str(v).map_err(Error::custom)?;
                self.writer.write_guid_value(guid)
            }
            _ => self.writer.write_string_value(v),
        }
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.writer.write_binary_value(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.writer.write_null_value()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.extended = marker_kind(name);
        let result = value.serialize(&mut *self);
        self.extended = None;
        result
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.variant_start(variant)?;
        value.serialize(&mut *self)?;
        self.writer.write_object_end()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.writer.write_array_start()?;
        Ok(Compound::new(self, false))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.variant_start(variant)?;
        self.writer.write_array_start()?;
        Ok(Compound::new(self, true))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.writer.write_object_start()?;
        Ok(Compound::new(self, false))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.variant_start(variant)?;
        self.writer.write_object_start()?;
        Ok(Compound::new(self, true))
    }
}

/// State for every compound serde type. `variant` is set when the container
/// sits inside a `{"Variant": ..}` wrapper that must be closed too.
pub struct Compound<'a, 'w> {
    ser: &'a mut Serializer<'w>,
    variant: bool,
}

impl<'a, 'w> Compound<'a, 'w> {
    fn new(ser: &'a mut Serializer<'w>, variant: bool) -> Self {
        Compound { ser, variant }
    }

    fn end_array(self) -> Result<()> {
        self.ser.writer.write_array_end()?;
        if self.variant {
            self.ser.writer.write_object_end()?;
        }
        Ok(())
    }

    fn end_object(self) -> Result<()> {
        self.ser.writer.write_object_end()?;
        if self.variant {
            self.ser.writer.write_object_end()?;
        }
        Ok(())
    }

    fn field<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.ser.writer.write_field_name(key)?;
        value.serialize(&mut *self.ser)
    }
}

impl ser::SerializeSeq for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl ser::SerializeTuple for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl ser::SerializeTupleStruct for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl ser::SerializeTupleVariant for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_array()
    }
}

impl ser::SerializeMap for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(MapKeySerializer)?;
        self.ser.writer.write_field_name(&key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.end_object()
    }
}

impl ser::SerializeStruct for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.end_object()
    }
}

impl ser::SerializeStructVariant for Compound<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.end_object()
    }
}

/// Turns a map key into field-name text.
struct MapKeySerializer;

fn key_must_be_string() -> Error {
    Error::custom("map keys must be strings, integers, chars or bools")
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = ser::Impossible<String, Error>;
    type SerializeTuple = ser::Impossible<String, Error>;
    type SerializeTupleStruct = ser::Impossible<String, Error>;
    type SerializeTupleVariant = ser::Impossible<String, Error>;
    type SerializeMap = ser::Impossible<String, Error>;
    type SerializeStruct = ser::Impossible<String, Error>;
    type SerializeStructVariant = ser::Impossible<String, Error>;

    fn serialize_bool(self, v: bool) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(key_must_be_string())
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(key_must_be_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_must_be_string())
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_must_be_string())
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string())
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_must_be_string())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(key_must_be_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_string())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_string())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_string())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_string())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_string())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_string())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::WriterOptions;
    use crate::writer::{BinaryWriter, TextWriter};
    use crate::Value;
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn text<T: Serialize>(value: &T) -> Result<String> {
        let mut writer = TextWriter::new(WriterOptions::new());
        value.serialize(&mut Serializer::new(&mut writer))?;
        writer.into_string()
    }

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Line(i32, i32),
        Rect { w: u8, h: u8 },
    }

    #[test]
    fn test_enums_are_externally_tagged() {
        assert_eq!(text(&Shape::Empty).unwrap(), r#""Empty""#);
        assert_eq!(text(&Shape::Circle(1.5)).unwrap(), r#"{"Circle":1.5}"#);
        assert_eq!(text(&Shape::Line(1, -2)).unwrap(), r#"{"Line":[1,-2]}"#);
        assert_eq!(
            text(&Shape::Rect { w: 3, h: 4 }).unwrap(),
            r#"{"Rect":{"w":3,"h":4}}"#
        );
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(text(&(i64::MAX as u64)).unwrap(), i64::MAX.to_string());
        assert!(matches!(text(&u64::MAX), Err(Error::Custom(_))));
    }

    #[test]
    fn test_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(2u32, "b");
        map.insert(1u32, "a");
        assert_eq!(text(&map).unwrap(), r#"{"1":"a","2":"b"}"#);

        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 0);
        assert!(text(&bad).is_err());
    }

    #[test]
    fn test_options_and_units() {
        assert_eq!(text(&(None::<i32>, Some(3), ())).unwrap(), "[null,3,null]");
    }

    #[test]
    fn test_value_keeps_extended_kinds() {
        let value = Value::Array(vec![
            Value::Int8(-1),
            Value::Float64(0.25),
            Value::Guid(Uuid::nil()),
            Value::Binary(vec![7]),
        ]);
        let mut writer = BinaryWriter::new(WriterOptions::new());
        value.serialize(&mut Serializer::new(&mut writer)).unwrap();

        let mut direct = BinaryWriter::new(WriterOptions::new());
        value.write_to(&mut direct).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), direct.into_bytes().unwrap());
    }

    #[test]
    fn test_plain_newtype_is_transparent() {
        #[derive(Serialize)]
        struct Meters(i32);
        assert_eq!(text(&Meters(5)).unwrap(), "5");
    }
}
