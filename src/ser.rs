//! The packing engine.
//!
//! [`Packer`] walks a [`Format`](crate::Format) and a value slice in
//! lock-step and produces one contiguous byte buffer. It keeps two cursors,
//! one into the values and one into the format, and stops as soon as either
//! runs out. Values the format never reaches are left unconsumed; format
//! tokens after the last value are not executed, except zero padding that
//! directly follows the last consumed value.
//!
//! ## Usage
//!
//! Most callers use the functions in the crate root:
//!
//! ```rust
//! use pubpack::{serialize, values};
//!
//! let bytes = serialize(&values![1, 2, 3, 4], "[c]").unwrap();
//! assert_eq!(bytes, vec![1, 2, 3, 4]);
//! ```
//!
//! ## Direct Packer Usage
//!
//! ```rust
//! use pubpack::{values, PackOptions, Packer};
//!
//! let packer = Packer::new(PackOptions::new().with_format("cft"));
//! let packed = packer.pack(&values![1, 2.5, "hi"]).unwrap();
//!
//! let mut expected = vec![0x01];
//! expected.extend_from_slice(&2.5f32.to_ne_bytes());
//! expected.extend_from_slice(b"hi\0");
//! assert_eq!(packed.bytes(), &expected[..]);
//! assert_eq!(packed.consumed(), 3);
//! ```
//!
//! ## Rust Values
//!
//! [`ValueSerializer`] flattens any `T: Serialize` into a value list, so
//! plain structs can be packed without building [`Value`]s by hand.

use crate::convert;
use crate::format::Instruction;
use crate::{Error, PackOptions, Result, Value};
use serde::{ser, Serialize};

/// Result of one packing call.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Packed {
    bytes: Vec<u8>,
    consumed: usize,
}

impl Packed {
    /// The packed bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of input values the format consumed.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// The packing engine.
///
/// Holds only configuration; all cursor state lives inside one
/// [`Packer::pack`] call, so a packer can be reused freely.
#[derive(Clone, Debug, Default)]
pub struct Packer {
    options: PackOptions,
}

impl Packer {
    pub fn new(options: PackOptions) -> Self {
        Packer { options }
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut PackOptions {
        &mut self.options
    }

    /// Packs `values` according to the configured format.
    ///
    /// # Errors
    ///
    /// For a non-empty `values`, returns [`Error::UnmatchedBracket`] if the
    /// format has a `]` with no `[` before it, and [`Error::EmptyLoop`] if a
    /// loop body replays without consuming a value. Nothing is produced on
    /// error.
    pub fn pack(&self, values: &[Value]) -> Result<Packed> {
        let mut bytes = Vec::with_capacity(self.options.capacity);
        if values.is_empty() {
            return Ok(Packed { bytes, consumed: 0 });
        }

        let format = &self.options.format;
        format.validate()?;
        let program = format.instructions();

        let mut value_index = 0;
        let mut format_index = 0;
        // (loop end position, value_index) of the last backward jump
        let mut last_jump: Option<(usize, usize)> = None;

        while value_index < values.len() && format_index < program.len() {
            match program[format_index] {
                Instruction::Scalar(token) => {
                    convert::append(token, &values[value_index], &mut bytes);
                    value_index += 1;
                }
                Instruction::Skip => value_index += 1,
                Instruction::Pad => bytes.push(0),
                Instruction::LoopBegin | Instruction::Noop => {}
                Instruction::LoopEnd(Some(begin)) => {
                    if last_jump == Some((format_index, value_index)) {
                        return Err(Error::EmptyLoop {
                            position: format_index,
                        });
                    }
                    last_jump = Some((format_index, value_index));
                    format_index = begin + 1;
                    continue;
                }
                Instruction::LoopEnd(None) => {
                    return Err(Error::UnmatchedBracket {
                        position: format_index,
                    })
                }
            }
            format_index += 1;
        }

        if value_index == values.len() {
            while let Some(instruction) = program.get(format_index) {
                match instruction {
                    Instruction::Pad => bytes.push(0),
                    Instruction::Noop => {}
                    _ => break,
                }
                format_index += 1;
            }
        }

        Ok(Packed {
            bytes,
            consumed: value_index,
        })
    }
}

/// Flattens a `T: Serialize` into a list of [`Value`]s.
///
/// Structs, tuples, sequences and newtypes are flattened depth-first in
/// field order. `bool` becomes `0`/`1`, `char` and strings become symbols,
/// `None` and unit contribute nothing, and unit enum variants become a
/// symbol of the variant name. Maps are not supported.
///
/// ```rust
/// use pubpack::{to_values, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Sample { id: u8, gain: f32, label: &'static str }
///
/// let values = to_values(&Sample { id: 3, gain: 0.5, label: "mic" }).unwrap();
/// assert_eq!(values, vec![Value::Integer(3), Value::Float(0.5), Value::from("mic")]);
/// ```
#[derive(Debug, Default)]
pub struct ValueSerializer {
    values: Vec<Value>,
}

impl ValueSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.values
    }

    #[inline]
    fn push(&mut self, value: Value) -> Result<()> {
        self.values.push(value);
        Ok(())
    }
}

impl<'a> ser::Serializer for &'a mut ValueSerializer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.push(Value::from(v))
    }

    // Wraps into i64; an `L` token restores the original bits.
    fn serialize_u64(self, v: u64) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.push(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.values.extend(v.iter().map(|&b| Value::from(b)));
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.push(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
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
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::unsupported_type("maps"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self> {
        Ok(self)
    }
}

macro_rules! flatten_compound {
    ($($trait:ident :: $method:ident),* $(,)?) => {
        $(
            impl<'a> ser::$trait for &'a mut ValueSerializer {
                type Ok = ();
                type Error = Error;

                fn $method<T>(&mut self, value: &T) -> Result<()>
                where
                    T: ?Sized + Serialize,
                {
                    value.serialize(&mut **self)
                }

                fn end(self) -> Result<()> {
                    Ok(())
                }
            }
        )*
    };
}

flatten_compound!(
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field,
);

impl<'a> ser::SerializeStruct for &'a mut ValueSerializer {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for &'a mut ValueSerializer {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
