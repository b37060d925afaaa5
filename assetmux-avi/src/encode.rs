//! Fixed-width little-endian field encoding
//!
//! Header records describe themselves as an ordered list of [`Field`]s and
//! hand that list to [`encode_fields`]. Every field is checked before the
//! first byte is written, so a record with a missing or out-of-range value
//! never leaves a half-written structure on the sink.

use crate::error::{AviError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt;
use std::io::Write;

/// Width and signedness of an encoded integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl FieldType {
    /// Encoded width in bytes
    pub fn width(self) -> usize {
        match self {
            FieldType::U8 | FieldType::I8 => 1,
            FieldType::U16 | FieldType::I16 => 2,
            FieldType::U32 | FieldType::I32 => 4,
        }
    }

    /// Inclusive range of representable values
    pub fn range(self) -> (i64, i64) {
        match self {
            FieldType::U8 => (0, u8::MAX as i64),
            FieldType::I8 => (i8::MIN as i64, i8::MAX as i64),
            FieldType::U16 => (0, u16::MAX as i64),
            FieldType::I16 => (i16::MIN as i64, i16::MAX as i64),
            FieldType::U32 => (0, u32::MAX as i64),
            FieldType::I32 => (i32::MIN as i64, i32::MAX as i64),
        }
    }

    fn write<W: Write>(self, sink: &mut W, value: i64) -> std::io::Result<()> {
        // Range was checked in resolve(), the casts are lossless.
        match self {
            FieldType::U8 => sink.write_u8(value as u8),
            FieldType::I8 => sink.write_i8(value as i8),
            FieldType::U16 => sink.write_u16::<LittleEndian>(value as u16),
            FieldType::I16 => sink.write_i16::<LittleEndian>(value as i16),
            FieldType::U32 => sink.write_u32::<LittleEndian>(value as u32),
            FieldType::I32 => sink.write_i32::<LittleEndian>(value as i32),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::U8 => "uint8",
            FieldType::I8 => "int8",
            FieldType::U16 => "uint16_le",
            FieldType::I16 => "int16_le",
            FieldType::U32 => "uint32_le",
            FieldType::I32 => "int32_le",
        };
        f.write_str(name)
    }
}

/// One named field of a fixed-layout structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
    pub value: Option<i64>,
}

impl Field {
    pub fn new(name: &'static str, field_type: FieldType, value: Option<i64>) -> Self {
        Field {
            name,
            field_type,
            value,
        }
    }

    pub fn u16(name: &'static str, value: impl Into<Option<u16>>) -> Self {
        Self::new(name, FieldType::U16, value.into().map(i64::from))
    }

    pub fn i16(name: &'static str, value: impl Into<Option<i16>>) -> Self {
        Self::new(name, FieldType::I16, value.into().map(i64::from))
    }

    pub fn u32(name: &'static str, value: impl Into<Option<u32>>) -> Self {
        Self::new(name, FieldType::U32, value.into().map(i64::from))
    }

    pub fn i32(name: &'static str, value: impl Into<Option<i32>>) -> Self {
        Self::new(name, FieldType::I32, value.into().map(i64::from))
    }

    fn resolve(&self, record: &'static str) -> Result<i64> {
        let value = self.value.ok_or(AviError::IncompleteHeader {
            record,
            field: self.name,
        })?;

        let (min, max) = self.field_type.range();
        if value < min || value > max {
            return Err(AviError::FieldOverflow {
                field: self.name,
                value,
                field_type: self.field_type,
            });
        }

        Ok(value)
    }
}

/// Total encoded size of a field list
pub fn encoded_len(fields: &[Field]) -> usize {
    fields.iter().map(|f| f.field_type.width()).sum()
}

/// Write `fields` in order, little-endian, with no padding between them
///
/// `record` names the owning structure in error messages.
pub fn encode_fields<W: Write>(record: &'static str, fields: &[Field], sink: &mut W) -> Result<()> {
    let resolved = fields
        .iter()
        .map(|field| Ok((field.field_type, field.resolve(record)?)))
        .collect::<Result<Vec<_>>>()?;

    for (field_type, value) in resolved {
        field_type.write(sink, value)?;
    }

    Ok(())
}
