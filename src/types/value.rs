use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column type tags as stored in a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,       // 0x01, 1 bit
    Byte,       // 0x02, 8 bits
    Int,        // 0x03, 16 bits
    LongInt,    // 0x04, 32 bits
    Money,      // 0x05, 64 bits
    Float,      // 0x06, 32 bits
    Double,     // 0x07, 64 bits
    DateTime,   // 0x08, 64 bits
    Binary,     // 0x09, up to 255 bytes
    Text,       // 0x0A, up to 255 bytes
    LongBinary, // 0x0B, OLE
    LongText,   // 0x0C, Memo
    Unknown0D,
    Unknown0E,
    Guid,    // 0x0F
    Numeric, // 0x10, scaled decimal (17 bytes)
    Invalid(u8),
}

impl DataType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => DataType::Bool,
            0x02 => DataType::Byte,
            0x03 => DataType::Int,
            0x04 => DataType::LongInt,
            0x05 => DataType::Money,
            0x06 => DataType::Float,
            0x07 => DataType::Double,
            0x08 => DataType::DateTime,
            0x09 => DataType::Binary,
            0x0A => DataType::Text,
            0x0B => DataType::LongBinary,
            0x0C => DataType::LongText,
            0x0D => DataType::Unknown0D,
            0x0E => DataType::Unknown0E,
            0x0F => DataType::Guid,
            0x10 => DataType::Numeric,
            other => DataType::Invalid(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            DataType::Bool => 0x01,
            DataType::Byte => 0x02,
            DataType::Int => 0x03,
            DataType::LongInt => 0x04,
            DataType::Money => 0x05,
            DataType::Float => 0x06,
            DataType::Double => 0x07,
            DataType::DateTime => 0x08,
            DataType::Binary => 0x09,
            DataType::Text => 0x0A,
            DataType::LongBinary => 0x0B,
            DataType::LongText => 0x0C,
            DataType::Unknown0D => 0x0D,
            DataType::Unknown0E => 0x0E,
            DataType::Guid => 0x0F,
            DataType::Numeric => 0x10,
            DataType::Invalid(other) => *other,
        }
    }

    /// Storage size of the type in the fixed region of a row, if it has one.
    pub fn fixed_size(&self) -> Option<u16> {
        match self {
            DataType::Bool => Some(0),
            DataType::Byte => Some(1),
            DataType::Int => Some(2),
            DataType::LongInt | DataType::Float => Some(4),
            DataType::Money | DataType::Double | DataType::DateTime => Some(8),
            DataType::Guid => Some(16),
            DataType::Numeric => Some(17),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "Bool",
            DataType::Byte => "Byte",
            DataType::Int => "Int",
            DataType::LongInt => "LongInt",
            DataType::Money => "Money",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::DateTime => "DateTime",
            DataType::Binary => "Binary",
            DataType::Text => "Text",
            DataType::LongBinary => "LongBinary",
            DataType::LongText => "LongText",
            DataType::Unknown0D => "UNKNOWN_0D",
            DataType::Unknown0E => "UNKNOWN_0E",
            DataType::Guid => "GUID",
            DataType::Numeric => "Numeric",
            DataType::Invalid(_) => "Invalid",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Invalid(code) => write!(f, "0x{:02x}", code),
            other => f.write_str(other.name()),
        }
    }
}

/// A single decoded field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Text(String),
    Binary(Vec<u8>),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widens any integer variant to `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Byte(b) => Some(*b as i64),
            Value::Int16(i) => Some(*i as i64),
            Value::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(b) => write!(f, "{}", b),
            Value::Int16(i) => write!(f, "{}", i),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Text(s) => f.write_str(s),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}
