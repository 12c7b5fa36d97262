use std::{
    collections::HashSet,
    io::{Read, Seek},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::warn;

use crate::{
    storage::page_store::PageStore,
    types::{
        error::{DatabaseError, Result},
        page::RowPointer,
        read_u8, read_u16, read_u32, read_u64, slice,
        value::{DataType, Value},
    },
};

pub const LONG_VALUE_INLINE: u8 = 0x80;
pub const LONG_VALUE_SINGLE_PAGE: u8 = 0x40;
pub const LONG_VALUE_CHAINED: u8 = 0x00;

pub const LONG_VALUE_HEADER_SIZE: usize = 12;
const LONG_VALUE_POINTER: usize = 4;
const SEGMENT_HEADER_SIZE: usize = 4;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decodes one column's raw bytes into a typed value.
pub fn decode_value<R: Read + Seek>(
    store: &PageStore<R>,
    data_type: DataType,
    bytes: &[u8],
) -> Result<Value> {
    match data_type {
        DataType::Bool => Ok(Value::Bool(read_u8(bytes, 0)? != 0)),
        DataType::Byte => Ok(Value::Byte(read_u8(bytes, 0)?)),
        DataType::Int => Ok(Value::Int16(read_u16(bytes, 0)? as i16)),
        DataType::LongInt => Ok(Value::Int32(read_u32(bytes, 0)? as i32)),
        DataType::DateTime => {
            let days = f64::from_bits(read_u64(bytes, 0)?);
            Ok(Value::DateTime(decode_datetime(days)?))
        }
        DataType::Binary => Ok(Value::Binary(bytes.to_vec())),
        DataType::Text => Ok(Value::Text(decode_text(bytes))),
        DataType::LongBinary => Ok(Value::Binary(decode_long_value(store, bytes)?)),
        DataType::LongText => Ok(Value::Text(decode_text(&decode_long_value(store, bytes)?))),
        DataType::Money
        | DataType::Float
        | DataType::Double
        | DataType::Unknown0D
        | DataType::Unknown0E
        | DataType::Guid
        | DataType::Numeric => Err(DatabaseError::UnsupportedDataType(data_type)),
        DataType::Invalid(code) => Err(DatabaseError::InvalidDataType(code)),
    }
}

/// Jet3 text is single-byte code page text; bytes map to the first 256 code points.
pub fn decode_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Converts an OLE automation date (days since 1899-12-30) to UTC.
///
/// Whole days are truncated toward zero; the absolute fraction is rounded to
/// the nearest second and added, so -1.5 is 1899-12-29 12:00:00.
pub fn decode_datetime(days: f64) -> Result<DateTime<Utc>> {
    if !days.is_finite() {
        return Err(DatabaseError::MalformedRow {
            reason: format!("date value {} is not finite", days),
        });
    }
    let epoch = Utc.with_ymd_and_hms(1899, 12, 30, 0, 0, 0).single().ok_or_else(|| {
        DatabaseError::MalformedRow {
            reason: "date epoch out of range".to_string(),
        }
    })?;
    let whole = days.trunc();
    let seconds = ((days - whole).abs() * SECONDS_PER_DAY + 0.5) as i64;
    let offset = Duration::try_days(whole as i64)
        .and_then(|d| d.checked_add(&Duration::seconds(seconds)));
    offset
        .and_then(|d| epoch.checked_add_signed(d))
        .ok_or_else(|| DatabaseError::MalformedRow {
            reason: format!("date value {} is out of range", days),
        })
}

/// Reassembles a long (memo/OLE) value.
///
/// ```text
/// [size: 3 bytes][mode: 1 byte][row pointer: 4 bytes][4 bytes][inline data ...]
/// mode 0x80: data inline at byte 12
/// mode 0x40: row pointer names a single row holding the whole value
/// mode 0x00: row pointer names the first of a chain of segments,
///            each segment is [next pointer: 4 bytes][payload ...]
/// ```
pub fn decode_long_value<R: Read + Seek>(store: &PageStore<R>, bytes: &[u8]) -> Result<Vec<u8>> {
    let header = read_u32(bytes, 0)?;
    let size = (header & 0x00FF_FFFF) as usize;
    let mode = (header >> 24) as u8;

    match mode {
        LONG_VALUE_INLINE => {
            Ok(slice(bytes, LONG_VALUE_HEADER_SIZE, LONG_VALUE_HEADER_SIZE + size)?.to_vec())
        }
        LONG_VALUE_SINGLE_PAGE => {
            let pointer = RowPointer(read_u32(bytes, LONG_VALUE_POINTER)?);
            store.resolve_live_pointer(pointer)
        }
        LONG_VALUE_CHAINED => {
            let first = RowPointer(read_u32(bytes, LONG_VALUE_POINTER)?);
            read_long_value_chain(store, first, size)
        }
        other => Err(DatabaseError::InvalidLongValueHeader(other)),
    }
}

fn read_long_value_chain<R: Read + Seek>(
    store: &PageStore<R>,
    first: RowPointer,
    size: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size);
    let mut visited = HashSet::new();
    let mut pointer = first;

    while !pointer.is_null() && size != 0 {
        if !visited.insert(pointer) {
            warn!(%pointer, segments = visited.len(), "long value chain loops back on itself");
            return Err(DatabaseError::CorruptedPage {
                page_number: pointer.page_number(),
                reason: format!("long value chain revisits segment {}", pointer),
            });
        }
        let segment = store.resolve_live_pointer(pointer)?;
        if segment.len() < SEGMENT_HEADER_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_number: pointer.page_number(),
                reason: format!("long value segment {} is {} bytes", pointer, segment.len()),
            });
        }
        if out.len() + segment.len() - SEGMENT_HEADER_SIZE > size {
            break;
        }
        out.extend_from_slice(&segment[SEGMENT_HEADER_SIZE..]);
        pointer = RowPointer(read_u32(&segment, 0)?);
    }

    if out.len() != size {
        warn!(
            expected_bytes = size,
            got_bytes = out.len(),
            last_pointer = %pointer,
            "long value chain does not match its declared length"
        );
        return Err(DatabaseError::LongValueLengthMismatch {
            expected: size,
            actual: out.len(),
        });
    }
    Ok(out)
}
