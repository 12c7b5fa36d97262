pub mod error;
pub mod page;
pub mod row;
pub mod value;

// Common type aliases
pub type PageNumber = u32;
pub type SlotIndex = u8;

// Jet3 on-disk layout constants
pub const PAGE_SIZE: usize = 2048;
pub const PAGE_ROW_COUNT_OFFSET: usize = 8; // u16 row count on data pages
pub const SLOT_DIRECTORY_OFFSET: usize = 10; // first slot entry
pub const SLOT_DIRECTORY_ENTRY_SIZE: usize = 2;

pub const SLOT_DELETED_FLAG: u16 = 0x4000;
pub const SLOT_OFFSET_MASK: u16 = 0x1FFF;

// Byte readers that turn out-of-bounds access into format errors instead of panics.

pub(crate) fn read_u8(bytes: &[u8], offset: usize) -> error::Result<u8> {
    bytes
        .get(offset)
        .copied()
        .ok_or_else(|| out_of_bounds(bytes, offset, 1))
}

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> error::Result<u16> {
    match bytes.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_le_bytes([b[0], b[1]])),
        None => Err(out_of_bounds(bytes, offset, 2)),
    }
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> error::Result<u32> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(out_of_bounds(bytes, offset, 4)),
    }
}

pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> error::Result<u64> {
    match bytes.get(offset..offset + 8) {
        Some(b) => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(b);
            Ok(u64::from_le_bytes(buf))
        }
        None => Err(out_of_bounds(bytes, offset, 8)),
    }
}

pub(crate) fn slice(bytes: &[u8], start: usize, end: usize) -> error::Result<&[u8]> {
    if start > end {
        return Err(error::DatabaseError::MalformedRow {
            reason: format!("range {}..{} is inverted", start, end),
        });
    }
    bytes
        .get(start..end)
        .ok_or_else(|| out_of_bounds(bytes, start, end - start))
}

fn out_of_bounds(bytes: &[u8], offset: usize, len: usize) -> error::DatabaseError {
    error::DatabaseError::MalformedRow {
        reason: format!(
            "read of {} bytes at offset {} exceeds buffer of {} bytes",
            len,
            offset,
            bytes.len()
        ),
    }
}
