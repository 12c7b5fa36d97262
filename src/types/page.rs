use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{
    PAGE_ROW_COUNT_OFFSET, PAGE_SIZE, PageNumber, SLOT_DELETED_FLAG, SLOT_DIRECTORY_ENTRY_SIZE,
    SLOT_DIRECTORY_OFFSET, SLOT_OFFSET_MASK, SlotIndex,
    error::{DatabaseError, Result},
    read_u16,
};

/// Leading tag byte of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    DatabaseDefinition = 0x00,
    Data = 0x01,
    TableDefinition = 0x02,
    IntermediateIndex = 0x03,
    LeafIndex = 0x04,
    PageUsage = 0x05,
}

impl PageType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(PageType::DatabaseDefinition),
            0x01 => Ok(PageType::Data),
            0x02 => Ok(PageType::TableDefinition),
            0x03 => Ok(PageType::IntermediateIndex),
            0x04 => Ok(PageType::LeafIndex),
            0x05 => Ok(PageType::PageUsage),
            _ => Err(DatabaseError::InvalidPageType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// A 32-bit row address: the top 24 bits are a page number, the low 8 bits a slot.
///
/// ```text
/// 00000000 00000000 00000000 00000000
/// -------------------------- --------
///            page              row
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowPointer(pub u32);

impl RowPointer {
    pub fn new(page_number: PageNumber, slot: SlotIndex) -> Self {
        RowPointer((page_number << 8) | slot as u32)
    }

    pub fn page_number(&self) -> PageNumber {
        self.0 >> 8
    }

    pub fn slot(&self) -> SlotIndex {
        (self.0 & 0xFF) as SlotIndex
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for RowPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_number(), self.slot())
    }
}

/// Byte range of one row record inside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSlot {
    pub start: usize,
    pub end: usize,
    pub deleted: bool,
}

impl RowSlot {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/*
 * Data Page Layout (Jet3, 2048 bytes)
 * ┌─────────────────────────────────────────────────────────────────┐
 * │ type(1) | unknown(1) | free_space(2) | tdef_ptr(4) | rows(2)    │
 * ├─────────────────────────────────────────────────────────────────┤
 * │ SLOT DIRECTORY  [slot0 start(2)] [slot1 start(2)] ...           │
 * │   0x4000 = deleted, 0x1FFF = offset mask                        │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                    FREE SPACE                                   │
 * ├─────────────────────────────────────────────────────────────────┤
 * │  [...row N...] [...row 1...] [...row 0...]                      │
 * └─────────────────────────────────────────────────────────────────┘
 * Row 0 ends at the page end; row i ends where row i-1 starts.
 */

/// An immutable page read from the file. Always exactly `PAGE_SIZE` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page_number: PageNumber,
    data: Vec<u8>,
}

impl Page {
    pub fn from_bytes(page_number: PageNumber, data: Vec<u8>) -> Result<Self> {
        if data.len() != PAGE_SIZE {
            return Err(DatabaseError::CorruptedPage {
                page_number,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, data.len()),
            });
        }
        Ok(Self { page_number, data })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn tag(&self) -> u8 {
        self.data[0]
    }

    pub fn page_type(&self) -> Result<PageType> {
        PageType::from_u8(self.tag())
    }

    /// Number of entries in the slot directory.
    pub fn row_count(&self) -> u16 {
        u16::from_le_bytes([
            self.data[PAGE_ROW_COUNT_OFFSET],
            self.data[PAGE_ROW_COUNT_OFFSET + 1],
        ])
    }

    /// Resolves a slot to its byte range, reporting whether it has been deleted.
    pub fn locate_row(&self, slot: usize) -> Result<RowSlot> {
        let row_count = self.row_count() as usize;
        if slot >= row_count {
            return Err(DatabaseError::CorruptedPage {
                page_number: self.page_number,
                reason: format!("slot {} out of range ({} rows)", slot, row_count),
            });
        }

        let entry = SLOT_DIRECTORY_OFFSET + slot * SLOT_DIRECTORY_ENTRY_SIZE;
        let raw_start = read_u16(&self.data, entry)
            .map_err(|_| self.corrupt("slot directory overflows page"))?;
        let end = if slot == 0 {
            PAGE_SIZE
        } else {
            let previous = read_u16(&self.data, entry - SLOT_DIRECTORY_ENTRY_SIZE)
                .map_err(|_| self.corrupt("slot directory overflows page"))?;
            (previous & SLOT_OFFSET_MASK) as usize
        };
        let deleted = raw_start & SLOT_DELETED_FLAG != 0;
        let start = (raw_start & SLOT_OFFSET_MASK) as usize;

        if !deleted && (start > end || end > PAGE_SIZE) {
            return Err(self.corrupt(&format!("slot {} has range {}..{}", slot, start, end)));
        }
        Ok(RowSlot { start, end, deleted })
    }

    /// Bytes of a live row, or `None` when the slot is deleted.
    pub fn row(&self, slot: usize) -> Result<Option<&[u8]>> {
        let located = self.locate_row(slot)?;
        if located.deleted {
            return Ok(None);
        }
        Ok(Some(&self.data[located.start..located.end]))
    }

    fn corrupt(&self, reason: &str) -> DatabaseError {
        DatabaseError::CorruptedPage {
            page_number: self.page_number,
            reason: reason.to_string(),
        }
    }
}
