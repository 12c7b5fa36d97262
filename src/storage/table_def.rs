use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    executor::value_decoder::decode_text,
    storage::{page_store::PageStore, usage_map::UsageMap},
    types::{
        PageNumber,
        error::{DatabaseError, Result},
        page::{Page, RowPointer},
        read_u8, read_u16, read_u32, slice,
        value::DataType,
    },
};

pub const TDEF_SIGNATURE: u32 = 0x4356_0102;

// Offsets relative to the start of the table definition page.
const TDEF_CONTINUATION: usize = 4;
const TDEF_NUM_ROWS: usize = 12;
const TDEF_KIND: usize = 20;
const TDEF_MAX_COLS: usize = 21;
const TDEF_NUM_VAR_COLS: usize = 23;
const TDEF_NUM_COLS: usize = 25;
const TDEF_NUM_IDX: usize = 27;
const TDEF_NUM_REAL_IDX: usize = 31;
const TDEF_USAGE_MAP_PTR: usize = 35;
const TDEF_FREE_MAP_PTR: usize = 39;
const TDEF_INDEX_REGION: usize = 43;

pub const INDEX_ENTRY_SIZE: usize = 8;
pub const COLUMN_RECORD_SIZE: usize = 18;

// Offsets inside an 18-byte column record.
const COL_TYPE: usize = 0;
const COL_NUM: usize = 1;
const COL_VAR_INDEX: usize = 3;
const COL_FLAGS: usize = 13;
const COL_FIXED_OFFSET: usize = 14;
const COL_SIZE: usize = 16;

pub const COLUMN_FLAG_FIXED: u8 = 0x01;
pub const COLUMN_FLAG_AUTO_LONG: u8 = 0x04;
pub const COLUMN_FLAG_AUTO_UUID: u8 = 0x40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    /// Stable ordinal. Null bitmask and offset tables are addressed by this.
    pub num: u16,
    pub size: u16,
    pub var_index: u16,
    pub fixed_offset: u16,
    pub is_fixed: bool,
    pub is_auto_long: bool,
    pub is_auto_uuid: bool,
}

impl Column {
    fn parse(record: &[u8]) -> Result<Self> {
        let flags = read_u8(record, COL_FLAGS)?;
        Ok(Self {
            name: String::new(),
            data_type: DataType::from_u8(read_u8(record, COL_TYPE)?),
            num: read_u16(record, COL_NUM)?,
            size: read_u16(record, COL_SIZE)?,
            var_index: read_u16(record, COL_VAR_INDEX)?,
            fixed_offset: read_u16(record, COL_FIXED_OFFSET)?,
            is_fixed: flags & COLUMN_FLAG_FIXED != 0,
            is_auto_long: flags & COLUMN_FLAG_AUTO_LONG != 0,
            is_auto_uuid: flags & COLUMN_FLAG_AUTO_UUID != 0,
        })
    }
}

/// Decoded schema of one table. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub page_number: PageNumber,
    pub num_rows: u32,
    pub kind: u8,
    pub max_cols: u16,
    pub num_var_cols: u16,
    pub num_cols: u16,
    pub num_idx: u32,
    pub num_real_idx: u32,
    pub usage_map: Vec<u8>,
    pub free_map: Vec<u8>,
    /// Sorted by `num` ascending.
    pub columns: Vec<Column>,
}

impl TableDefinition {
    /// Reads and decodes the table definition stored on `page_number`.
    pub fn read<R: Read + Seek>(
        store: &PageStore<R>,
        name: &str,
        page_number: PageNumber,
    ) -> Result<Self> {
        let page = store.read_page(page_number)?;
        Self::from_page(store, name, &page)
    }

    pub fn from_page<R: Read + Seek>(
        store: &PageStore<R>,
        name: &str,
        page: &Page,
    ) -> Result<Self> {
        let buff = page.data();
        let page_number = page.page_number;

        if read_u32(buff, 0)? != TDEF_SIGNATURE {
            return Err(DatabaseError::InvalidSignature { page_number });
        }
        if read_u32(buff, TDEF_CONTINUATION)? != 0 {
            return Err(DatabaseError::MultiPageTableDefinition { page_number });
        }

        let num_rows = read_u32(buff, TDEF_NUM_ROWS)?;
        let kind = read_u8(buff, TDEF_KIND)?;
        let max_cols = read_u16(buff, TDEF_MAX_COLS)?;
        let num_var_cols = read_u16(buff, TDEF_NUM_VAR_COLS)?;
        let num_cols = read_u16(buff, TDEF_NUM_COLS)?;
        let num_idx = read_u32(buff, TDEF_NUM_IDX)?;
        let num_real_idx = read_u32(buff, TDEF_NUM_REAL_IDX)?;

        let usage_ptr = RowPointer(read_u32(buff, TDEF_USAGE_MAP_PTR)?);
        let free_ptr = RowPointer(read_u32(buff, TDEF_FREE_MAP_PTR)?);
        let usage_map = store.resolve_live_pointer(usage_ptr)?;
        let free_map = store.resolve_live_pointer(free_ptr)?;

        let mut cursor = TDEF_INDEX_REGION + num_real_idx as usize * INDEX_ENTRY_SIZE;

        let mut columns = Vec::with_capacity(num_cols as usize);
        for _ in 0..num_cols {
            let record = slice(buff, cursor, cursor + COLUMN_RECORD_SIZE)
                .map_err(|_| Self::overflow(page_number, "column records"))?;
            columns.push(Column::parse(record)?);
            cursor += COLUMN_RECORD_SIZE;
        }

        for column in columns.iter_mut() {
            let len = read_u8(buff, cursor)
                .map_err(|_| Self::overflow(page_number, "column names"))?
                as usize;
            let raw = slice(buff, cursor + 1, cursor + 1 + len)
                .map_err(|_| Self::overflow(page_number, "column names"))?;
            column.name = decode_text(raw);
            cursor += 1 + len;
        }

        columns.sort_by_key(|c| c.num);

        debug!(
            table = name,
            page_number,
            num_rows,
            num_cols,
            num_var_cols,
            "decoded table definition"
        );

        Ok(Self {
            name: name.to_string(),
            page_number,
            num_rows,
            kind,
            max_cols,
            num_var_cols,
            num_cols,
            num_idx,
            num_real_idx,
            usage_map,
            free_map,
            columns,
        })
    }

    fn overflow(page_number: PageNumber, region: &str) -> DatabaseError {
        DatabaseError::CorruptedPage {
            page_number,
            reason: format!("{} run past the end of the page", region),
        }
    }

    pub fn usage_map(&self) -> Result<UsageMap<'_>> {
        UsageMap::parse(&self.usage_map)
    }

    pub fn free_map(&self) -> Result<UsageMap<'_>> {
        UsageMap::parse(&self.free_map)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn fixed_column_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_fixed).count()
    }
}
