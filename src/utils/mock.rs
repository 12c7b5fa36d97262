//! Synthesized Jet3 images for tests and benchmarks.
//!
//! [`Jet3Builder`] lays out a complete file: header page, a page of usage-map
//! rows, the `MSysObjects` catalog definition, one definition page per table and
//! the data pages. The lower-level helpers ([`DataPageBuilder`],
//! [`TableDefPage`], [`encode_row`]) build individual structures for unit tests.

use std::{
    fs::File,
    io::{BufReader, Cursor, Write},
    path::Path,
};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::NamedTempFile;

use crate::{
    executor::{row_decoder::null_mask_size, value_decoder::LONG_VALUE_INLINE},
    storage::{
        JET3_MAGIC,
        catalog::{CATALOG_PAGE, CATALOG_TABLE_NAME, SYSTEM_TABLE_FLAGS},
        database::Database,
        page_store::PageStore,
        table_def::{
            COLUMN_FLAG_AUTO_LONG, COLUMN_FLAG_FIXED, COLUMN_RECORD_SIZE, INDEX_ENTRY_SIZE,
            TDEF_SIGNATURE,
        },
        usage_map::{BITS_PER_MAP_PAGE, MAP_TYPE_INLINE, MAP_TYPE_PAGED},
    },
    types::{
        PAGE_ROW_COUNT_OFFSET, PAGE_SIZE, PageNumber, SLOT_DELETED_FLAG, SLOT_DIRECTORY_ENTRY_SIZE,
        SLOT_DIRECTORY_OFFSET,
        error::Result,
        page::{PageType, RowPointer},
        value::{DataType, Value},
    },
};

const MAP_PAGE: PageNumber = 1;

/// A page-sized buffer carrying only the signature.
pub fn header_page() -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    page[..JET3_MAGIC.len()].copy_from_slice(JET3_MAGIC);
    page
}

/// Concatenates pages into an in-memory store. Short pages are zero padded.
pub fn store_from_pages(pages: Vec<Vec<u8>>) -> PageStore<Cursor<Vec<u8>>> {
    let mut image = Vec::with_capacity(pages.len() * PAGE_SIZE);
    for mut page in pages {
        page.resize(PAGE_SIZE, 0);
        image.extend_from_slice(&page);
    }
    PageStore::new(Cursor::new(image))
}

/// A page of type 0x05 whose bitmap has the given bits set.
pub fn usage_map_page(bits: &[usize]) -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    page[0] = PageType::PageUsage.as_u8();
    page[1] = 0x01;
    for &bit in bits {
        assert!(bit < BITS_PER_MAP_PAGE, "bit {} does not fit on a map page", bit);
        page[4 + bit / 8] |= 1 << (bit % 8);
    }
    page
}

/// Inline (type 0) usage-map descriptor covering `pages`.
pub fn inline_usage_map(base: PageNumber, pages: &[PageNumber]) -> Vec<u8> {
    let span = pages.iter().map(|&p| (p - base) as usize + 1).max().unwrap_or(1);
    let mut descriptor = vec![MAP_TYPE_INLINE];
    descriptor.extend_from_slice(&base.to_le_bytes());
    let mut bitmap = vec![0u8; span.div_ceil(8)];
    for &page in pages {
        assert!(page >= base, "page {} precedes map base {}", page, base);
        let bit = (page - base) as usize;
        bitmap[bit / 8] |= 1 << (bit % 8);
    }
    descriptor.extend_from_slice(&bitmap);
    descriptor
}

/// Paged (type 1) usage-map descriptor referencing the given map pages.
pub fn paged_usage_map(map_pages: &[PageNumber]) -> Vec<u8> {
    let mut descriptor = vec![MAP_TYPE_PAGED];
    for page in map_pages {
        descriptor.extend_from_slice(&page.to_le_bytes());
    }
    descriptor
}

/// Builds a data page: rows are packed backward from the end of the page.
#[derive(Debug, Default)]
pub struct DataPageBuilder {
    rows: Vec<(Vec<u8>, bool)>,
    table_page: PageNumber,
}

impl DataPageBuilder {
    pub fn new(table_page: PageNumber) -> Self {
        Self {
            rows: Vec::new(),
            table_page,
        }
    }

    pub fn fits(&self, row_len: usize) -> bool {
        let used: usize = self.rows.iter().map(|(r, _)| r.len()).sum();
        let directory = SLOT_DIRECTORY_OFFSET + (self.rows.len() + 1) * SLOT_DIRECTORY_ENTRY_SIZE;
        directory + used + row_len <= PAGE_SIZE
    }

    pub fn push_row(&mut self, row: Vec<u8>) -> &mut Self {
        self.rows.push((row, false));
        self
    }

    pub fn push_deleted(&mut self, row: Vec<u8>) -> &mut Self {
        self.rows.push((row, true));
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        page[0] = PageType::Data.as_u8();
        page[1] = 0x01;
        page[4..8].copy_from_slice(&self.table_page.to_le_bytes());
        page[PAGE_ROW_COUNT_OFFSET..PAGE_ROW_COUNT_OFFSET + 2]
            .copy_from_slice(&(self.rows.len() as u16).to_le_bytes());

        let mut end = PAGE_SIZE;
        for (index, (row, deleted)) in self.rows.iter().enumerate() {
            let start = end - row.len();
            page[start..end].copy_from_slice(row);
            let mut entry = start as u16;
            if *deleted {
                entry |= SLOT_DELETED_FLAG;
            }
            let at = SLOT_DIRECTORY_OFFSET + index * SLOT_DIRECTORY_ENTRY_SIZE;
            page[at..at + 2].copy_from_slice(&entry.to_le_bytes());
            end = start;
        }
        let directory_end = SLOT_DIRECTORY_OFFSET + self.rows.len() * SLOT_DIRECTORY_ENTRY_SIZE;
        assert!(directory_end <= end, "data page overflow");
        page[2..4].copy_from_slice(&((end - directory_end) as u16).to_le_bytes());
        page
    }
}

/// Physical layout of one column inside a table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub name: String,
    pub data_type: DataType,
    pub num: u16,
    pub var_index: u16,
    pub fixed_offset: u16,
    pub size: u16,
    pub flags: u8,
}

impl ColumnLayout {
    pub fn is_fixed(&self) -> bool {
        self.flags & COLUMN_FLAG_FIXED != 0
    }
}

/// Column declaration for [`Jet3Builder`] tables.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
    pub num: Option<u16>,
    pub auto_increment: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            num: None,
            auto_increment: false,
        }
    }

    pub fn with_num(mut self, num: u16) -> Self {
        self.num = Some(num);
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// Assigns ordinals, fixed offsets and variable slots the way Access lays out a table.
/// Columns keep their declaration order; layout is computed in ordinal order.
pub fn layout_columns(specs: &[ColumnSpec]) -> Vec<ColumnLayout> {
    let mut layouts: Vec<ColumnLayout> = specs
        .iter()
        .enumerate()
        .map(|(position, spec)| ColumnLayout {
            name: spec.name.clone(),
            data_type: spec.data_type,
            num: spec.num.unwrap_or(position as u16),
            var_index: 0,
            fixed_offset: 0,
            size: 0,
            flags: if spec.auto_increment { COLUMN_FLAG_AUTO_LONG } else { 0 },
        })
        .collect();

    let mut order: Vec<usize> = (0..layouts.len()).collect();
    order.sort_by_key(|&i| layouts[i].num);

    let mut fixed_offset = 0u16;
    let mut var_index = 0u16;
    for i in order {
        let layout = &mut layouts[i];
        match layout.data_type.fixed_size() {
            Some(size) => {
                layout.flags |= COLUMN_FLAG_FIXED;
                layout.size = size;
                layout.fixed_offset = fixed_offset;
                fixed_offset += size;
            }
            None => {
                layout.size = 255;
                layout.var_index = var_index;
                var_index += 1;
            }
        }
    }
    layouts
}

/// A table definition page.
#[derive(Debug, Clone, Default)]
pub struct TableDefPage {
    pub num_rows: u32,
    pub columns: Vec<ColumnLayout>,
    pub usage_map: RowPointer,
    pub free_map: RowPointer,
    pub num_real_idx: u32,
    pub continuation: u32,
}

impl TableDefPage {
    pub fn new(columns: Vec<ColumnLayout>, usage_map: RowPointer, free_map: RowPointer) -> Self {
        Self {
            num_rows: 0,
            columns,
            usage_map,
            free_map,
            num_real_idx: 0,
            continuation: 0,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        page[0..4].copy_from_slice(&TDEF_SIGNATURE.to_le_bytes());
        page[4..8].copy_from_slice(&self.continuation.to_le_bytes());
        page[12..16].copy_from_slice(&self.num_rows.to_le_bytes());
        page[20] = 0x4E; // user table
        let num_cols = self.columns.len() as u16;
        let num_var = self.columns.iter().filter(|c| !c.is_fixed()).count() as u16;
        page[21..23].copy_from_slice(&num_cols.to_le_bytes());
        page[23..25].copy_from_slice(&num_var.to_le_bytes());
        page[25..27].copy_from_slice(&num_cols.to_le_bytes());
        page[27..31].copy_from_slice(&self.num_real_idx.to_le_bytes());
        page[31..35].copy_from_slice(&self.num_real_idx.to_le_bytes());
        page[35..39].copy_from_slice(&self.usage_map.to_le_bytes());
        page[39..43].copy_from_slice(&self.free_map.to_le_bytes());

        let mut cursor = 43 + self.num_real_idx as usize * INDEX_ENTRY_SIZE;
        for column in &self.columns {
            let record = &mut page[cursor..cursor + COLUMN_RECORD_SIZE];
            record[0] = column.data_type.as_u8();
            record[1..3].copy_from_slice(&column.num.to_le_bytes());
            record[3..5].copy_from_slice(&column.var_index.to_le_bytes());
            record[5..7].copy_from_slice(&column.num.to_le_bytes());
            record[13] = column.flags;
            record[14..16].copy_from_slice(&column.fixed_offset.to_le_bytes());
            record[16..18].copy_from_slice(&column.size.to_le_bytes());
            cursor += COLUMN_RECORD_SIZE;
        }
        for column in &self.columns {
            let name = encode_text(&column.name);
            page[cursor] = name.len() as u8;
            page[cursor + 1..cursor + 1 + name.len()].copy_from_slice(&name);
            cursor += 1 + name.len();
        }
        assert!(cursor <= PAGE_SIZE, "table definition overflows its page");
        page
    }
}

pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

/// Inverse of the date decoding: days since 1899-12-30 with a signed whole part
/// and the time of day as an unsigned fraction.
pub fn encode_datetime(value: DateTime<Utc>) -> f64 {
    let epoch = Utc.with_ymd_and_hms(1899, 12, 30, 0, 0, 0).unwrap();
    let seconds = (value - epoch).num_seconds();
    let day = seconds.div_euclid(86_400);
    let fraction = seconds.rem_euclid(86_400) as f64 / 86_400.0;
    if day < 0 {
        day as f64 - fraction
    } else {
        day as f64 + fraction
    }
}

/// Inline long-value encoding: 12 byte header followed by the payload.
pub fn inline_long_value(payload: &[u8]) -> Vec<u8> {
    let header = payload.len() as u32 | (LONG_VALUE_INLINE as u32) << 24;
    let mut bytes = header.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(payload);
    bytes
}

fn encode_field(data_type: DataType, value: &Value) -> Vec<u8> {
    match (data_type, value) {
        (_, Value::Binary(raw)) if data_type != DataType::LongBinary => raw.clone(),
        (DataType::Byte, Value::Byte(b)) => vec![*b],
        (DataType::Int, Value::Int16(i)) => i.to_le_bytes().to_vec(),
        (DataType::LongInt, Value::Int32(i)) => i.to_le_bytes().to_vec(),
        (DataType::DateTime, Value::DateTime(dt)) => {
            encode_datetime(*dt).to_bits().to_le_bytes().to_vec()
        }
        (DataType::Text, Value::Text(s)) => encode_text(s),
        (DataType::LongText, Value::Text(s)) => inline_long_value(&encode_text(s)),
        (DataType::LongBinary, Value::Binary(b)) => inline_long_value(b),
        (data_type, value) => panic!("cannot store {:?} in a {} column", value, data_type),
    }
}

/// Encodes a row record from raw parts.
///
/// `present` lists the ordinals whose null-mask bit is set. The variable
/// values are laid out in slot order after the fixed region, and a jump
/// table is emitted whenever the offsets pass 256.
pub fn encode_row(num_cols: usize, fixed: &[u8], variable: &[Vec<u8>], present: &[u16]) -> Vec<u8> {
    let bitmask_size = null_mask_size(num_cols);
    let mut null_mask = vec![0u8; bitmask_size];
    for &num in present {
        null_mask[num as usize / 8] |= 1 << (num % 8);
    }

    let mut row = vec![num_cols as u8];
    row.extend_from_slice(fixed);

    if variable.is_empty() {
        row.extend_from_slice(&null_mask);
        return row;
    }

    let mut offsets = vec![row.len()];
    for value in variable {
        row.extend_from_slice(value);
        offsets.push(row.len());
    }

    let count = variable.len();
    assert!(count < 0xFF, "too many variable columns for one row");
    let data_end = row.len();

    // Smallest jump table consistent with the final row length.
    let mut jumps = 0;
    loop {
        let len = data_end + (count + 1) + jumps + 1 + bitmask_size;
        let needed = (len - 1) / 256;
        if needed == jumps {
            break;
        }
        jumps = needed;
    }

    let mut jump_table = vec![0xFFu8; jumps];
    for (k, slot) in jump_table.iter_mut().enumerate().take(data_end / 256) {
        let threshold = (k + 1) * 256;
        let index = offsets
            .iter()
            .position(|&o| o >= threshold)
            .expect("offset past threshold");
        *slot = index as u8;
    }
    for pair in jump_table[..(data_end / 256).min(jumps)].windows(2) {
        assert!(pair[0] < pair[1], "a variable value may not span two jumps");
    }

    for offset in offsets.iter().rev() {
        row.push((offset & 0xFF) as u8);
    }
    for k in (0..jumps).rev() {
        row.push(jump_table[k]);
    }
    row.push(count as u8);
    row.extend_from_slice(&null_mask);
    row
}

/// Encodes typed values (declaration order) against a column layout.
pub fn encode_values(columns: &[ColumnLayout], values: &[Value]) -> Vec<u8> {
    assert_eq!(columns.len(), values.len(), "one value per column");
    let fixed_len: usize = columns
        .iter()
        .filter(|c| c.is_fixed())
        .map(|c| c.fixed_offset as usize + c.size as usize)
        .max()
        .unwrap_or(0);
    let var_count = columns.iter().filter(|c| !c.is_fixed()).count();

    let mut fixed = vec![0u8; fixed_len];
    let mut variable = vec![Vec::new(); var_count];
    let mut present = Vec::new();

    for (column, value) in columns.iter().zip(values) {
        if column.data_type == DataType::Bool {
            if !matches!(value, Value::Bool(true)) {
                present.push(column.num);
            }
            continue;
        }
        if value.is_null() {
            continue;
        }
        present.push(column.num);
        let bytes = encode_field(column.data_type, value);
        if column.is_fixed() {
            let start = column.fixed_offset as usize;
            fixed[start..start + bytes.len()].copy_from_slice(&bytes);
        } else {
            variable[column.var_index as usize] = bytes;
        }
    }

    encode_row(columns.len(), &fixed, &variable, &present)
}

/// A table to be laid out by [`Jet3Builder`].
#[derive(Debug, Clone)]
pub struct MockTable {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Value>>,
    pub deleted: Vec<usize>,
    pub flags: u32,
    pub rows_per_page: Option<usize>,
    pub paged_usage_map: bool,
}

impl MockTable {
    pub fn new(name: &str, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
            deleted: Vec::new(),
            flags: 0,
            rows_per_page: None,
            paged_usage_map: false,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Value>>) -> Self {
        self.rows = rows;
        self
    }

    /// Keeps the row on disk but marks its slot deleted.
    pub fn delete_row(mut self, index: usize) -> Self {
        self.deleted.push(index);
        self
    }

    pub fn system(mut self) -> Self {
        self.flags = SYSTEM_TABLE_FLAGS;
        self
    }

    pub fn rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = Some(rows);
        self
    }

    pub fn paged_usage_map(mut self) -> Self {
        self.paged_usage_map = true;
        self
    }

    fn live_rows(&self) -> u32 {
        (self.rows.len() - self.deleted.len()) as u32
    }
}

pub fn catalog_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("Id", DataType::LongInt).with_num(0),
        ColumnSpec::new("ParentId", DataType::LongInt).with_num(1),
        ColumnSpec::new("Name", DataType::Text).with_num(2),
        ColumnSpec::new("Type", DataType::Int).with_num(3),
        ColumnSpec::new("DateCreate", DataType::DateTime).with_num(4),
        ColumnSpec::new("DateUpdate", DataType::DateTime).with_num(5),
        ColumnSpec::new("Flags", DataType::LongInt).with_num(6),
    ]
}

/// A catalog row for a non-table object such as a form.
#[derive(Debug, Clone)]
pub struct MockObject {
    pub id: i32,
    pub name: String,
    pub kind: i16,
}

/// Lays out a complete Jet3 file.
#[derive(Debug, Clone, Default)]
pub struct Jet3Builder {
    tables: Vec<MockTable>,
    objects: Vec<MockObject>,
    created: Option<DateTime<Utc>>,
}

impl Jet3Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: MockTable) -> &mut Self {
        self.tables.push(table);
        self
    }

    pub fn add_object(&mut self, id: i32, name: &str, kind: i16) -> &mut Self {
        self.objects.push(MockObject {
            id,
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn created_at(&mut self, when: DateTime<Utc>) -> &mut Self {
        self.created = Some(when);
        self
    }

    /// Schema page assigned to the `index`-th added table.
    pub fn table_page(&self, index: usize) -> PageNumber {
        CATALOG_PAGE + 1 + index as PageNumber
    }

    fn catalog_table(&self) -> MockTable {
        let created = self
            .created
            .map(Value::DateTime)
            .unwrap_or(Value::Null);
        let entry = |id: i32, name: &str, kind: i16, flags: u32| {
            vec![
                Value::Int32(id),
                Value::Int32(0x0F00_0001),
                Value::Text(name.to_string()),
                Value::Int16(kind),
                created.clone(),
                created.clone(),
                Value::Int32(flags as i32),
            ]
        };

        let mut rows = vec![entry(CATALOG_PAGE as i32, CATALOG_TABLE_NAME, 1, SYSTEM_TABLE_FLAGS)];
        for (index, table) in self.tables.iter().enumerate() {
            rows.push(entry(self.table_page(index) as i32, &table.name, 1, table.flags));
        }
        for object in &self.objects {
            rows.push(entry(object.id, &object.name, object.kind, 0));
        }
        MockTable::new(CATALOG_TABLE_NAME, catalog_columns()).with_rows(rows)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tables = vec![(CATALOG_PAGE, self.catalog_table())];
        for (index, table) in self.tables.iter().enumerate() {
            tables.push((self.table_page(index), table.clone()));
        }

        let first_data_page = self.table_page(self.tables.len());
        let mut pages: Vec<Vec<u8>> = vec![Vec::new(); first_data_page as usize];
        pages[0] = header_page();

        let mut map_rows = Vec::new();
        let mut paged_maps = Vec::new();

        for (tdef_page, table) in &tables {
            let layout = layout_columns(&table.columns);

            let mut data_pages = Vec::new();
            let mut builder = DataPageBuilder::new(*tdef_page);
            for (row_index, values) in table.rows.iter().enumerate() {
                let encoded = encode_values(&layout, values);
                let full = table.rows_per_page.is_some_and(|n| builder.len() >= n);
                if full || !builder.fits(encoded.len()) {
                    data_pages.push(pages.len() as PageNumber);
                    pages.push(builder.build());
                    builder = DataPageBuilder::new(*tdef_page);
                }
                if table.deleted.contains(&row_index) {
                    builder.push_deleted(encoded);
                } else {
                    builder.push_row(encoded);
                }
            }
            if !builder.is_empty() {
                data_pages.push(pages.len() as PageNumber);
                pages.push(builder.build());
            }

            let usage = if table.paged_usage_map {
                paged_maps.push((map_rows.len(), data_pages.clone()));
                Vec::new()
            } else {
                let base = data_pages.first().copied().unwrap_or(0);
                inline_usage_map(base, &data_pages)
            };
            let usage_slot = map_rows.len() as u8;
            map_rows.push(usage);
            let free_slot = map_rows.len() as u8;
            map_rows.push(inline_usage_map(0, &[]));

            let mut tdef = TableDefPage::new(
                layout,
                RowPointer::new(MAP_PAGE, usage_slot),
                RowPointer::new(MAP_PAGE, free_slot),
            );
            tdef.num_rows = table.live_rows();
            pages[*tdef_page as usize] = tdef.build();
        }

        for (slot, data_pages) in paged_maps {
            let bits: Vec<usize> = data_pages.iter().map(|&p| p as usize).collect();
            let map_page = pages.len() as PageNumber;
            pages.push(usage_map_page(&bits));
            map_rows[slot] = paged_usage_map(&[map_page]);
        }

        let mut map_page = DataPageBuilder::new(0);
        for row in map_rows {
            map_page.push_row(row);
        }
        pages[MAP_PAGE as usize] = map_page.build();

        pages.into_iter().flatten().collect()
    }

    pub fn store(&self) -> PageStore<Cursor<Vec<u8>>> {
        PageStore::new(Cursor::new(self.build()))
    }

    pub fn open(&self) -> Result<Database<Cursor<Vec<u8>>>> {
        Database::from_reader(Cursor::new(self.build()))
    }
}

/// A synthesized database written to a temporary file, removed on drop.
pub struct TempDatabase {
    file: NamedTempFile,
}

impl TempDatabase {
    pub fn new(builder: &Jet3Builder) -> std::io::Result<Self> {
        Self::from_bytes(&builder.build())
    }

    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("jet3_test_")
            .suffix(".mdb")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn open(&self) -> Result<Database<BufReader<File>>> {
        Database::open(self.path())
    }
}
