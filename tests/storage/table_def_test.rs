use jet3::{
    storage::{
        page_store::PageStore,
        table_def::{TDEF_SIGNATURE, TableDefinition},
        usage_map::UsageMap,
    },
    types::{error::DatabaseError, page::RowPointer, value::DataType},
    utils::mock::{
        ColumnSpec, DataPageBuilder, TableDefPage, header_page, inline_usage_map,
        layout_columns, store_from_pages,
    },
};
use std::io::Cursor;

const TDEF_PAGE: u32 = 2;

fn map_rows_page(deleted_usage: bool) -> Vec<u8> {
    let mut maps = DataPageBuilder::new(0);
    if deleted_usage {
        maps.push_deleted(inline_usage_map(10, &[10, 12]));
    } else {
        maps.push_row(inline_usage_map(10, &[10, 12]));
    }
    maps.push_row(inline_usage_map(0, &[]));
    maps.build()
}

fn sample_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("Title", DataType::Text).with_num(2),
        ColumnSpec::new("Id", DataType::LongInt).with_num(0).auto_increment(),
        ColumnSpec::new("Active", DataType::Bool).with_num(1),
        ColumnSpec::new("Notes", DataType::LongText).with_num(3),
    ]
}

fn sample_tdef() -> TableDefPage {
    let mut tdef = TableDefPage::new(
        layout_columns(&sample_columns()),
        RowPointer::new(1, 0),
        RowPointer::new(1, 1),
    );
    tdef.num_rows = 42;
    tdef
}

fn store_with(tdef_page: Vec<u8>) -> PageStore<Cursor<Vec<u8>>> {
    store_from_pages(vec![header_page(), map_rows_page(false), tdef_page])
}

#[test]
fn test_reads_header_fields() {
    let store = store_with(sample_tdef().build());
    let def = TableDefinition::read(&store, "Books", TDEF_PAGE).unwrap();

    assert_eq!(def.name, "Books");
    assert_eq!(def.page_number, TDEF_PAGE);
    assert_eq!(def.num_rows, 42);
    assert_eq!(def.num_cols, 4);
    assert_eq!(def.max_cols, 4);
    assert_eq!(def.num_var_cols, 2);
    assert_eq!(def.num_real_idx, 0);
    assert_eq!(def.fixed_column_count(), 2);
}

#[test]
fn test_columns_are_sorted_by_ordinal() {
    let store = store_with(sample_tdef().build());
    let def = TableDefinition::read(&store, "Books", TDEF_PAGE).unwrap();

    let names: Vec<&str> = def.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Id", "Active", "Title", "Notes"]);
    let nums: Vec<u16> = def.columns.iter().map(|c| c.num).collect();
    assert_eq!(nums, vec![0, 1, 2, 3]);
    assert_eq!(def.column_index("Title"), Some(2));
    assert_eq!(def.column_index("Missing"), None);
}

#[test]
fn test_column_flags_and_layout() {
    let store = store_with(sample_tdef().build());
    let def = TableDefinition::read(&store, "Books", TDEF_PAGE).unwrap();

    let id = def.get_column("Id").unwrap();
    assert_eq!(id.data_type, DataType::LongInt);
    assert!(id.is_fixed);
    assert!(id.is_auto_long);
    assert!(!id.is_auto_uuid);
    assert_eq!(id.fixed_offset, 0);
    assert_eq!(id.size, 4);

    let active = def.get_column("Active").unwrap();
    assert!(active.is_fixed);
    assert_eq!(active.size, 0);
    assert_eq!(active.fixed_offset, 4);

    let title = def.get_column("Title").unwrap();
    assert!(!title.is_fixed);
    assert_eq!(title.var_index, 0);
    let notes = def.get_column("Notes").unwrap();
    assert_eq!(notes.data_type, DataType::LongText);
    assert_eq!(notes.var_index, 1);
}

#[test]
fn test_index_region_is_skipped() {
    let mut tdef = sample_tdef();
    tdef.num_real_idx = 3;
    let store = store_with(tdef.build());
    let def = TableDefinition::read(&store, "Books", TDEF_PAGE).unwrap();

    assert_eq!(def.num_real_idx, 3);
    assert_eq!(def.num_idx, 3);
    assert_eq!(def.columns[0].name, "Id");
    assert_eq!(def.columns[3].name, "Notes");
}

#[test]
fn test_usage_maps_are_resolved() {
    let store = store_with(sample_tdef().build());
    let def = TableDefinition::read(&store, "Books", TDEF_PAGE).unwrap();

    let usage = def.usage_map().unwrap();
    assert!(matches!(usage, UsageMap::Inline { base: 10, .. }));
    assert_eq!(usage.pages(&store).unwrap(), vec![10, 12]);
    assert!(def.free_map().unwrap().pages(&store).unwrap().is_empty());
}

#[test]
fn test_bad_signature_is_rejected() {
    let mut page = sample_tdef().build();
    page[0] ^= 0xFF;
    let store = store_with(page);
    assert!(matches!(
        TableDefinition::read(&store, "Books", TDEF_PAGE),
        Err(DatabaseError::InvalidSignature { page_number: TDEF_PAGE })
    ));
    assert_eq!(TDEF_SIGNATURE.to_le_bytes(), [0x02, 0x01, 0x56, 0x43]);
}

#[test]
fn test_continuation_page_is_not_implemented() {
    let mut tdef = sample_tdef();
    tdef.continuation = 9;
    let store = store_with(tdef.build());

    let err = TableDefinition::read(&store, "Books", TDEF_PAGE).unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::MultiPageTableDefinition { page_number: TDEF_PAGE }
    ));
    assert!(err.is_not_implemented());
}

#[test]
fn test_column_records_past_page_end_are_corruption() {
    let mut page = sample_tdef().build();
    page[25..27].copy_from_slice(&200u16.to_le_bytes());
    let store = store_with(page);
    assert!(matches!(
        TableDefinition::read(&store, "Books", TDEF_PAGE),
        Err(DatabaseError::CorruptedPage { page_number: TDEF_PAGE, .. })
    ));
}

#[test]
fn test_deleted_usage_map_row_is_corruption() {
    let store = store_from_pages(vec![header_page(), map_rows_page(true), sample_tdef().build()]);
    assert!(matches!(
        TableDefinition::read(&store, "Books", TDEF_PAGE),
        Err(DatabaseError::CorruptedPage { page_number: 1, .. })
    ));
}

#[test]
fn test_latin1_column_names() {
    let columns = layout_columns(&[ColumnSpec::new("Café", DataType::Text)]);
    let tdef = TableDefPage::new(columns, RowPointer::new(1, 0), RowPointer::new(1, 1));
    let store = store_with(tdef.build());
    let def = TableDefinition::read(&store, "Menu", TDEF_PAGE).unwrap();
    assert_eq!(def.columns[0].name, "Café");
}
