use std::io::Cursor;

use jet3::{
    Database, DatabaseError,
    executor::scan::{ScanIterator, Scanner},
    types::{PAGE_SIZE, page::RowPointer, value::{DataType, Value}},
    utils::mock::{ColumnSpec, Jet3Builder, MockTable},
};

fn numbers_table(name: &str, count: i32) -> MockTable {
    MockTable::new(
        name,
        vec![
            ColumnSpec::new("N", DataType::LongInt),
            ColumnSpec::new("Label", DataType::Text),
        ],
    )
    .with_rows(
        (0..count)
            .map(|i| vec![Value::Int32(i), Value::Text(format!("row {}", i))])
            .collect(),
    )
}

fn open(table: MockTable) -> Database<Cursor<Vec<u8>>> {
    let mut builder = Jet3Builder::new();
    builder.add_table(table);
    builder.open().unwrap()
}

fn numbers(db: &Database<Cursor<Vec<u8>>>, name: &str) -> Vec<i64> {
    ScanIterator::new(db.rows(name).unwrap())
        .map(|row| row.unwrap().values[0].as_integer().unwrap())
        .collect()
}

#[test]
fn test_scan_yields_rows_in_page_order() {
    let db = open(numbers_table("T", 5));
    assert_eq!(numbers(&db, "T"), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_deleted_rows_are_skipped() {
    let db = open(numbers_table("T", 6).delete_row(0).delete_row(3).delete_row(5));
    assert_eq!(numbers(&db, "T"), vec![1, 2, 4]);
}

#[test]
fn test_scan_crosses_pages() {
    let db = open(
        numbers_table("T", 10)
            .rows_per_page(3)
            .delete_row(3)
            .delete_row(4)
            .delete_row(5),
    );
    let pages = db.table_pages("T").unwrap();
    assert_eq!(pages.len(), 4);

    let mut scanner = db.rows("T").unwrap();
    assert_eq!(scanner.current_page(), None);
    let mut seen = Vec::new();
    while let Some(row) = scanner.scan().unwrap() {
        let location = row.location.unwrap();
        assert_eq!(scanner.current_page(), Some(location.page_number()));
        seen.push(row.values[0].as_integer().unwrap());
    }
    // The second page holds only deleted rows.
    assert_eq!(seen, vec![0, 1, 2, 6, 7, 8, 9]);
    assert!(scanner.is_exhausted());
}

#[test]
fn test_rows_carry_their_location() {
    let db = open(numbers_table("T", 4).delete_row(1).rows_per_page(2));
    let pages = db.table_pages("T").unwrap();
    let locations: Vec<RowPointer> = ScanIterator::new(db.rows("T").unwrap())
        .map(|row| row.unwrap().location.unwrap())
        .collect();
    assert_eq!(
        locations,
        vec![
            RowPointer::new(pages[0], 0),
            RowPointer::new(pages[1], 0),
            RowPointer::new(pages[1], 1),
        ]
    );
}

#[test]
fn test_empty_table_is_exhausted_immediately() {
    let db = open(numbers_table("Empty", 0));
    let mut scanner = db.rows("Empty").unwrap();
    assert!(scanner.scan().unwrap().is_none());
    assert!(scanner.is_exhausted());
    assert!(scanner.scan().unwrap().is_none());
}

#[test]
fn test_reset_restarts_the_scan() {
    let db = open(numbers_table("T", 3));
    let mut scanner = db.rows("T").unwrap();
    assert_eq!(scanner.scan_batch(10).unwrap().len(), 3);
    assert!(scanner.scan().unwrap().is_none());

    scanner.reset().unwrap();
    assert!(!scanner.is_exhausted());
    let again: Vec<i64> = scanner
        .scan_batch(10)
        .unwrap()
        .iter()
        .map(|row| row.values[0].as_integer().unwrap())
        .collect();
    assert_eq!(again, vec![0, 1, 2]);
}

#[test]
fn test_scan_batch_sizes() {
    let db = open(numbers_table("T", 10).rows_per_page(4));
    let mut scanner = db.rows("T").unwrap();
    let sizes: Vec<usize> = (0..4).map(|_| scanner.scan_batch(4).unwrap().len()).collect();
    assert_eq!(sizes, vec![4, 4, 2, 0]);
    assert_eq!(scanner.batch_size(), 32);
}

#[test]
fn test_scan_iterator_round_trips_scanner() {
    let db = open(numbers_table("T", 2));
    let mut iter = ScanIterator::new(db.rows("T").unwrap());
    assert!(iter.next().unwrap().is_ok());
    let mut scanner = iter.into_inner();
    assert_eq!(scanner.scan().unwrap().unwrap().values[0], Value::Int32(1));
}

#[test]
fn test_non_data_page_stops_the_scan() {
    let mut builder = Jet3Builder::new();
    builder.add_table(numbers_table("T", 4).rows_per_page(2));
    let db = builder.open().unwrap();
    let pages = db.table_pages("T").unwrap();

    let mut bytes = builder.build();
    bytes[pages[1] as usize * PAGE_SIZE] = 0x04;
    let db = Database::from_reader(Cursor::new(bytes)).unwrap();

    let mut scanner = db.rows("T").unwrap();
    assert_eq!(scanner.scan_batch(2).unwrap().len(), 2);
    assert!(matches!(
        scanner.scan(),
        Err(DatabaseError::CorruptedPage { page_number, .. }) if page_number == pages[1]
    ));
    assert!(scanner.is_exhausted());
    assert!(scanner.scan().unwrap().is_none());
}

#[test]
fn test_catalog_table_is_scannable() {
    let db = open(numbers_table("T", 1));
    let names: Vec<String> = ScanIterator::new(db.rows("MSysObjects").unwrap())
        .map(|row| row.unwrap().values[2].as_text().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["MSysObjects", "T"]);
}

#[test]
fn test_slot_beyond_row_pointer_range_is_corruption() {
    let rows: Vec<Vec<Value>> = (0..300).map(|i| vec![Value::Bool(i % 2 == 0)]).collect();
    let flags = MockTable::new("Flags", vec![ColumnSpec::new("F", DataType::Bool)]);
    let db = open(flags.with_rows(rows));
    let pages = db.table_pages("Flags").unwrap();
    assert_eq!(pages.len(), 1);

    let mut scanner = db.rows("Flags").unwrap();
    let first = scanner.scan_batch(256).unwrap();
    assert_eq!(first.len(), 256);
    assert_eq!(first[255].location, Some(RowPointer::new(pages[0], 255)));
    assert!(matches!(
        scanner.scan(),
        Err(DatabaseError::CorruptedPage { page_number, .. }) if page_number == pages[0]
    ));
    assert!(scanner.is_exhausted());
}
