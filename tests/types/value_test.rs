use chrono::{TimeZone, Utc};
use jet3::types::{
    error::DatabaseError,
    row::Row,
    value::{DataType, Value},
};

#[test]
fn test_data_type_tags_round_trip() {
    for code in 0x01..=0x10u8 {
        let data_type = DataType::from_u8(code);
        assert!(!matches!(data_type, DataType::Invalid(_)), "0x{:02x}", code);
        assert_eq!(data_type.as_u8(), code);
    }
    assert_eq!(DataType::from_u8(0x11), DataType::Invalid(0x11));
    assert_eq!(DataType::from_u8(0x00), DataType::Invalid(0x00));
}

#[test]
fn test_data_type_names() {
    assert_eq!(DataType::LongText.to_string(), "LongText");
    assert_eq!(DataType::Guid.to_string(), "GUID");
    assert_eq!(DataType::Unknown0D.to_string(), "UNKNOWN_0D");
    assert_eq!(DataType::Invalid(0x42).to_string(), "0x42");
}

#[test]
fn test_fixed_sizes() {
    assert_eq!(DataType::Byte.fixed_size(), Some(1));
    assert_eq!(DataType::Int.fixed_size(), Some(2));
    assert_eq!(DataType::LongInt.fixed_size(), Some(4));
    assert_eq!(DataType::DateTime.fixed_size(), Some(8));
    assert_eq!(DataType::Text.fixed_size(), None);
    assert_eq!(DataType::LongBinary.fixed_size(), None);
}

#[test]
fn test_value_accessors() {
    assert!(Value::Null.is_null());
    assert_eq!(Value::Byte(7).as_integer(), Some(7));
    assert_eq!(Value::Int16(-3).as_integer(), Some(-3));
    assert_eq!(Value::Int32(70_000).as_integer(), Some(70_000));
    assert_eq!(Value::Text("x".into()).as_integer(), None);
    assert_eq!(Value::Text("abc".into()).as_text(), Some("abc"));

    let when = Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap();
    assert_eq!(Value::DateTime(when).as_datetime(), Some(when));
    assert_eq!(Value::DateTime(when).to_string(), "2001-02-03 04:05:06");
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Null.to_string(), "NULL");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Binary(vec![1, 2, 3]).to_string(), "<3 bytes>");
}

#[test]
fn test_row_accessors() {
    let row = Row::new(vec![Value::Int32(1), Value::Null, Value::Text("a".into())]);
    assert_eq!(row.len(), 3);
    assert_eq!(row.null_count(), 1);
    assert_eq!(row.get_value(2), Some(&Value::Text("a".into())));
    assert_eq!(row.get_value(3), None);
    assert!(row.location.is_none());
}

#[test]
fn test_error_classification() {
    let unsupported = DatabaseError::UnsupportedDataType(DataType::Money);
    assert!(unsupported.is_not_implemented());
    assert!(!unsupported.is_format_error());
    assert_eq!(unsupported.to_string(), "Data type Money is not implemented");

    let mismatch = DatabaseError::ColumnCountMismatch { expected: 3, actual: 4 };
    assert!(mismatch.is_format_error());
    assert!(!mismatch.is_not_implemented());

    let io = DatabaseError::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
    assert!(!io.is_format_error());
}
