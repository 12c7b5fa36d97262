use std::io::Cursor;

use jet3::{
    storage::{
        JET3_MAGIC,
        header::{is_valid_jet3, validate_source},
    },
    types::error::DatabaseError,
    utils::mock::header_page,
};

#[test]
fn test_exact_magic_is_valid() {
    assert!(is_valid_jet3(JET3_MAGIC).is_ok());
    assert!(is_valid_jet3(&header_page()).is_ok());
}

#[test]
fn test_any_flipped_byte_is_rejected() {
    for index in 0..JET3_MAGIC.len() {
        let mut bytes = *JET3_MAGIC;
        bytes[index] ^= 0x01;
        assert!(
            matches!(is_valid_jet3(&bytes), Err(DatabaseError::NotJet3)),
            "byte {} flipped",
            index
        );
    }
}

#[test]
fn test_short_input_is_rejected() {
    assert!(matches!(
        is_valid_jet3(&JET3_MAGIC[..10]),
        Err(DatabaseError::NotJet3)
    ));
}

#[test]
fn test_jet4_signature_is_rejected() {
    let mut bytes = JET3_MAGIC.to_vec();
    bytes[4..19].copy_from_slice(b"Standard ACE DB");
    assert!(matches!(is_valid_jet3(&bytes), Err(DatabaseError::NotJet3)));
}

#[test]
fn test_validate_source_reads_from_start() {
    let mut cursor = Cursor::new(header_page());
    cursor.set_position(500);
    assert!(validate_source(&mut cursor).is_ok());
}

#[test]
fn test_validate_source_propagates_short_read() {
    let mut cursor = Cursor::new(vec![0u8, 1, 0]);
    assert!(matches!(
        validate_source(&mut cursor),
        Err(DatabaseError::Io(_))
    ));
}
