use std::io::{Read, Seek, SeekFrom};

use crate::{
    storage::{JET3_HEADER_SIZE, JET3_MAGIC},
    types::error::{DatabaseError, Result},
};

/// Checks the leading bytes of a file against the Jet3 signature.
///
/// Only the first 20 bytes are inspected; anything shorter is rejected.
pub fn is_valid_jet3(bytes: &[u8]) -> Result<()> {
    match bytes.get(..JET3_HEADER_SIZE) {
        Some(head) if head == JET3_MAGIC => Ok(()),
        _ => Err(DatabaseError::NotJet3),
    }
}

/// Reads the signature from the start of `source` and validates it.
pub fn validate_source<R: Read + Seek>(source: &mut R) -> Result<()> {
    let mut buffer = [0u8; JET3_HEADER_SIZE];
    source.seek(SeekFrom::Start(0))?;
    source.read_exact(&mut buffer)?;
    is_valid_jet3(&buffer)
}
