use thiserror::Error;

use crate::types::{PageNumber, value::DataType};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a Jet3 database")]
    NotJet3,

    #[error("Invalid table definition signature on page {page_number}")]
    InvalidSignature { page_number: PageNumber },

    #[error("Corrupted page: page_number={page_number}, reason={reason}")]
    CorruptedPage {
        page_number: PageNumber,
        reason: String,
    },

    #[error("Invalid page type: 0x{0:02x}")]
    InvalidPageType(u8),

    #[error("Unknown page map type 0x{0:02x}")]
    UnknownPageMapType(u8),

    #[error("Invalid page usage map: page {page_number} has tag 0x{tag:02x}")]
    InvalidUsageMapPage { page_number: PageNumber, tag: u8 },

    #[error("Column count mismatch: table has {expected}, row has {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Malformed row: {reason}")]
    MalformedRow { reason: String },

    #[error("Invalid long data header 0x{0:02x}")]
    InvalidLongValueHeader(u8),

    #[error("Incorrect long data length: expected {expected} bytes, got {actual} bytes")]
    LongValueLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid data type: 0x{0:02x}")]
    InvalidDataType(u8),

    #[error("Invalid system catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("Data type {0} is not implemented")]
    UnsupportedDataType(DataType),

    #[error("Multi page table definition is not implemented (page {page_number})")]
    MultiPageTableDefinition { page_number: PageNumber },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },
}

impl DatabaseError {
    /// Recognized but intentionally unsupported constructs. Callers may skip these.
    pub fn is_not_implemented(&self) -> bool {
        matches!(
            self,
            DatabaseError::UnsupportedDataType(_) | DatabaseError::MultiPageTableDefinition { .. }
        )
    }

    /// Structural violations of the file format.
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            DatabaseError::Io(_)
                | DatabaseError::TableNotFound { .. }
                | DatabaseError::UnsupportedDataType(_)
                | DatabaseError::MultiPageTableDefinition { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
