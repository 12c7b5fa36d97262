use std::{
    fmt,
    io::{Read, Seek},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    executor::{scan::Scanner, sequential_scan::SequentialScanner},
    storage::{page_store::PageStore, table_def::TableDefinition},
    types::{
        PageNumber,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

pub const CATALOG_TABLE_NAME: &str = "MSysObjects";
pub const CATALOG_PAGE: PageNumber = 2;
pub const SYSTEM_TABLE_FLAGS: u32 = 0x8000_0002;
pub const OBJECT_KIND_MASK: i64 = 0x7F;
pub const TABLE_PAGE_MASK: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Form,
    Table,
    Macro,
    SystemTable,
    Report,
    Query,
    LinkedTable,
    Module,
    Relationship,
    Unknown09,
    Unknown0A,
    DatabaseProperty,
    Other(u8),
}

impl ObjectKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => ObjectKind::Form,
            0x01 => ObjectKind::Table,
            0x02 => ObjectKind::Macro,
            0x03 => ObjectKind::SystemTable,
            0x04 => ObjectKind::Report,
            0x05 => ObjectKind::Query,
            0x06 => ObjectKind::LinkedTable,
            0x07 => ObjectKind::Module,
            0x08 => ObjectKind::Relationship,
            0x09 => ObjectKind::Unknown09,
            0x0A => ObjectKind::Unknown0A,
            0x0B => ObjectKind::DatabaseProperty,
            other => ObjectKind::Other(other),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Form => "Form",
            ObjectKind::Table => "Table",
            ObjectKind::Macro => "Macro",
            ObjectKind::SystemTable => "SystemTable",
            ObjectKind::Report => "Report",
            ObjectKind::Query => "Query",
            ObjectKind::LinkedTable => "LinkedTable",
            ObjectKind::Module => "Module",
            ObjectKind::Relationship => "Relationship",
            ObjectKind::DatabaseProperty => "DatabaseProperty",
            ObjectKind::Unknown09 => return write!(f, "Unknown(0x09)"),
            ObjectKind::Unknown0A => return write!(f, "Unknown(0x0a)"),
            ObjectKind::Other(code) => return write!(f, "Unknown(0x{:02x})", code),
        };
        f.write_str(name)
    }
}

/// One object described by the system catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i32,
    pub parent_id: i32,
    pub name: String,
    pub kind: ObjectKind,
    pub flags: u32,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    /// Page holding this object's table definition.
    pub fn table_page(&self) -> PageNumber {
        self.id as u32 & TABLE_PAGE_MASK
    }

    pub fn is_system(&self) -> bool {
        self.flags & SYSTEM_TABLE_FLAGS != 0
    }

    pub fn is_table(&self) -> bool {
        self.kind == ObjectKind::Table
    }

    fn from_row(def: &TableDefinition, row: &Row) -> Result<Self> {
        let mut id = None;
        let mut parent_id = None;
        let mut name = None;
        let mut kind = None;
        let mut flags = 0;
        let mut created = None;
        let mut updated = None;

        for (column, value) in def.columns.iter().zip(&row.values) {
            match column.name.as_str() {
                "Id" => id = Some(Self::integer(value, "Id")? as i32),
                "ParentId" => parent_id = Some(Self::integer(value, "ParentId")? as i32),
                "Name" => {
                    let text = value.as_text().ok_or_else(|| Self::invalid("Name"))?;
                    name = Some(text.to_string());
                }
                "Type" => {
                    let code = Self::integer(value, "Type")? & OBJECT_KIND_MASK;
                    kind = Some(ObjectKind::from_code(code as u8));
                }
                "Flags" if !value.is_null() => flags = Self::integer(value, "Flags")? as u32,
                "DateCreate" => created = value.as_datetime(),
                "DateUpdate" => updated = value.as_datetime(),
                _ => {}
            }
        }

        Ok(Self {
            id: id.ok_or_else(|| Self::invalid("Id"))?,
            parent_id: parent_id.ok_or_else(|| Self::invalid("ParentId"))?,
            name: name.ok_or_else(|| Self::invalid("Name"))?,
            kind: kind.ok_or_else(|| Self::invalid("Type"))?,
            flags,
            created,
            updated,
        })
    }

    fn integer(value: &Value, column: &str) -> Result<i64> {
        value.as_integer().ok_or_else(|| Self::invalid(column))
    }

    fn invalid(column: &str) -> DatabaseError {
        DatabaseError::InvalidCatalog {
            reason: format!("missing or mistyped column {}", column),
        }
    }
}

/// Reads every entry of the system catalog.
pub fn read_catalog<R: Read + Seek>(store: &PageStore<R>) -> Result<Vec<CatalogEntry>> {
    let def = TableDefinition::read(store, CATALOG_TABLE_NAME, CATALOG_PAGE)?;
    let mut scanner = SequentialScanner::new(store, def, None);
    let mut entries = Vec::new();
    while let Some(row) = scanner.scan()? {
        entries.push(CatalogEntry::from_row(scanner.definition(), &row)?);
    }
    debug!(entries = entries.len(), "loaded system catalog");
    Ok(entries)
}
