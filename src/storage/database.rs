use std::{
    fmt,
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    executor::sequential_scan::SequentialScanner,
    storage::{
        catalog::{CatalogEntry, read_catalog},
        header::validate_source,
        page_store::PageStore,
        table_def::TableDefinition,
    },
    types::{
        PageNumber,
        error::{DatabaseError, Result},
        value::DataType,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub num: u16,
    pub name: String,
    pub data_type: DataType,
}

impl fmt::Display for TableColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Listing view of a table: its name, whether it is a system table and its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub is_system: bool,
    pub columns: Vec<TableColumn>,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.columns.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        write!(f, "({})", names.join(", "))
    }
}

/// A read-only Jet3 database.
pub struct Database<R> {
    store: PageStore<R>,
    catalog: Vec<CatalogEntry>,
}

impl Database<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Database<R> {
    pub fn from_reader(mut reader: R) -> Result<Self> {
        validate_source(&mut reader)?;
        let store = PageStore::new(reader);
        let catalog = read_catalog(&store)?;
        Ok(Self { store, catalog })
    }

    pub fn store(&self) -> &PageStore<R> {
        &self.store
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    fn find_table(&self, name: &str) -> Result<&CatalogEntry> {
        self.catalog
            .iter()
            .find(|entry| entry.is_table() && entry.name == name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Schema page of the named table.
    pub fn table_page(&self, name: &str) -> Result<PageNumber> {
        Ok(self.find_table(name)?.table_page())
    }

    pub fn table_definition(&self, name: &str) -> Result<TableDefinition> {
        let entry = self.find_table(name)?;
        TableDefinition::read(&self.store, &entry.name, entry.table_page())
    }

    /// Every table in the catalog, system tables included.
    pub fn tables(&self) -> Result<Vec<Table>> {
        let mut tables = Vec::new();
        for entry in self.catalog.iter().filter(|e| e.is_table()) {
            let def = TableDefinition::read(&self.store, &entry.name, entry.table_page())?;
            tables.push(Table {
                name: entry.name.clone(),
                is_system: entry.is_system(),
                columns: def
                    .columns
                    .iter()
                    .map(|c| TableColumn {
                        num: c.num,
                        name: c.name.clone(),
                        data_type: c.data_type,
                    })
                    .collect(),
            });
        }
        Ok(tables)
    }

    pub fn user_tables(&self) -> Result<Vec<Table>> {
        Ok(self.tables()?.into_iter().filter(|t| !t.is_system).collect())
    }

    pub fn rows(&self, name: &str) -> Result<SequentialScanner<'_, R>> {
        let def = self.table_definition(name)?;
        Ok(SequentialScanner::new(&self.store, def, None))
    }

    /// Data pages owned by the named table, ascending.
    pub fn table_pages(&self, name: &str) -> Result<Vec<PageNumber>> {
        let def = self.table_definition(name)?;
        def.usage_map()?.pages(&self.store)
    }
}
