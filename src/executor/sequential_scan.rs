use std::io::{Read, Seek};

use tracing::{debug, warn};

use crate::{
    executor::{row_decoder::decode_row, scan::Scanner},
    storage::{page_store::PageStore, table_def::TableDefinition},
    types::{
        PageNumber,
        error::DatabaseError,
        page::{Page, PageType, RowPointer},
        row::Row,
    },
};

enum ScanState {
    Fresh,
    Positioned { page: Page, slot: usize },
    Exhausted,
}

/// Walks a table's data pages in usage-map order, yielding live rows.
///
/// Not safe for concurrent `scan` calls; the page store underneath may be
/// shared with other scanners.
pub struct SequentialScanner<'a, R> {
    store: &'a PageStore<R>,
    definition: TableDefinition,
    state: ScanState,
    batch_size: usize,
}

impl<'a, R: Read + Seek> SequentialScanner<'a, R> {
    pub fn new(
        store: &'a PageStore<R>,
        definition: TableDefinition,
        batch_size: Option<usize>,
    ) -> Self {
        Self {
            store,
            definition,
            state: ScanState::Fresh,
            batch_size: batch_size.unwrap_or(32),
        }
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ScanState::Exhausted)
    }

    /// Page number of the page currently loaded, if any.
    pub fn current_page(&self) -> Option<PageNumber> {
        match &self.state {
            ScanState::Positioned { page, .. } => Some(page.page_number),
            _ => None,
        }
    }

    fn load_next_page(&mut self, prev: PageNumber) -> Result<(), DatabaseError> {
        let usage_map = self.definition.usage_map()?;
        match usage_map.next_page(self.store, prev)? {
            Some(page_number) => {
                let page = self.store.read_page(page_number)?;
                if page.tag() != PageType::Data.as_u8() {
                    warn!(
                        table = %self.definition.name,
                        page_number,
                        tag = page.tag(),
                        "usage map points at a non-data page"
                    );
                    return Err(DatabaseError::CorruptedPage {
                        page_number,
                        reason: format!("expected a data page, found tag 0x{:02x}", page.tag()),
                    });
                }
                debug!(
                    table = %self.definition.name,
                    page_number,
                    rows = page.row_count(),
                    "loaded data page"
                );
                self.state = ScanState::Positioned { page, slot: 0 };
            }
            None => {
                debug!(table = %self.definition.name, "table exhausted");
                self.state = ScanState::Exhausted;
            }
        }
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, DatabaseError> {
        loop {
            match self.state {
                ScanState::Exhausted => return Ok(None),
                ScanState::Fresh => {
                    if self.definition.num_rows == 0 {
                        self.state = ScanState::Exhausted;
                        return Ok(None);
                    }
                    self.load_next_page(0)?;
                    continue;
                }
                ScanState::Positioned { .. } => {}
            }
            let ScanState::Positioned { page, slot } = &mut self.state else {
                continue;
            };

            if *slot >= page.row_count() as usize {
                let prev = page.page_number;
                self.load_next_page(prev)?;
                continue;
            }

            let current = *slot;
            *slot += 1;
            let located = page.locate_row(current)?;
            if located.deleted {
                continue;
            }

            let slot_index = u8::try_from(current).map_err(|_| DatabaseError::CorruptedPage {
                page_number: page.page_number,
                reason: format!("slot {} cannot be addressed by a row pointer", current),
            })?;
            let values = decode_row(
                self.store,
                &self.definition,
                &page.data()[located.start..located.end],
            )?;
            let location = RowPointer::new(page.page_number, slot_index);
            return Ok(Some(Row::with_location(location, values)));
        }
    }
}

impl<R: Read + Seek> Scanner for SequentialScanner<'_, R> {
    /// A failed scan leaves the scanner exhausted.
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        let result = self.next_row();
        if result.is_err() {
            self.state = ScanState::Exhausted;
        }
        result
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.state = ScanState::Fresh;
        Ok(())
    }
}
