use std::{
    io::{self, Read, Seek, SeekFrom},
    sync::Mutex,
};

use tracing::trace;

use crate::types::{
    PAGE_SIZE, PageNumber,
    error::{DatabaseError, Result},
    page::{Page, RowPointer},
};

/// Fixed-size page access over a random-access byte source.
///
/// The source sits behind a mutex so that independent scanners can share one
/// store; each read seeks to its own offset while holding the lock.
pub struct PageStore<R> {
    source: Mutex<R>,
}

impl<R: Read + Seek> PageStore<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    fn page_offset(page_number: PageNumber) -> u64 {
        page_number as u64 * PAGE_SIZE as u64
    }

    /// Reads exactly one page. A short read at end of file is an I/O error.
    pub fn read_page(&self, page_number: PageNumber) -> Result<Page> {
        let mut buffer = vec![0u8; PAGE_SIZE];
        {
            let mut source = self
                .source
                .lock()
                .map_err(|_| io::Error::other("page source lock poisoned"))?;
            source.seek(SeekFrom::Start(Self::page_offset(page_number)))?;
            source.read_exact(&mut buffer)?;
        }
        trace!(page_number, "read page");
        Page::from_bytes(page_number, buffer)
    }

    /// Reads the page named by `pointer` and returns its row bytes, or `None`
    /// when the slot has been deleted.
    pub fn resolve_pointer(&self, pointer: RowPointer) -> Result<Option<Vec<u8>>> {
        let page = self.read_page(pointer.page_number())?;
        Ok(page.row(pointer.slot() as usize)?.map(|row| row.to_vec()))
    }

    /// Like [`resolve_pointer`](Self::resolve_pointer) but treats a deleted slot as corruption.
    pub fn resolve_live_pointer(&self, pointer: RowPointer) -> Result<Vec<u8>> {
        self.resolve_pointer(pointer)?
            .ok_or_else(|| DatabaseError::CorruptedPage {
                page_number: pointer.page_number(),
                reason: format!("row pointer {} refers to a deleted slot", pointer),
            })
    }

    pub fn into_inner(self) -> R {
        match self.source.into_inner() {
            Ok(source) => source,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
