//! Usage maps record which pages belong to a table.
//!
//! Two encodings exist, selected by the first byte of the descriptor:
//!
//! ```text
//! type 0 (inline):  [0x00][base page u32][bitmap ...]
//!                   bit i set => page base + i
//! type 1 (paged):   [0x01][map page u32][map page u32] ...
//!                   each map page: [0x05][3 bytes][bitmap of (2048-4)*8 bits]
//!                   bit i on map page k => page k * (2048-4)*8 + i
//! ```

use std::io::{Read, Seek};

use tracing::{debug, warn};

use crate::{
    storage::page_store::PageStore,
    types::{
        PAGE_SIZE, PageNumber,
        error::{DatabaseError, Result},
        page::PageType,
        read_u32,
    },
};

pub const MAP_TYPE_INLINE: u8 = 0x00;
pub const MAP_TYPE_PAGED: u8 = 0x01;

const INLINE_HEADER_SIZE: usize = 5;
const MAP_PAGE_BITMAP_OFFSET: usize = 4;
pub const BITS_PER_MAP_PAGE: usize = (PAGE_SIZE - MAP_PAGE_BITMAP_OFFSET) * 8;

#[derive(Debug, Clone, PartialEq)]
pub enum UsageMap<'a> {
    Inline { base: PageNumber, bitmap: &'a [u8] },
    Paged { map_pages: Vec<PageNumber> },
}

fn bit_is_set(bitmap: &[u8], index: usize) -> bool {
    bitmap[index / 8] & (1 << (index % 8)) != 0
}

fn first_set_bit(bitmap: &[u8], from: usize) -> Option<usize> {
    (from..bitmap.len() * 8).find(|&i| bit_is_set(bitmap, i))
}

impl<'a> UsageMap<'a> {
    pub fn parse(descriptor: &'a [u8]) -> Result<Self> {
        let Some(&map_type) = descriptor.first() else {
            return Err(DatabaseError::MalformedRow {
                reason: "empty usage map descriptor".to_string(),
            });
        };
        match map_type {
            MAP_TYPE_INLINE => {
                let base = read_u32(descriptor, 1)?;
                Ok(UsageMap::Inline {
                    base,
                    bitmap: &descriptor[INLINE_HEADER_SIZE..],
                })
            }
            MAP_TYPE_PAGED => {
                let map_pages = descriptor[1..]
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok(UsageMap::Paged { map_pages })
            }
            other => Err(DatabaseError::UnknownPageMapType(other)),
        }
    }

    /// Returns the first page strictly after `prev` that belongs to the map.
    /// Pass 0 to start from the beginning.
    pub fn next_page<R: Read + Seek>(
        &self,
        store: &PageStore<R>,
        prev: PageNumber,
    ) -> Result<Option<PageNumber>> {
        match self {
            UsageMap::Inline { base, bitmap } => {
                let from = if prev >= *base {
                    (prev - base) as usize + 1
                } else {
                    0
                };
                let Some(bit) = first_set_bit(bitmap, from) else {
                    return Ok(None);
                };
                base.checked_add(bit as PageNumber).map(Some).ok_or_else(|| {
                    DatabaseError::MalformedRow {
                        reason: format!("usage map bit {} past base page {} overflows", bit, base),
                    }
                })
            }
            UsageMap::Paged { map_pages } => {
                let target = prev as usize + 1;
                let first_map = target / BITS_PER_MAP_PAGE;
                let mut offset = target % BITS_PER_MAP_PAGE;

                for (index, &map_page) in map_pages.iter().enumerate().skip(first_map) {
                    if map_page == 0 {
                        offset = 0;
                        continue;
                    }
                    let page = store.read_page(map_page)?;
                    if page.tag() != PageType::PageUsage.as_u8() {
                        warn!(
                            map_page,
                            tag = page.tag(),
                            "usage map references a non usage-map page"
                        );
                        return Err(DatabaseError::InvalidUsageMapPage {
                            page_number: map_page,
                            tag: page.tag(),
                        });
                    }
                    debug!(map_page, index, offset, "scanning usage map page");
                    let bitmap = &page.data()[MAP_PAGE_BITMAP_OFFSET..];
                    if let Some(bit) = first_set_bit(bitmap, offset) {
                        return Ok(Some((index * BITS_PER_MAP_PAGE + bit) as PageNumber));
                    }
                    offset = 0;
                }
                Ok(None)
            }
        }
    }

    /// Every page in the map, ascending.
    pub fn pages<R: Read + Seek>(&self, store: &PageStore<R>) -> Result<Vec<PageNumber>> {
        let mut pages = Vec::new();
        let mut prev = 0;
        while let Some(next) = self.next_page(store, prev)? {
            pages.push(next);
            prev = next;
        }
        Ok(pages)
    }
}
