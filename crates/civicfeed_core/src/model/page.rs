//! Page request and response envelopes.
//!
//! # Invariants
//! - `limit` is always greater than zero.
//! - `raw_count` reflects what the server returned, before any filtering.

use crate::model::list_item::ListItem;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default page size used when configuration does not override it.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequestError {
    ZeroLimit,
}

impl Display for PageRequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroLimit => write!(f, "page limit must be greater than zero"),
        }
    }
}

impl Error for PageRequestError {}

/// One offset-addressed window into a paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Result<Self, PageRequestError> {
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self { offset, limit })
    }

    /// Returns the request for the window right after this one.
    ///
    /// `None` when the next offset does not fit in `u32`.
    pub fn next(self) -> Option<Self> {
        let offset = self.offset.checked_add(self.limit)?;
        Some(Self {
            offset,
            limit: self.limit,
        })
    }
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<ListItem>,
    /// Number of records the server returned, including any that were
    /// dropped while decoding.
    pub raw_count: usize,
}

impl Page {
    /// Builds a page whose raw count equals its item count.
    pub fn from_items(items: Vec<ListItem>) -> Self {
        let raw_count = items.len();
        Self { items, raw_count }
    }

    /// A page shorter than the requested limit ends the collection.
    pub fn is_full(&self, limit: u32) -> bool {
        self.raw_count >= limit as usize
    }
}
