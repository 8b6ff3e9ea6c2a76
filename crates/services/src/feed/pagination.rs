//! Offset pagination over a single descending ordering.
//!
//! Forward pages are a plain `LIMIT/OFFSET` slice. Reversed pages (page 1 =
//! oldest items) reuse the same descending scan: the offset is mirrored
//! around the total count, and the fetched slice is reversed in memory.
//!
//! ```text
//! total = 23, page_size = 10, descending scan d[0..23]
//!
//! forward  page 1: d[0..10]            page 3: d[20..23]
//! reversed page 1: rev(d[13..23])      page 3: rev(d[0..3])
//! ```

use domains::{AppError, PageDirection, Result};

/// A validated page request: size and number are both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_size: u32,
    page_number: u32,
    direction: PageDirection,
}

impl PageRequest {
    pub fn new(page_size: u32, page_number: u32, direction: PageDirection) -> Result<Self> {
        if page_size == 0 {
            return Err(AppError::Validation("page size must be at least 1".into()));
        }
        if page_number == 0 {
            return Err(AppError::Validation("page number must be at least 1".into()));
        }
        Ok(Self {
            page_size,
            page_number,
            direction,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }
}

/// The range query to run for one page, and what to do with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Requested size after clamping.
    pub page_size: u64,
    /// `(page_number - 1) * page_size`, counted from the requested end.
    pub raw_offset: u64,
    /// Offset into the descending scan. Never negative by construction.
    pub offset: u64,
    pub limit: u64,
    /// Whether the fetched rows must be reversed before returning them.
    pub reverse: bool,
}

impl PageWindow {
    /// Puts fetched rows into page order. Tolerates receiving fewer (or
    /// more) rows than `limit` when the collection changed between the
    /// count and the fetch.
    pub fn arrange<T>(&self, mut rows: Vec<T>) -> Vec<T> {
        if self.reverse {
            rows.reverse();
        }
        rows
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationPlanner {
    max_page_size: u32,
}

impl PaginationPlanner {
    pub fn new(max_page_size: u32) -> Self {
        Self {
            max_page_size: max_page_size.max(1),
        }
    }

    /// Computes the window for `request` over a filtered set of
    /// `total_count` items.
    ///
    /// Returns `None` when the page starts past the end of the set; that is
    /// an empty page, not an error.
    pub fn plan(&self, request: &PageRequest, total_count: u64) -> Option<PageWindow> {
        let page_size = u64::from(request.page_size.min(self.max_page_size));
        let raw_offset = u64::from(request.page_number - 1) * page_size;

        if raw_offset > total_count {
            return None;
        }

        let window = match request.direction {
            PageDirection::Forward => PageWindow {
                page_size,
                raw_offset,
                offset: raw_offset,
                limit: page_size,
                reverse: false,
            },
            PageDirection::Reversed => {
                let remaining = total_count - raw_offset;
                PageWindow {
                    page_size,
                    raw_offset,
                    // total - raw_offset - page_size, clamped at zero for the
                    // last (partial) reversed page.
                    offset: remaining.saturating_sub(page_size),
                    limit: page_size.min(remaining),
                    reverse: true,
                }
            }
        };
        Some(window)
    }
}
