//! Cursor-based paging over a ranked result list.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Position of a page within a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub offset: usize,
    pub page_size: usize,
    pub total: usize,
}

impl PageCursor {
    /// Cursor at the first page. A zero page size is treated as 1.
    pub fn first(page_size: usize, total: usize) -> Self {
        Self::at(0, page_size, total)
    }

    /// Cursor at `offset`, clamped to the list length.
    pub fn at(offset: usize, page_size: usize, total: usize) -> Self {
        Self {
            offset: offset.min(total),
            page_size: page_size.max(1),
            total,
        }
    }

    /// 1-based number of the current page.
    pub fn page_number(&self) -> usize {
        self.offset / self.page_size + 1
    }

    /// Number of pages; an empty list still has one (empty) page.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.page_size) < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    pub fn next(&self) -> Option<Self> {
        self.has_next().then(|| Self {
            offset: self.offset.saturating_add(self.page_size),
            ..*self
        })
    }

    pub fn previous(&self) -> Option<Self> {
        self.has_previous().then(|| Self {
            offset: self.offset.saturating_sub(self.page_size),
            ..*self
        })
    }

    /// Index range of the items on this page.
    pub fn range(&self) -> Range<usize> {
        let start = self.offset.min(self.total);
        let end = self.offset.saturating_add(self.page_size).min(self.total);
        start..end
    }
}

/// One page of items plus where it sits in the full list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: PageCursor,
    pub page_number: usize,
    pub page_count: usize,
}

/// Slices the page `cursor` points at. The cursor's total is taken from
/// `items`.
pub fn paginate<T: Clone>(items: &[T], cursor: PageCursor) -> Page<T> {
    let cursor = PageCursor::at(cursor.offset, cursor.page_size, items.len());
    Page {
        items: items[cursor.range()].to_vec(),
        cursor,
        page_number: cursor.page_number(),
        page_count: cursor.page_count(),
    }
}
