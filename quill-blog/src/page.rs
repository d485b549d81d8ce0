use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Pagination window over `item_count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub item_count: u64,
    pub page_index: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub offset: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    /// An empty collection or an index past the last page yields page 1 with
    /// `offset == limit == 0`.
    pub fn new(item_count: u64, page_index: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let page_count = item_count.div_ceil(page_size);
        let (page_index, offset, limit) = if item_count == 0 || page_index > page_count {
            (1, 0, 0)
        } else {
            let index = page_index.max(1);
            (index, page_size * (index - 1), page_size)
        };
        Self {
            item_count,
            page_index,
            page_size,
            page_count,
            offset,
            limit,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }

    pub fn with_default_size(item_count: u64, page_index: u64) -> Self {
        Self::new(item_count, page_index, DEFAULT_PAGE_SIZE)
    }
}

/// Parses a `?page=` value; anything unusable means page 1.
pub fn page_index(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1)
}
