//! Pagination: page results, the has-more heuristic and continuation links.
//!
//! Continuation is stateless. The next link is a full re-issuable request URL
//! carrying the original options with `$skip` advanced by the effective page
//! size; no server-side cursor is kept, so clients may replay or skip pages.

use serde_json::Value;

use crate::ODataQuery;

pub type Row = serde_json::Map<String, Value>;

/// Result of one executed page.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub rows: Vec<Row>,
    pub total_count: Option<u64>,
    pub has_more: bool,
}

/// Paging decision derived from an executed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub effective_limit: u64,
    pub skip: u64,
    pub has_more: bool,
}

impl PageInfo {
    /// `$skip` value for the next page.
    #[must_use]
    pub fn next_skip(&self) -> u64 {
        self.skip + self.effective_limit
    }
}

/// Decide whether a next page may exist.
///
/// `has_more` is true iff the executed row count equals the effective limit.
/// When the true result count is an exact multiple of the page size this
/// produces one extra empty-page fetch; that inefficiency is inherent to
/// count-free paging and intentionally preserved.
#[must_use]
pub fn paginate(executed_rows: usize, effective_limit: u64, skip: u64) -> PageInfo {
    PageInfo {
        effective_limit,
        skip,
        has_more: effective_limit > 0 && executed_rows as u64 == effective_limit,
    }
}

/// Build the `@odata.nextLink` URL for a page, or `None` when the page is the
/// last one. `base` is the absolute entity-set URL without a query string.
#[must_use]
pub fn next_link(base: &str, query: &ODataQuery, info: &PageInfo) -> Option<String> {
    if !info.has_more {
        return None;
    }
    let mut continued = query.clone();
    continued.top = Some(info.effective_limit);
    continued.skip = Some(info.next_skip());
    Some(format!("{base}?{}", continued.to_query_string()))
}
