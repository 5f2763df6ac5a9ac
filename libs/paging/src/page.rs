use serde::{Deserialize, Serialize};

/// A page request as the user sees it: 1-based page number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery<S> {
    pub sort: S,
    pub page: u32,
    pub page_size: u32,
}

impl<S> PageQuery<S> {
    /// Page numbers below 1 are raised to 1.
    pub fn new(sort: S, page: u32, page_size: u32) -> Self {
        Self {
            sort,
            page: page.max(1),
            page_size,
        }
    }

    /// Zero-based index sent to the backend.
    pub fn backend_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

/// One page of results plus the backend's totals.
///
/// Wire shape: `{ "content": [...], "totalElements": n, "totalPages": n }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    #[serde(rename = "content")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total_elements: u64, total_pages: u32) -> Self {
        Self {
            items,
            total_elements,
            total_pages,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map items while preserving totals (wire DTO -> row conversion)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
