//! Page windowing and page metadata
use crate::compile::Window;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw `page`/`limit` query parameters, kept as text so that malformed values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

/// A normalized page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Zero or negative values are replaced by the defaults; `limit` is capped.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page > 0 { page } else { DEFAULT_PAGE };
        let limit = if limit > 0 {
            limit.min(MAX_LIMIT)
        } else {
            DEFAULT_LIMIT
        };
        Self { page, limit }
    }

    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: i64| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };
        Self::new(parse(page, DEFAULT_PAGE), parse(limit, DEFAULT_LIMIT))
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn window(&self) -> Window {
        Window {
            limit: self.limit,
            offset: (self.page - 1).saturating_mul(self.limit),
        }
    }
}

/// Page metadata computed from a request and the total document count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub total_docs: i64,
    pub limit: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub paging_counter: i64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl PageMeta {
    pub fn new(request: PageRequest, total_docs: i64) -> Self {
        let total_docs = total_docs.max(0);
        let limit = request.limit();
        let current_page = request.page();
        let total_pages = (total_docs + limit - 1) / limit;
        let has_prev_page = current_page > 1;
        let has_next_page = current_page < total_pages;

        Self {
            total_docs,
            limit,
            current_page,
            total_pages,
            paging_counter: (current_page - 1).saturating_mul(limit) + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then_some(current_page - 1),
            next_page: has_next_page.then_some(current_page + 1),
        }
    }
}

/// Output names of the document list and its total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLabels {
    pub docs: &'static str,
    pub total_docs: &'static str,
}

impl PageLabels {
    pub const fn new(docs: &'static str, total_docs: &'static str) -> Self {
        Self { docs, total_docs }
    }
}

impl Default for PageLabels {
    fn default() -> Self {
        Self::new("docs", "totalDocs")
    }
}

/// One page of documents
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub docs: Vec<T>,
    pub meta: PageMeta,
    pub labels: PageLabels,
}

impl<T> Paginated<T> {
    pub fn with_labels(mut self, labels: PageLabels) -> Self {
        self.labels = labels;
        self
    }

    /// True when the underlying set is empty, regardless of the requested page.
    pub fn is_empty_set(&self) -> bool {
        self.meta.total_docs == 0
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Paginated<U>, E> {
        let docs = self.docs.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Paginated {
            docs,
            meta: self.meta,
            labels: self.labels,
        })
    }
}

impl<T: Serialize> Serialize for Paginated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let meta = &self.meta;
        let mut map = serializer.serialize_map(Some(10))?;
        map.serialize_entry(self.labels.docs, &self.docs)?;
        map.serialize_entry(self.labels.total_docs, &meta.total_docs)?;
        map.serialize_entry("limit", &meta.limit)?;
        map.serialize_entry("currentPage", &meta.current_page)?;
        map.serialize_entry("totalPages", &meta.total_pages)?;
        map.serialize_entry("pagingCounter", &meta.paging_counter)?;
        map.serialize_entry("hasPrevPage", &meta.has_prev_page)?;
        map.serialize_entry("hasNextPage", &meta.has_next_page)?;
        map.serialize_entry("prevPage", &meta.prev_page)?;
        map.serialize_entry("nextPage", &meta.next_page)?;
        map.end()
    }
}
