//! Page-number pagination envelope.

use registry_api_types::PaginatedListResponse;
use serde::Serialize;

use crate::application::query::Paging;

/// One page of results plus paging metadata. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedListModel<T> {
    items: Vec<T>,
    page_number: i64,
    total_pages: i64,
    total_count: i64,
    has_previous: bool,
    has_next: bool,
}

impl<T> PaginatedListModel<T> {
    /// `total_pages = ceil(total_count / items_on_page)`.
    pub fn new(items: Vec<T>, total_count: u64, paging: Paging) -> Self {
        let total_count = i64::try_from(total_count).unwrap_or(i64::MAX);
        let page_number = paging.page_number();
        let total_pages = total_pages(total_count, paging.items_on_page());

        Self {
            items,
            page_number,
            total_pages,
            total_count,
            has_previous: page_number > 1,
            has_next: page_number < total_pages,
        }
    }

    /// Zero rows on the requested page.
    pub fn empty(paging: Paging) -> Self {
        Self::new(Vec::new(), 0, paging)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page_number(&self) -> i64 {
        self.page_number
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }
}

fn total_pages(total_count: i64, items_on_page: i64) -> i64 {
    if total_count <= 0 {
        return 0;
    }
    let items_on_page = items_on_page.max(1);
    total_count / items_on_page + i64::from(total_count % items_on_page != 0)
}

impl<T> From<PaginatedListModel<T>> for PaginatedListResponse<T> {
    fn from(model: PaginatedListModel<T>) -> Self {
        Self {
            items: model.items,
            page_number: model.page_number,
            total_pages: model.total_pages,
            total_count: model.total_count,
            has_previous: model.has_previous,
            has_next: model.has_next,
        }
    }
}
