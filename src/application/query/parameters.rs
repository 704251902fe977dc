//! Request-side description of a filtered, sorted, paged read.

use registry_api_types::{FilteredListRequest, SortDirection as WireSortDirection};

pub const DEFAULT_ITEMS_ON_PAGE: i64 = 10;
pub const DEFAULT_PAGE_NUMBER: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// What a caller asked for. Values are taken as sent; normalisation happens in
/// [`QueryParameters::paging`] when the query engine consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pub search_string: String,
    pub search_by: String,
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub items_on_page: i64,
    pub page_number: i64,
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            search_string: String::new(),
            search_by: String::new(),
            sort_by: String::new(),
            sort_direction: SortDirection::Ascending,
            items_on_page: DEFAULT_ITEMS_ON_PAGE,
            page_number: DEFAULT_PAGE_NUMBER,
        }
    }
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_string = term.into();
        self
    }

    pub fn search_by(mut self, field: impl Into<String>) -> Self {
        self.search_by = field.into();
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = field.into();
        self.sort_direction = direction;
        self
    }

    pub fn page(mut self, page_number: i64, items_on_page: i64) -> Self {
        self.page_number = page_number;
        self.items_on_page = items_on_page;
        self
    }

    /// Paging with non-positive values replaced by the defaults.
    pub fn paging(&self) -> Paging {
        Paging::normalized(self.page_number, self.items_on_page)
    }
}

/// Normalised paging window. Both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    page_number: i64,
    items_on_page: i64,
}

impl Paging {
    pub fn normalized(page_number: i64, items_on_page: i64) -> Self {
        Self {
            page_number: if page_number > 0 {
                page_number
            } else {
                DEFAULT_PAGE_NUMBER
            },
            items_on_page: if items_on_page > 0 {
                items_on_page
            } else {
                DEFAULT_ITEMS_ON_PAGE
            },
        }
    }

    pub fn page_number(&self) -> i64 {
        self.page_number
    }

    pub fn items_on_page(&self) -> i64 {
        self.items_on_page
    }

    /// Rows before this page: `(page_number - 1) * items_on_page`, saturating.
    pub fn skip(&self) -> i64 {
        (self.page_number - 1).saturating_mul(self.items_on_page)
    }

    pub fn take(&self) -> i64 {
        self.items_on_page
    }
}

impl From<WireSortDirection> for SortDirection {
    fn from(direction: WireSortDirection) -> Self {
        match direction {
            WireSortDirection::Asc => SortDirection::Ascending,
            WireSortDirection::Desc => SortDirection::Descending,
        }
    }
}

impl From<SortDirection> for WireSortDirection {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => WireSortDirection::Asc,
            SortDirection::Descending => WireSortDirection::Desc,
        }
    }
}

impl From<FilteredListRequest> for QueryParameters {
    fn from(request: FilteredListRequest) -> Self {
        Self {
            search_string: request.search_string,
            search_by: request.search_by,
            sort_by: request.sort_by,
            sort_direction: request.sort_direction.into(),
            items_on_page: request.items_on_page,
            page_number: request.page_number,
        }
    }
}

impl From<QueryParameters> for FilteredListRequest {
    fn from(parameters: QueryParameters) -> Self {
        Self {
            search_string: parameters.search_string,
            search_by: parameters.search_by,
            sort_by: parameters.sort_by,
            sort_direction: parameters.sort_direction.into(),
            items_on_page: parameters.items_on_page,
            page_number: parameters.page_number,
        }
    }
}
