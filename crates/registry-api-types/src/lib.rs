//! Wire types for the filtered-list contract shared by the registry and its clients.
//!
//! Field names follow the JSON casing callers already send (`searchString`,
//! `itemsOnPage`, ...). Every request field is optional on the wire; missing
//! values fall back to the same defaults the query engine applies.

use serde::{Deserialize, Serialize};

/// Sort direction as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(alias = "Ascending", alias = "asc")]
    Asc,
    #[serde(alias = "Descending", alias = "desc")]
    Desc,
}

/// Body of a filtered-list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilteredListRequest {
    pub search_string: String,
    pub search_by: String,
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub items_on_page: i64,
    pub page_number: i64,
}

impl Default for FilteredListRequest {
    fn default() -> Self {
        Self {
            search_string: String::new(),
            search_by: String::new(),
            sort_by: String::new(),
            sort_direction: SortDirection::Asc,
            items_on_page: 10,
            page_number: 1,
        }
    }
}

/// Body of a filtered-list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedListResponse<T> {
    pub items: Vec<T>,
    pub page_number: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_fields_default_when_missing() {
        let request: FilteredListRequest =
            serde_json::from_str(r#"{"searchString":"Name"}"#).expect("valid request");

        assert_eq!(request.search_string, "Name");
        assert_eq!(request.search_by, "");
        assert_eq!(request.sort_direction, SortDirection::Asc);
        assert_eq!(request.items_on_page, 10);
        assert_eq!(request.page_number, 1);
    }

    #[test]
    fn sort_direction_accepts_long_names() {
        let request: FilteredListRequest =
            serde_json::from_str(r#"{"sortBy":"name","sortDirection":"Descending"}"#)
                .expect("valid request");
        assert_eq!(request.sort_direction, SortDirection::Desc);

        let encoded = serde_json::to_value(&request).expect("serializable");
        assert_eq!(encoded["sortDirection"], "Desc");
    }

    #[test]
    fn response_uses_camel_case_keys() {
        let response = PaginatedListResponse {
            items: vec![1, 2],
            page_number: 1,
            total_pages: 1,
            total_count: 2,
            has_previous: false,
            has_next: false,
        };

        let encoded = serde_json::to_value(&response).expect("serializable");
        assert_eq!(encoded["totalPages"], 1);
        assert_eq!(encoded["hasPrevious"], false);
        assert_eq!(encoded["items"][1], 2);
    }
}
