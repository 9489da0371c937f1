//! Resolution of the post listing query parameters.
//!
//! `GET /volunteers-posts` serves three different listings from one path. The raw
//! parameters are resolved once into a [`PostListing`] with the precedence
//! search > home highlight > paginated listing.

use serde::Deserialize;

/// Raw query parameters of the post listing endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// Category sort direction of the paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `"asd"` sorts ascending, any other value descending.
    pub fn from_param(value: &str) -> Self {
        if value == "asd" {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// One page of the unfiltered post collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Page size; `None` means no limit
    pub size: Option<u64>,
    pub sort: Option<SortDirection>,
}

impl PageRequest {
    /// Number of documents to skip.
    pub fn offset(&self) -> u64 {
        match self.size {
            Some(size) => self.page.saturating_sub(1).saturating_mul(size),
            None => 0,
        }
    }
}

/// The listing a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostListing {
    /// Case-insensitive substring match on the post title
    Search { title: String },
    /// Soonest deadlines first, capped
    Highlights { limit: i64 },
    /// Offset/limit page of all posts
    Page(PageRequest),
}

impl ListingQuery {
    /// Resolve the parameters into a listing. `home_limit` caps the highlight listing.
    pub fn resolve(self, home_limit: i64) -> PostListing {
        if let Some(title) = self.query.filter(|q| !q.is_empty()) {
            return PostListing::Search { title };
        }

        if self.condition.as_deref() == Some("home") {
            return PostListing::Highlights { limit: home_limit };
        }

        PostListing::Page(PageRequest {
            page: self.current_page.unwrap_or(1).max(1),
            size: self.size.filter(|&s| s > 0),
            sort: self.sort.as_deref().map(SortDirection::from_param),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_takes_precedence() {
        let query = ListingQuery {
            condition: Some("home".to_string()),
            query: Some("beach".to_string()),
            current_page: Some(3),
            size: Some(5),
            sort: Some("asd".to_string()),
        };
        assert_eq!(
            query.resolve(6),
            PostListing::Search {
                title: "beach".to_string()
            }
        );
    }

    #[test]
    fn test_empty_query_falls_through() {
        let query = ListingQuery {
            condition: Some("home".to_string()),
            query: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(query.resolve(8), PostListing::Highlights { limit: 8 });
    }

    #[test]
    fn test_other_condition_is_paginated() {
        let query = ListingQuery {
            condition: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.resolve(6),
            PostListing::Page(PageRequest {
                page: 1,
                size: None,
                sort: None
            })
        );
    }

    #[test]
    fn test_page_offset() {
        let query = ListingQuery {
            current_page: Some(2),
            size: Some(5),
            sort: Some("dsc".to_string()),
            ..Default::default()
        };
        let PostListing::Page(page) = query.resolve(6) else {
            panic!("expected a page listing");
        };
        assert_eq!(page.offset(), 5);
        assert_eq!(page.size, Some(5));
        assert_eq!(page.sort, Some(SortDirection::Descending));
    }

    #[test]
    fn test_page_zero_and_size_zero() {
        let query = ListingQuery {
            current_page: Some(0),
            size: Some(0),
            ..Default::default()
        };
        let PostListing::Page(page) = query.resolve(6) else {
            panic!("expected a page listing");
        };
        assert_eq!(page.page, 1);
        assert_eq!(page.size, None);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_sort_direction_param() {
        assert_eq!(SortDirection::from_param("asd"), SortDirection::Ascending);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::from_param(""), SortDirection::Descending);
    }
}
