//! Shared pagination types for list and search endpoints.
//!
//! All endpoints use page-based offset pagination with `page_number` and `page_size`. The page
//! of items is returned as the JSON body and the metadata travels in the `Pagination` response
//! header.

use axum::{
    Json,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::errors::Error;

/// Page returned when none is requested.
pub const DEFAULT_PAGE_NUMBER: i64 = 1;

/// Default number of items to return per page.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_PAGE_SIZE: i64 = 100_000;

/// Response header carrying [`PaginationHeader`] as JSON.
pub static PAGINATION_HEADER: HeaderName = HeaderName::from_static("pagination");

/// Standard pagination parameters for list and search endpoints.
///
/// Accepted from query strings (`?page_number=2&page_size=50`) and flattened into JSON search
/// bodies, where the values may be numbers or numeric strings.
///
/// The page size is clamped into `1..=MAX_PAGE_SIZE` rather than rejected, and the page number
/// is never below 1.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde(default, alias = "pageNumber")]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub page_number: Option<i64>,

    /// Items per page (default: 10, max: 100000)
    #[param(default = 10, minimum = 1, maximum = 100000)]
    #[serde(default, alias = "pageSize")]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number: Some(page_number),
            page_size: Some(page_size),
        }
    }

    /// Get the page number, defaulting to 1 and never below it.
    #[inline]
    pub fn page_number(&self) -> i64 {
        self.page_number.unwrap_or(DEFAULT_PAGE_NUMBER).max(1)
    }

    /// Get the page size, clamped between 1 and MAX_PAGE_SIZE.
    /// Defaults to DEFAULT_PAGE_SIZE if not specified.
    #[inline]
    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of rows to skip before the requested page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page_number() - 1).saturating_mul(self.page_size())
    }
}

/// One page of results plus the metadata needed to navigate the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl<T> PagedList<T> {
    pub fn new(items: Vec<T>, total_count: i64, pagination: &PaginationParams) -> Self {
        let page_size = pagination.page_size();
        let total_count = total_count.max(0);
        Self {
            items,
            current_page: pagination.page_number(),
            page_size,
            total_count,
            total_pages: (total_count + page_size - 1) / page_size,
        }
    }

    /// Number of items on this page.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedList<U> {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }

    pub fn header(&self) -> PaginationHeader {
        PaginationHeader {
            current_page: self.current_page,
            items_per_page: self.page_size,
            item_count: self.item_count() as i64,
            total_items: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

/// Metadata serialized into the `Pagination` response header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationHeader {
    pub current_page: i64,
    pub items_per_page: i64,
    pub item_count: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T: Serialize> IntoResponse for PagedList<T> {
    fn into_response(self) -> Response {
        let header = serde_json::to_string(&self.header())
            .ok()
            .and_then(|value| HeaderValue::from_str(&value).ok());

        match header {
            Some(value) => ([(PAGINATION_HEADER.clone(), value)], Json(self.items)).into_response(),
            None => Error::Internal {
                operation: "encode pagination header".to_string(),
            }
            .into_response(),
        }
    }
}
