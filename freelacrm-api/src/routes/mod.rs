/// API route handlers, one module per resource
///
/// - `health`: store connectivity probe
/// - `auth`: registration, login, token refresh and password reset
/// - `users`: profile of the authenticated user
/// - `clients`, `tasks`, `payments`: owner-scoped resources
///
/// List endpoints share the `page`/`page_size` query and the
/// `{ data, meta }` envelope defined here.

pub mod auth;
pub mod clients;
pub mod extract;
pub mod health;
pub mod payments;
pub mod tasks;
pub mod users;

use freelacrm_shared::store::{Page, PageRequest, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// List envelope
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ListResponse<T> {
    /// Unpaginated list
    pub fn all(data: Vec<T>) -> Self {
        Self { data, meta: None }
    }
}

impl<T> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            meta: Some(PageMeta {
                total: page.total,
                page: page.page,
                page_size: page.page_size,
            }),
        }
    }
}
