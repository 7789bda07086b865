//! HTTP handlers for the Sales Management Platform

mod auth;
mod batch;
mod customer;
mod health;
mod order;
mod product;
mod stock;

pub use auth::*;
pub use batch::*;
pub use customer::*;
pub use health::*;
pub use order::*;
pub use product::*;
pub use stock::*;

use shared::types::Pagination;

/// Build pagination from optional query parameters
pub(crate) fn pagination_from(page: Option<u32>, page_size: Option<u32>) -> Pagination {
    let default = Pagination::default();
    Pagination {
        page: page.unwrap_or(default.page),
        page_size: page_size.unwrap_or(default.page_size),
    }
    .normalized()
}
