//! Database models for the Sales Management Platform
//!
//! Re-exports models from the shared crate; row types specific to a service
//! live next to that service.

pub use shared::models::*;
