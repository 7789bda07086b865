//! Business logic services for the Sales Management Platform

pub mod auth;
pub mod batch;
pub mod customer;
pub mod order;
pub mod product;
pub mod stock;

pub use auth::AuthService;
pub use batch::BatchService;
pub use customer::CustomerService;
pub use order::OrderService;
pub use product::ProductService;
pub use stock::StockService;
