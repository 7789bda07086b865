//! Route definitions for the Sales Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes())
        // Protected routes - customer management
        .nest("/customers", customer_routes())
        // Protected routes - product and stock management
        .nest("/products", product_routes())
        // Protected routes - batch management
        .nest("/batches", batch_routes())
        // Protected routes - order management
        .nest("/orders", order_routes())
        // Protected routes - stock audit log
        .nest("/stock-records", stock_record_routes())
}

/// Authentication routes: login is public, profile requires a token
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .merge(
            Router::new()
                .route("/profile", get(handlers::profile))
                .route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Customer management routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .route("/:customer_id/orders", get(handlers::customer_orders))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product management routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/low_stock", get(handlers::low_stock_products))
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
        .route(
            "/:product_id/stock_records",
            get(handlers::product_stock_records),
        )
        .route("/:product_id/stock_in", post(handlers::stock_in))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Batch management routes (protected)
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::create_batch))
        .route("/:batch_id", get(handlers::get_batch))
        .route(
            "/:batch_id/orders",
            get(handlers::batch_orders).post(handlers::add_batch_orders),
        )
        .route(
            "/:batch_id/recalculate_profit",
            post(handlers::recalculate_profit),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order management routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/batch_update_status", post(handlers::batch_update_status))
        .route(
            "/:order_id",
            get(handlers::get_order).put(handlers::update_order),
        )
        .route("/:order_id/update_status", post(handlers::update_order_status))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock record routes (protected; records are create + read only)
fn stock_record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_records).post(handlers::create_stock_record),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
