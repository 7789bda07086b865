//! Product HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{
    CreateProductInput, ProductResponse, ProductService, UpdateProductInput,
};
use crate::services::stock::{StockRecordFilter, StockRecordRow, StockRecordView, StockService};
use crate::AppState;

use super::pagination_from;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StockInInput {
    pub quantity: i32,
    pub remark: Option<String>,
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<PaginatedResponse<ProductResponse>>> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let products = service
        .list(query.search, pagination_from(query.page, query.page_size))
        .await?;
    Ok(Json(products))
}

/// Create a product (admin only)
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let product = service.create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let product = service.get(product_id).await?;
    Ok(Json(product))
}

/// Update a product (admin only)
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let product = service.update(&current_user.0, product_id, input).await?;
    Ok(Json(product))
}

/// List products at or below a stock threshold
pub async fn low_stock_products(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<PaginatedResponse<ProductResponse>>> {
    let service = ProductService::new(state.db.clone(), &state.config);
    let products = service
        .low_stock(query.threshold, pagination_from(query.page, query.page_size))
        .await?;
    Ok(Json(products))
}

/// List a product's stock records
pub async fn product_stock_records(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<PaginatedResponse<StockRecordView>>> {
    // Ensure the product exists so a bad id is a 404, not an empty list
    ProductService::new(state.db.clone(), &state.config)
        .get(product_id)
        .await?;

    let service = StockService::new(state.db);
    let records = service
        .list(
            StockRecordFilter {
                product_id: Some(product_id),
                operation_type: None,
            },
            pagination_from(query.page, query.page_size),
        )
        .await?;
    Ok(Json(records))
}

/// Receive stock into a product (admin only)
pub async fn stock_in(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<StockInInput>,
) -> AppResult<Json<StockRecordRow>> {
    let record = StockService::new(state.db)
        .stock_in(&current_user.0, product_id, input.quantity, input.remark)
        .await?;
    Ok(Json(record))
}
