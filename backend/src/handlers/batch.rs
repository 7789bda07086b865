//! Batch HTTP handlers

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
use crate::services::batch::{
    AddOrdersInput, AddOrdersOutcome, BatchService, BatchView, CreateBatchInput,
    RecalculateOutcome,
};
use crate::services::order::OrderListItem;
use crate::AppState;

use super::pagination_from;

#[derive(Debug, Deserialize)]
pub struct BatchListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchOrdersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// List batches (normal users see only their own)
pub async fn list_batches(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<BatchListQuery>,
) -> AppResult<Json<PaginatedResponse<BatchView>>> {
    let service = BatchService::new(state.db);
    let batches = service
        .list(
            &current_user.0,
            query.search,
            pagination_from(query.page, query.page_size),
        )
        .await?;
    Ok(Json(batches))
}

/// Create a batch
pub async fn create_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<(StatusCode, Json<BatchView>)> {
    let service = BatchService::new(state.db);
    let batch = service.create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Get a batch
pub async fn get_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchView>> {
    let service = BatchService::new(state.db);
    let batch = service.get(&current_user.0, batch_id).await?;
    Ok(Json(batch))
}

/// List a batch's orders
pub async fn batch_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
    Query(query): Query<BatchOrdersQuery>,
) -> AppResult<Json<PaginatedResponse<OrderListItem>>> {
    let service = BatchService::new(state.db);
    let orders = service
        .orders(
            &current_user.0,
            batch_id,
            pagination_from(query.page, query.page_size),
        )
        .await?;
    Ok(Json(orders))
}

/// Add a set of orders to a batch in one transaction
pub async fn add_batch_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<AddOrdersInput>,
) -> AppResult<(StatusCode, Json<AddOrdersOutcome>)> {
    let service = BatchService::new(state.db);
    let outcome = service.add_orders(&current_user.0, batch_id, input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Recompute a batch's total profit and return the new value
pub async fn recalculate_profit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<RecalculateOutcome>> {
    let service = BatchService::new(state.db);
    let outcome = service.recalculate_profit(&current_user.0, batch_id).await?;
    Ok(Json(outcome))
}
