//! Order HTTP handlers

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
use crate::models::OrderStatus;
use crate::services::order::{
    parse_target_status, BatchTransitionInput, BatchTransitionOutcome, CreateOrderInput,
    OrderFilter, OrderListItem, OrderResponse, OrderService, TransitionOutcome, UpdateOrderInput,
};
use crate::AppState;

use super::pagination_from;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<OrderStatus>,
    pub batch_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: String,
}

/// List orders (normal users see only their own)
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<PaginatedResponse<OrderListItem>>> {
    let service = OrderService::new(state.db, &state.config);
    let filter = OrderFilter {
        status: query.status,
        batch_id: query.batch_id,
        customer_id: query.customer_id,
        product_id: query.product_id,
    };
    let orders = service
        .list(
            &current_user.0,
            filter,
            pagination_from(query.page, query.page_size),
        )
        .await?;
    Ok(Json(orders))
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let service = OrderService::new(state.db, &state.config);
    let order = service.create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get an order
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let service = OrderService::new(state.db, &state.config);
    let order = service.get(&current_user.0, order_id).await?;
    Ok(Json(order))
}

/// Edit an order's financial and descriptive fields
pub async fn update_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderResponse>> {
    let service = OrderService::new(state.db, &state.config);
    let order = service.update(&current_user.0, order_id, input).await?;
    Ok(Json(order))
}

/// Apply a status transition to an order
pub async fn update_order_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let target = parse_target_status(&input.status)?;
    let service = OrderService::new(state.db, &state.config);
    let outcome = service.transition(&current_user.0, order_id, target).await?;
    Ok(Json(outcome))
}

/// Apply one status to many orders, collecting per-order failures
pub async fn batch_update_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BatchTransitionInput>,
) -> AppResult<Json<BatchTransitionOutcome>> {
    let service = OrderService::new(state.db, &state.config);
    let outcome = service.batch_transition(&current_user.0, input).await?;
    Ok(Json(outcome))
}
