//! Customer HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::services::customer::{
    CreateCustomerInput, CustomerRow, CustomerService, UpdateCustomerInput,
};
use crate::services::order::OrderListItem;
use crate::AppState;

use super::pagination_from;

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// List customers
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> AppResult<Json<PaginatedResponse<CustomerRow>>> {
    let service = CustomerService::new(state.db);
    let customers = service
        .list(query.search, pagination_from(query.page, query.page_size))
        .await?;
    Ok(Json(customers))
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<CustomerRow>)> {
    let service = CustomerService::new(state.db);
    let customer = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Get a customer
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerRow>> {
    let service = CustomerService::new(state.db);
    let customer = service.get(customer_id).await?;
    Ok(Json(customer))
}

/// Update a customer
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<CustomerRow>> {
    let service = CustomerService::new(state.db);
    let customer = service.update(customer_id, input).await?;
    Ok(Json(customer))
}

/// Delete a customer without orders
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CustomerService::new(state.db);
    service.delete(customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a customer's orders
pub async fn customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<OrderListItem>>> {
    let service = CustomerService::new(state.db);
    let orders = service
        .orders(customer_id, pagination_from(query.page, query.page_size))
        .await?;
    Ok(Json(orders))
}
