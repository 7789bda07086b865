//! Stock record HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::StockOperationType;
use crate::services::stock::{
    RecordStockInput, StockRecordFilter, StockRecordRow, StockRecordView, StockService,
};
use crate::AppState;

use super::pagination_from;

#[derive(Debug, Deserialize)]
pub struct StockRecordListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub product_id: Option<Uuid>,
    pub operation_type: Option<StockOperationType>,
}

/// List stock records, newest first
pub async fn list_stock_records(
    State(state): State<AppState>,
    Query(query): Query<StockRecordListQuery>,
) -> AppResult<Json<PaginatedResponse<StockRecordView>>> {
    let service = StockService::new(state.db);
    let records = service
        .list(
            StockRecordFilter {
                product_id: query.product_id,
                operation_type: query.operation_type,
            },
            pagination_from(query.page, query.page_size),
        )
        .await?;
    Ok(Json(records))
}

/// Record a stock mutation (admin only). The body shape varies with
/// `operation_type`: in/out carry `quantity`, adjust carries `after_stock`.
pub async fn create_stock_record(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordStockInput>,
) -> AppResult<(StatusCode, Json<StockRecordRow>)> {
    let service = StockService::new(state.db);
    let record = service.record(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
