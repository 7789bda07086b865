//! Inventory ledger service
//!
//! Every stock mutation goes through `apply_locked`: it takes the product row
//! lock, runs the shared arithmetic, persists the new level and appends
//! exactly one audit record. Order transitions reuse it inside their own
//! transactions so a status change and its stock movement commit together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

use crate::error::{AppError, AppResult};
use crate::middleware::{require_admin, AuthUser};
use crate::models::{StockOperation, StockOperationType};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Stock audit record row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockRecordRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub operation_type: String,
    pub quantity: i32,
    pub before_stock: i32,
    pub after_stock: i32,
    pub remark: String,
    pub operated_by: Uuid,
    pub operated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Stock record with joined display names for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockRecordView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub operation_type: String,
    pub quantity: i32,
    pub before_stock: i32,
    pub after_stock: i32,
    pub remark: String,
    pub operated_by_name: String,
    pub operated_at: DateTime<Utc>,
}

/// Input for recording a stock mutation. The operation fields are flattened,
/// so the body shape varies with `operation_type`:
/// `{"product_id": ..., "operation_type": "out", "quantity": 5}` or
/// `{"product_id": ..., "operation_type": "adjust", "after_stock": 120}`.
#[derive(Debug, Deserialize)]
pub struct RecordStockInput {
    pub product_id: Uuid,
    #[serde(flatten)]
    pub operation: StockOperation,
    pub remark: Option<String>,
}

/// Query filters for listing stock records
#[derive(Debug, Default, Deserialize)]
pub struct StockRecordFilter {
    pub product_id: Option<Uuid>,
    pub operation_type: Option<StockOperationType>,
}

/// Apply a stock operation to a product under its row lock and append the
/// audit record. Callers own the enclosing transaction; on error nothing has
/// been written.
pub(crate) async fn apply_locked(
    conn: &mut PgConnection,
    product_id: Uuid,
    operation: StockOperation,
    operated_by: Uuid,
    remark: &str,
) -> AppResult<StockRecordRow> {
    let current_stock = sqlx::query_scalar::<_, i32>(
        "SELECT current_stock FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let applied = operation.apply(current_stock)?;

    sqlx::query("UPDATE products SET current_stock = $1, updated_at = NOW() WHERE id = $2")
        .bind(applied.new_stock)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    let record = sqlx::query_as::<_, StockRecordRow>(
        r#"
        INSERT INTO stock_records (product_id, operation_type, quantity, before_stock, after_stock, remark, operated_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, product_id, operation_type, quantity, before_stock, after_stock, remark,
                  operated_by, operated_at, created_at
        "#,
    )
    .bind(product_id)
    .bind(operation.operation_type().as_str())
    .bind(applied.quantity_delta)
    .bind(current_stock)
    .bind(applied.new_stock)
    .bind(remark)
    .bind(operated_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(record)
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock mutation (admin only). Returns the audit record.
    pub async fn record(
        &self,
        actor: &AuthUser,
        input: RecordStockInput,
    ) -> AppResult<StockRecordRow> {
        require_admin(actor)?;

        let remark = input.remark.unwrap_or_default();

        let mut tx = self.db.begin().await?;
        let record =
            apply_locked(&mut tx, input.product_id, input.operation, actor.user_id, &remark)
                .await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Convenience wrapper for receiving stock into a product (admin only)
    pub async fn stock_in(
        &self,
        actor: &AuthUser,
        product_id: Uuid,
        quantity: i32,
        remark: Option<String>,
    ) -> AppResult<StockRecordRow> {
        self.record(
            actor,
            RecordStockInput {
                product_id,
                operation: StockOperation::In { quantity },
                remark,
            },
        )
        .await
    }

    /// List stock records, newest first
    pub async fn list(
        &self,
        filter: StockRecordFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<StockRecordView>> {
        let operation_type = filter.operation_type.map(|t| t.as_str().to_string());

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_records sr
            WHERE ($1::uuid IS NULL OR sr.product_id = $1)
              AND ($2::text IS NULL OR sr.operation_type = $2)
            "#,
        )
        .bind(filter.product_id)
        .bind(&operation_type)
        .fetch_one(&self.db)
        .await?;

        let records = sqlx::query_as::<_, StockRecordView>(
            r#"
            SELECT sr.id, sr.product_id, p.name AS product_name, sr.operation_type,
                   sr.quantity, sr.before_stock, sr.after_stock, sr.remark,
                   u.username AS operated_by_name, sr.operated_at
            FROM stock_records sr
            JOIN products p ON p.id = sr.product_id
            JOIN users u ON u.id = sr.operated_by
            WHERE ($1::uuid IS NULL OR sr.product_id = $1)
              AND ($2::text IS NULL OR sr.operation_type = $2)
            ORDER BY sr.operated_at DESC, sr.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.product_id)
        .bind(&operation_type)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: records,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }
}
