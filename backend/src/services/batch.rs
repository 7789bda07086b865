//! Batch service: batch CRUD, bulk order creation and profit aggregation
//!
//! `recompute_total_profit` is the single write path for a batch's derived
//! total: it sums gross profit over recognized member orders and persists the
//! result, inside whatever transaction also changed those orders.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_batch_number;

use crate::error::{AppError, AppResult};
use crate::middleware::{require_owner, AuthUser};
use crate::models::OrderStatus;
use crate::services::order::{self, NewOrderData, OrderListItem};

/// Batch service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
}

/// Batch row with creator name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BatchView {
    pub id: Uuid,
    pub batch_number: String,
    pub date: NaiveDate,
    pub total_profit: Decimal,
    pub created_by: Uuid,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a batch
#[derive(Debug, Deserialize)]
pub struct CreateBatchInput {
    pub batch_number: String,
    pub date: Option<NaiveDate>,
}

/// Input for adding orders to a batch in one transaction
#[derive(Debug, Deserialize)]
pub struct AddOrdersInput {
    pub orders: Vec<NewOrderData>,
}

/// Result of adding orders to a batch
#[derive(Debug, Serialize)]
pub struct AddOrdersOutcome {
    pub created_count: usize,
    pub order_ids: Vec<Uuid>,
    pub total_profit: Decimal,
}

/// Result of a profit recalculation
#[derive(Debug, Serialize)]
pub struct RecalculateOutcome {
    pub batch_id: Uuid,
    pub total_profit: Decimal,
}

const BATCH_VIEW_QUERY: &str = r#"
    SELECT b.id, b.batch_number, b.date, b.total_profit, b.created_by,
           u.username AS created_by_name, b.created_at, b.updated_at
    FROM batches b
    JOIN users u ON u.id = b.created_by
"#;

fn recognized_statuses() -> Vec<String> {
    OrderStatus::ALL
        .iter()
        .filter(|s| s.counts_toward_profit())
        .map(|s| s.as_str().to_string())
        .collect()
}

/// Recompute and persist a batch's total profit from its recognized member
/// orders. Idempotent: with no intervening order change the total is
/// unchanged. Returns the new total.
pub(crate) async fn recompute_total_profit(
    conn: &mut PgConnection,
    batch_id: Uuid,
) -> AppResult<Decimal> {
    let total = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(gross_profit), 0)
        FROM orders
        WHERE batch_id = $1 AND status = ANY($2)
        "#,
    )
    .bind(batch_id)
    .bind(recognized_statuses())
    .fetch_one(&mut *conn)
    .await?;

    let updated = sqlx::query("UPDATE batches SET total_profit = $1, updated_at = NOW() WHERE id = $2")
        .bind(total)
        .bind(batch_id)
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("Batch".to_string()));
    }

    Ok(total)
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a batch with a unique batch number
    pub async fn create(&self, actor: &AuthUser, input: CreateBatchInput) -> AppResult<BatchView> {
        validate_batch_number(&input.batch_number).map_err(|e| AppError::Validation {
            field: "batch_number".to_string(),
            message: e.to_string(),
        })?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM batches WHERE batch_number = $1)",
        )
        .bind(&input.batch_number)
        .fetch_one(&self.db)
        .await?;
        if exists {
            return Err(AppError::DuplicateEntry("batch_number".to_string()));
        }

        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let batch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO batches (batch_number, date, total_profit, created_by)
            VALUES ($1, $2, 0, $3)
            RETURNING id
            "#,
        )
        .bind(&input.batch_number)
        .bind(date)
        .bind(actor.user_id)
        .fetch_one(&self.db)
        .await?;

        self.fetch_view(batch_id).await
    }

    /// List batches, newest first. Normal users see only their own.
    pub async fn list(
        &self,
        actor: &AuthUser,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<BatchView>> {
        let created_by = if actor.is_admin() {
            None
        } else {
            Some(actor.user_id)
        };

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM batches b
            WHERE ($1::uuid IS NULL OR b.created_by = $1)
              AND ($2::text IS NULL OR b.batch_number ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(created_by)
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let batches = sqlx::query_as::<_, BatchView>(&format!(
            r#"
            {BATCH_VIEW_QUERY}
            WHERE ($1::uuid IS NULL OR b.created_by = $1)
              AND ($2::text IS NULL OR b.batch_number ILIKE '%' || $2 || '%')
            ORDER BY b.date DESC, b.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(created_by)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: batches,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Get a batch by id
    pub async fn get(&self, actor: &AuthUser, batch_id: Uuid) -> AppResult<BatchView> {
        let batch = self.fetch_view(batch_id).await?;
        require_owner(actor, batch.created_by)?;
        Ok(batch)
    }

    /// List the orders of a batch, newest first
    pub async fn orders(
        &self,
        actor: &AuthUser,
        batch_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<OrderListItem>> {
        let batch = self.fetch_view(batch_id).await?;
        require_owner(actor, batch.created_by)?;

        let total_items =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE batch_id = $1")
                .bind(batch_id)
                .fetch_one(&self.db)
                .await?;

        let orders = sqlx::query_as::<_, OrderListItem>(
            r#"
            SELECT o.id, b.batch_number, c.name AS customer_name, p.name AS product_name,
                   p.specification AS product_specification, o.quantity, o.unit_price,
                   o.sales_amount, o.total_cost, o.gross_profit, o.status, o.order_date,
                   u.username AS created_by_name, o.created_at
            FROM orders o
            JOIN batches b ON b.id = o.batch_id
            JOIN customers c ON c.id = o.customer_id
            JOIN products p ON p.id = o.product_id
            JOIN users u ON u.id = o.created_by
            WHERE o.batch_id = $1
            ORDER BY o.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(batch_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: orders,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Add a set of orders to a batch in a single transaction. The batch
    /// total is recomputed once after all inserts.
    pub async fn add_orders(
        &self,
        actor: &AuthUser,
        batch_id: Uuid,
        input: AddOrdersInput,
    ) -> AppResult<AddOrdersOutcome> {
        if input.orders.is_empty() {
            return Err(AppError::ValidationError(
                "At least one order is required".to_string(),
            ));
        }
        if input.orders.len() > 100 {
            return Err(AppError::ValidationError(
                "At most 100 orders may be added at once".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let batch_owner =
            sqlx::query_scalar::<_, Uuid>("SELECT created_by FROM batches WHERE id = $1")
                .bind(batch_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;
        require_owner(actor, batch_owner)?;

        let mut order_ids = Vec::with_capacity(input.orders.len());
        for data in &input.orders {
            let order = order::insert_order_tx(&mut tx, actor.user_id, batch_id, data).await?;
            order_ids.push(order.id);
        }

        let total_profit = recompute_total_profit(&mut tx, batch_id).await?;
        tx.commit().await?;

        Ok(AddOrdersOutcome {
            created_count: order_ids.len(),
            order_ids,
            total_profit,
        })
    }

    /// Recompute the batch total on demand, returning the new value
    pub async fn recalculate_profit(
        &self,
        actor: &AuthUser,
        batch_id: Uuid,
    ) -> AppResult<RecalculateOutcome> {
        let batch = self.fetch_view(batch_id).await?;
        require_owner(actor, batch.created_by)?;

        let mut tx = self.db.begin().await?;
        let total_profit = recompute_total_profit(&mut tx, batch_id).await?;
        tx.commit().await?;

        Ok(RecalculateOutcome {
            batch_id,
            total_profit,
        })
    }

    async fn fetch_view(&self, batch_id: Uuid) -> AppResult<BatchView> {
        sqlx::query_as::<_, BatchView>(&format!("{BATCH_VIEW_QUERY} WHERE b.id = $1"))
            .bind(batch_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }
}
