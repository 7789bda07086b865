//! Order service: creation, edits and the status state machine
//!
//! Status transitions, their stock side effects and the batch profit
//! recompute happen inside one database transaction. The order row is locked
//! first, then the product row (inside the ledger), then the batch row is
//! updated last; keeping that order consistent across code paths avoids
//! deadlocks between concurrent transitions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_cost, validate_quantity, validate_unit_price};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::{require_owner, AuthUser};
use crate::models::{
    plan_stock_effect, OrderFinancials, OrderStatus, StockEffect, StockOperation,
    TransitionPolicy,
};
use crate::services::{batch, stock};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    policy: TransitionPolicy,
}

/// Order row as stored
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub sales_amount: Decimal,
    pub other_costs: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub status: String,
    pub stock_deducted: bool,
    pub order_date: NaiveDate,
    pub remark: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, batch_id, customer_id, product_id, quantity, unit_price, \
     sales_amount, other_costs, total_cost, gross_profit, status, stock_deducted, order_date, \
     remark, created_by, created_at, updated_at";

/// Order representation returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub sales_amount: Decimal,
    pub other_costs: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub status: OrderStatus,
    pub status_label: String,
    pub order_date: NaiveDate,
    pub remark: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order list item with joined display names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderListItem {
    pub id: Uuid,
    pub batch_number: String,
    pub customer_name: String,
    pub product_name: String,
    pub product_specification: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub sales_amount: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub status: String,
    pub order_date: NaiveDate,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields of a new order, excluding the batch it belongs to
#[derive(Debug, Deserialize)]
pub struct NewOrderData {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub other_costs: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub remark: Option<String>,
    pub order_date: Option<NaiveDate>,
}

/// Input for creating a single order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub batch_id: Uuid,
    #[serde(flatten)]
    pub order: NewOrderData,
}

/// Input for editing an order's financial and descriptive fields.
/// Status changes go through `transition`, which owns stock movement.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub other_costs: Option<Decimal>,
    pub remark: Option<String>,
    pub order_date: Option<NaiveDate>,
}

/// Query filters for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub batch_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

/// Result of a status transition
#[derive(Debug, Serialize)]
pub struct TransitionOutcome {
    pub order: OrderResponse,
    pub previous_status: OrderStatus,
    pub previous_status_label: String,
    pub new_status: OrderStatus,
    pub new_status_label: String,
}

/// Input for the batch status update endpoint. The status arrives as a raw
/// string so unrecognized values surface as an invalid-transition error.
#[derive(Debug, Deserialize)]
pub struct BatchTransitionInput {
    pub order_ids: Vec<Uuid>,
    pub status: String,
}

/// Per-order failure within a batch status update
#[derive(Debug, Serialize)]
pub struct TransitionFailure {
    pub order_id: Uuid,
    pub error: String,
}

/// Result of a batch status update
#[derive(Debug, Serialize)]
pub struct BatchTransitionOutcome {
    pub updated_count: usize,
    pub failures: Vec<TransitionFailure>,
}

fn parse_status(s: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_str(s)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unrecognized order status: {s}")))
}

/// Parse a client-supplied target status; unrecognized values are invalid
/// transitions, not server errors.
pub fn parse_target_status(s: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_str(s)
        .ok_or_else(|| AppError::InvalidTransition(format!("unrecognized status value: {s}")))
}

impl OrderRow {
    fn into_response(self) -> AppResult<OrderResponse> {
        let status = parse_status(&self.status)?;
        Ok(OrderResponse {
            id: self.id,
            batch_id: self.batch_id,
            customer_id: self.customer_id,
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            sales_amount: self.sales_amount,
            other_costs: self.other_costs,
            total_cost: self.total_cost,
            gross_profit: self.gross_profit,
            status,
            status_label: status.label().to_string(),
            order_date: self.order_date,
            remark: self.remark,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Recompute a product's derived sold quantity from the orders currently
/// holding a stock deduction.
pub(crate) async fn refresh_sold_quantity(
    conn: &mut PgConnection,
    product_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE products
        SET sold_quantity = (
            SELECT COALESCE(SUM(quantity), 0)
            FROM orders
            WHERE product_id = $1 AND stock_deducted
        ),
        updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a new order into an existing batch inside the caller's transaction.
/// Performs the initial stock deduction when the order is created directly in
/// a stock-consuming status. Does not recompute the batch total; the caller
/// does that once before committing.
pub(crate) async fn insert_order_tx(
    conn: &mut PgConnection,
    actor_id: Uuid,
    batch_id: Uuid,
    data: &NewOrderData,
) -> AppResult<OrderRow> {
    validate_quantity(data.quantity).map_err(|e| AppError::Validation {
        field: "quantity".to_string(),
        message: e.to_string(),
    })?;
    validate_unit_price(data.unit_price).map_err(|e| AppError::Validation {
        field: "unit_price".to_string(),
        message: e.to_string(),
    })?;
    let other_costs = data.other_costs.unwrap_or(Decimal::ZERO);
    validate_cost(other_costs).map_err(|e| AppError::Validation {
        field: "other_costs".to_string(),
        message: e.to_string(),
    })?;

    let customer_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(data.customer_id)
            .fetch_one(&mut *conn)
            .await?;
    if !customer_exists {
        return Err(AppError::NotFound("Customer".to_string()));
    }

    let cost_price = sqlx::query_scalar::<_, Decimal>(
        "SELECT cost_price FROM products WHERE id = $1",
    )
    .bind(data.product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let status = data.status.unwrap_or(OrderStatus::Pending);
    let consume = status.is_stock_consuming();
    let financials =
        OrderFinancials::compute(data.quantity, data.unit_price, cost_price, other_costs);
    let order_date = data.order_date.unwrap_or_else(|| Utc::now().date_naive());

    let order = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        INSERT INTO orders (batch_id, customer_id, product_id, quantity, unit_price,
                            sales_amount, other_costs, total_cost, gross_profit, status,
                            stock_deducted, order_date, remark, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(batch_id)
    .bind(data.customer_id)
    .bind(data.product_id)
    .bind(data.quantity)
    .bind(data.unit_price)
    .bind(financials.sales_amount)
    .bind(other_costs)
    .bind(financials.total_cost)
    .bind(financials.gross_profit)
    .bind(status.as_str())
    .bind(consume)
    .bind(order_date)
    .bind(data.remark.as_deref().unwrap_or(""))
    .bind(actor_id)
    .fetch_one(&mut *conn)
    .await?;

    if consume {
        let remark = format!("Order {} created as {}", order.id, status.label());
        stock::apply_locked(
            conn,
            data.product_id,
            StockOperation::Out {
                quantity: data.quantity,
            },
            actor_id,
            &remark,
        )
        .await?;
        refresh_sold_quantity(conn, data.product_id).await?;
    }

    Ok(order)
}

impl OrderService {
    /// Create a new OrderService instance with the configured transition
    /// policy
    pub fn new(db: PgPool, config: &Config) -> Self {
        let policy = if config.order.strict_transitions {
            TransitionPolicy::strict()
        } else {
            TransitionPolicy::permissive()
        };
        Self { db, policy }
    }

    /// Create an order within a batch
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateOrderInput,
    ) -> AppResult<OrderResponse> {
        let mut tx = self.db.begin().await?;

        let batch_owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT created_by FROM batches WHERE id = $1",
        )
        .bind(input.batch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;
        require_owner(actor, batch_owner)?;

        let order = insert_order_tx(&mut tx, actor.user_id, input.batch_id, &input.order).await?;
        batch::recompute_total_profit(&mut tx, input.batch_id).await?;

        tx.commit().await?;
        order.into_response()
    }

    /// Edit an order's financial and descriptive fields, recomputing the
    /// derived amounts and the batch total atomically
    pub async fn update(
        &self,
        actor: &AuthUser,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderResponse> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        require_owner(actor, order.created_by)?;

        let quantity = input.quantity.unwrap_or(order.quantity);
        let unit_price = input.unit_price.unwrap_or(order.unit_price);
        let other_costs = input.other_costs.unwrap_or(order.other_costs);

        validate_quantity(quantity).map_err(|e| AppError::Validation {
            field: "quantity".to_string(),
            message: e.to_string(),
        })?;
        validate_unit_price(unit_price).map_err(|e| AppError::Validation {
            field: "unit_price".to_string(),
            message: e.to_string(),
        })?;
        validate_cost(other_costs).map_err(|e| AppError::Validation {
            field: "other_costs".to_string(),
            message: e.to_string(),
        })?;

        if quantity != order.quantity && order.stock_deducted {
            return Err(AppError::ValidationError(
                "Quantity cannot change while the order holds deducted stock".to_string(),
            ));
        }

        let cost_price =
            sqlx::query_scalar::<_, Decimal>("SELECT cost_price FROM products WHERE id = $1")
                .bind(order.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let financials = OrderFinancials::compute(quantity, unit_price, cost_price, other_costs);
        let remark = input.remark.unwrap_or(order.remark);
        let order_date = input.order_date.unwrap_or(order.order_date);

        let updated = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET quantity = $1, unit_price = $2, sales_amount = $3, other_costs = $4,
                total_cost = $5, gross_profit = $6, remark = $7, order_date = $8,
                updated_at = NOW()
            WHERE id = $9
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(quantity)
        .bind(unit_price)
        .bind(financials.sales_amount)
        .bind(other_costs)
        .bind(financials.total_cost)
        .bind(financials.gross_profit)
        .bind(&remark)
        .bind(order_date)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        batch::recompute_total_profit(&mut tx, updated.batch_id).await?;
        tx.commit().await?;

        updated.into_response()
    }

    /// Apply a status transition to a single order.
    ///
    /// One transaction covers the policy check, the stock effect and the
    /// batch profit recompute; failure at any point leaves the order, the
    /// product and the batch untouched.
    pub async fn transition(
        &self,
        actor: &AuthUser,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        require_owner(actor, order.created_by)?;

        let from = parse_status(&order.status)?;
        if !self.policy.is_allowed(from, new_status) {
            return Err(AppError::InvalidTransition(format!(
                "cannot move order from {} to {}",
                from.label(),
                new_status.label()
            )));
        }

        let stock_deducted = match plan_stock_effect(order.stock_deducted, new_status) {
            StockEffect::Deduct => {
                let remark = format!("Order {} moved to {}", order.id, new_status.label());
                stock::apply_locked(
                    &mut tx,
                    order.product_id,
                    StockOperation::Out {
                        quantity: order.quantity,
                    },
                    actor.user_id,
                    &remark,
                )
                .await?;
                true
            }
            StockEffect::Restore => {
                let remark = format!("Order {} refunded", order.id);
                stock::apply_locked(
                    &mut tx,
                    order.product_id,
                    StockOperation::In {
                        quantity: order.quantity,
                    },
                    actor.user_id,
                    &remark,
                )
                .await?;
                false
            }
            StockEffect::None => order.stock_deducted,
        };

        let updated = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = $1, stock_deducted = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(new_status.as_str())
        .bind(stock_deducted)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        refresh_sold_quantity(&mut tx, updated.product_id).await?;
        batch::recompute_total_profit(&mut tx, updated.batch_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            from = from.as_str(),
            to = new_status.as_str(),
            "order status updated"
        );

        Ok(TransitionOutcome {
            order: updated.into_response()?,
            previous_status: from,
            previous_status_label: from.label().to_string(),
            new_status,
            new_status_label: new_status.label().to_string(),
        })
    }

    /// Apply one target status to many orders, isolating per-order failures.
    /// Each order transitions in its own transaction; one rejected order
    /// never blocks the rest.
    pub async fn batch_transition(
        &self,
        actor: &AuthUser,
        input: BatchTransitionInput,
    ) -> AppResult<BatchTransitionOutcome> {
        if input.order_ids.is_empty() {
            return Err(AppError::ValidationError(
                "order_ids cannot be empty".to_string(),
            ));
        }
        let target = parse_target_status(&input.status)?;

        let mut updated_count = 0;
        let mut failures = Vec::new();

        for order_id in input.order_ids {
            match self.transition(actor, order_id, target).await {
                Ok(_) => updated_count += 1,
                Err(err) => failures.push(TransitionFailure {
                    order_id,
                    error: err.to_string(),
                }),
            }
        }

        Ok(BatchTransitionOutcome {
            updated_count,
            failures,
        })
    }

    /// List orders with optional filters. Normal users see only their own.
    pub async fn list(
        &self,
        actor: &AuthUser,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<OrderListItem>> {
        let created_by = if actor.is_admin() {
            None
        } else {
            Some(actor.user_id)
        };
        let status = filter.status.map(|s| s.as_str().to_string());

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM orders o
            WHERE ($1::uuid IS NULL OR o.created_by = $1)
              AND ($2::text IS NULL OR o.status = $2)
              AND ($3::uuid IS NULL OR o.batch_id = $3)
              AND ($4::uuid IS NULL OR o.customer_id = $4)
              AND ($5::uuid IS NULL OR o.product_id = $5)
            "#,
        )
        .bind(created_by)
        .bind(&status)
        .bind(filter.batch_id)
        .bind(filter.customer_id)
        .bind(filter.product_id)
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
            WHERE ($1::uuid IS NULL OR o.created_by = $1)
              AND ($2::text IS NULL OR o.status = $2)
              AND ($3::uuid IS NULL OR o.batch_id = $3)
              AND ($4::uuid IS NULL OR o.customer_id = $4)
              AND ($5::uuid IS NULL OR o.product_id = $5)
            ORDER BY o.order_date DESC, o.created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(created_by)
        .bind(&status)
        .bind(filter.batch_id)
        .bind(filter.customer_id)
        .bind(filter.product_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: orders,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Get a single order
    pub async fn get(&self, actor: &AuthUser, order_id: Uuid) -> AppResult<OrderResponse> {
        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        require_owner(actor, order.created_by)?;

        order.into_response()
    }
}
