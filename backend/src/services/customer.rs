//! Customer service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

use crate::error::{AppError, AppResult};
use crate::services::order::OrderListItem;

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Customer row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub contact: String,
    pub address: String,
}

/// Input for updating a customer
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub contact: Option<String>,
    pub address: Option<String>,
}

const CUSTOMER_COLUMNS: &str = "id, name, contact, address, created_at, updated_at";

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List customers, newest first, optionally filtered by a search term
    /// over name, contact and address
    pub async fn list(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<CustomerRow>> {
        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                   OR contact ILIKE '%' || $1 || '%'
                   OR address ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let customers = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                   OR contact ILIKE '%' || $1 || '%'
                   OR address ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: customers,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Get a customer by id
    pub async fn get(&self, customer_id: Uuid) -> AppResult<CustomerRow> {
        sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// Create a customer
    pub async fn create(&self, input: CreateCustomerInput) -> AppResult<CustomerRow> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let customer = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (name, contact, address)
            VALUES ($1, $2, $3)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.contact)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Update a customer
    pub async fn update(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<CustomerRow> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let existing = self.get(customer_id).await?;
        let name = input.name.unwrap_or(existing.name);
        let contact = input.contact.unwrap_or(existing.contact);
        let address = input.address.unwrap_or(existing.address);

        let customer = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET name = $1, contact = $2, address = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&contact)
        .bind(&address)
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Delete a customer. Customers referenced by orders cannot be deleted.
    pub async fn delete(&self, customer_id: Uuid) -> AppResult<()> {
        let has_orders = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE customer_id = $1)",
        )
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;
        if has_orders {
            return Err(AppError::ValidationError(
                "Customer has orders and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        Ok(())
    }

    /// List a customer's orders, newest first
    pub async fn orders(
        &self,
        customer_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<OrderListItem>> {
        // Ensure the customer exists before listing
        self.get(customer_id).await?;

        let total_items =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
                .bind(customer_id)
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
            WHERE o.customer_id = $1
            ORDER BY o.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(customer_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: orders,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }
}
