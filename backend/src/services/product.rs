//! Product service
//!
//! Products carry the single source of truth for stock. CRUD lives here;
//! every stock mutation, including the initial fill on creation, goes through
//! the ledger so the audit trail stays complete.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_cost, validate_stock_level};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::{require_admin, AuthUser};
use crate::models::{stock_status, StockOperation, StockStatus};
use crate::services::stock;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    low_stock_threshold: i32,
}

/// Product row as stored
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub specification: String,
    pub cost_price: Decimal,
    pub current_stock: i32,
    pub sold_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product representation returned to clients, with the derived stock
/// classification
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub specification: String,
    pub cost_price: Decimal,
    pub current_stock: i32,
    pub sold_quantity: i32,
    pub stock_status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub specification: String,
    pub cost_price: Decimal,
    /// Optional opening stock, recorded as an `in` ledger entry
    pub initial_stock: Option<i32>,
}

/// Input for updating a product
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub specification: Option<String>,
    pub cost_price: Option<Decimal>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, specification, cost_price, current_stock, sold_quantity, created_at, updated_at";

impl ProductRow {
    fn into_response(self, threshold: i32) -> ProductResponse {
        ProductResponse {
            stock_status: stock_status(self.current_stock, threshold),
            id: self.id,
            name: self.name,
            specification: self.specification,
            cost_price: self.cost_price,
            current_stock: self.current_stock,
            sold_quantity: self.sold_quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            low_stock_threshold: config.order.low_stock_threshold,
        }
    }

    /// List products ordered by name, optionally filtered by a name or
    /// specification search term
    pub async fn list(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<ProductResponse>> {
        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                   OR specification ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                   OR specification ILIKE '%' || $1 || '%')
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: products
                .into_iter()
                .map(|p| p.into_response(self.low_stock_threshold))
                .collect(),
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Get a product by id
    pub async fn get(&self, product_id: Uuid) -> AppResult<ProductResponse> {
        let product = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product.into_response(self.low_stock_threshold))
    }

    /// Create a product (admin only). Name + specification must be unique.
    pub async fn create(
        &self,
        actor: &AuthUser,
        input: CreateProductInput,
    ) -> AppResult<ProductResponse> {
        require_admin(actor)?;
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_cost(input.cost_price).map_err(|e| AppError::ValidationError(e.to_string()))?;
        let initial_stock = input.initial_stock.unwrap_or(0);
        validate_stock_level(initial_stock)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND specification = $2)",
        )
        .bind(&input.name)
        .bind(&input.specification)
        .fetch_one(&self.db)
        .await?;
        if duplicate {
            return Err(AppError::DuplicateEntry("name+specification".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let product = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, specification, cost_price, current_stock, sold_quantity)
            VALUES ($1, $2, $3, 0, 0)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.specification)
        .bind(input.cost_price)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = product;
        if initial_stock > 0 {
            let record = stock::apply_locked(
                &mut tx,
                created.id,
                StockOperation::In {
                    quantity: initial_stock,
                },
                actor.user_id,
                "Opening stock",
            )
            .await?;
            created.current_stock = record.after_stock;
        }

        tx.commit().await?;
        Ok(created.into_response(self.low_stock_threshold))
    }

    /// Update a product (admin only). A cost price change affects future
    /// orders only; existing orders keep their persisted financials.
    pub async fn update(
        &self,
        actor: &AuthUser,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductResponse> {
        require_admin(actor)?;
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let existing = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let name = input.name.unwrap_or(existing.name);
        let specification = input.specification.unwrap_or(existing.specification);
        let cost_price = input.cost_price.unwrap_or(existing.cost_price);
        validate_cost(cost_price).map_err(|e| AppError::ValidationError(e.to_string()))?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND specification = $2 AND id <> $3)",
        )
        .bind(&name)
        .bind(&specification)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;
        if duplicate {
            return Err(AppError::DuplicateEntry("name+specification".to_string()));
        }

        let product = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, specification = $2, cost_price = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&specification)
        .bind(cost_price)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product.into_response(self.low_stock_threshold))
    }

    /// List products at or below a stock threshold, lowest stock first.
    /// The override applies to this query only; stored classification keeps
    /// the configured default.
    pub async fn low_stock(
        &self,
        threshold: Option<i32>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<ProductResponse>> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);
        if threshold < 0 {
            return Err(AppError::ValidationError(
                "Threshold cannot be negative".to_string(),
            ));
        }

        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE current_stock <= $1",
        )
        .bind(threshold)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE current_stock <= $1
            ORDER BY current_stock, name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(threshold)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: products
                .into_iter()
                .map(|p| p.into_response(threshold))
                .collect(),
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }
}
