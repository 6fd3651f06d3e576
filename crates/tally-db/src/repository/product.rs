//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Batch load by id for checkout (one `IN (...)` query)
//! - CRUD with soft delete
//! - Paginated listing with name search
//!
//! ## Soft Delete
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELETE /products/{id}  ──►  UPDATE products SET is_active = 0         │
//! │                                                                         │
//! │  • invisible to get/list/get_many and therefore to checkout            │
//! │  • still joinable from transaction_items, so old receipts keep names   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{BundleTier, Money, Page, PageRequest, Product};

const PRODUCT_COLUMNS: &str = "id, organization_id, name, description, price_cents, cost_cents, \
     stock, bundle_quantity, bundle_price_cents, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    organization_id: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    cost_cents: i64,
    stock: i64,
    bundle_quantity: Option<i64>,
    bundle_price_cents: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        // The schema pairs the two bundle columns, so a half-set tier cannot be stored
        let bundle = match (row.bundle_quantity, row.bundle_price_cents) {
            (Some(quantity), Some(price)) => Some(BundleTier {
                quantity,
                price: Money::from_cents(price),
            }),
            _ => None,
        };

        Product {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            cost: Money::from_cents(row.cost_cents),
            stock: row.stock,
            bundle,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let page = repo.list(&org_id, Some("kopi"), page).await?;
/// let product = repo.get_by_id(&org_id, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets an active product by id.
    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE id = ?1 AND organization_id = ?2 AND is_active = 1"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Loads every active product in `ids` with a single query.
    ///
    /// Missing, foreign and soft-deleted ids are simply absent from the
    /// result; the caller decides what that means.
    pub async fn get_many(&self, organization_id: &str, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE organization_id = "
        ));
        qb.push_bind(organization_id);
        qb.push(" AND is_active = 1 AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(requested = ids.len(), found = rows.len(), "Batch loaded products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists active products by name, optionally filtered by a case-insensitive
    /// substring of the name.
    pub async fn list(
        &self,
        organization_id: &str,
        search: Option<&str>,
        page: PageRequest,
    ) -> DbResult<Page<Product>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE organization_id = ?1 AND is_active = 1 \
             AND (?2 IS NULL OR LOWER(name) LIKE ?2)",
        )
        .bind(organization_id)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE organization_id = ?1 AND is_active = 1 \
             AND (?2 IS NULL OR LOWER(name) LIKE ?2) \
             ORDER BY name, id LIMIT ?3 OFFSET ?4"
        ))
        .bind(organization_id)
        .bind(pattern.as_deref())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Product::from).collect(),
            total,
            page,
        ))
    }

    /// Inserts a new product (id generated beforehand).
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, organization_id, name, description, price_cents, cost_cents,
                stock, bundle_quantity, bundle_price_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&product.id)
        .bind(&product.organization_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.cost.cents())
        .bind(product.stock)
        .bind(product.bundle.map(|b| b.quantity))
        .bind(product.bundle.map(|b| b.price.cents()))
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Replaces the editable fields of an active product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product after the update
    /// * `Err(DbError::NotFound)` - Unknown, foreign or soft-deleted product
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET
                name = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                stock = ?7,
                bundle_quantity = ?8,
                bundle_price_cents = ?9,
                updated_at = ?10
            WHERE id = ?1 AND organization_id = ?2 AND is_active = 1",
        )
        .bind(&product.id)
        .bind(&product.organization_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.cost.cents())
        .bind(product.stock)
        .bind(product.bundle.map(|b| b.quantity))
        .bind(product.bundle.map(|b| b.price.cents()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.get_by_id(&product.organization_id, &product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Soft-deletes a product.
    pub async fn soft_delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?3 \
             WHERE id = ?1 AND organization_id = ?2 AND is_active = 1",
        )
        .bind(id)
        .bind(organization_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products in an organization.
    pub async fn count(&self, organization_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE organization_id = ?1 AND is_active = 1",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
