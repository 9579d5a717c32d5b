//! # Catalog Repository
//!
//! Database operations for the product catalog.
//!
//! ## Role In Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The fuzzy resolver never queries the database per fragment.            │
//! │                                                                         │
//! │  analysis start ──► catalog().list() ──► Vec<Product> snapshot          │
//! │                                              │                          │
//! │  every line of the pasted text resolves ◄────┘ (in memory, catalog     │
//! │                                                 order = insertion      │
//! │                                                 order, stable)         │
//! │                                                                         │
//! │  find_by_text() is the separate LIKE-based lookup the UI uses for      │
//! │  type-ahead suggestions; it is NOT part of core resolution.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aliases are stored as a JSON array column and parsed on read; a corrupt
//! value degrades to an empty alias list rather than failing the query.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::Product;

/// Repository for product catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

/// Row shape for the products table. Kept private so tally-core types stay
/// free of sqlx derives; aliases decode from JSON in `into_product`.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    aliases: String,
    price_cents: i64,
    stock: i64,
    min_stock: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            aliases: serde_json::from_str(&self.aliases).unwrap_or_default(),
            price_cents: self.price_cents,
            stock: self.stock,
            min_stock: self.min_stock,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, aliases, price_cents, stock, min_stock, is_active, created_at, updated_at";

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Lists all active products in stable insertion order.
    ///
    /// This is the snapshot the resolver iterates, so the ordering here IS
    /// the documented tie-break for equal fuzzy distances: rowid order,
    /// i.e. the order products were created.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    /// Case-insensitive LIKE search over product names, for UI type-ahead.
    ///
    /// Not used by the core resolver: LIKE has neither diacritic folding nor
    /// fuzzy tolerance, which is exactly why resolution happens in memory.
    pub async fn find_by_text(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching catalog");

        let pattern = format!("%{query}%");
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND name LIKE ?1 ORDER BY name LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    /// Gets a product by its ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductRow::into_product))
    }

    /// Inserts a new product.
    ///
    /// The id should be generated beforehand (see [`generate_product_id`]).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let aliases = serde_json::to_string(&product.aliases)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO products \
             (id, name, aliases, price_cents, stock, min_stock, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(aliases)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adjusts product stock by a delta (negative for sales, positive for
    /// restocking).
    ///
    /// Deliberately NOT clamped at zero: stock can go negative and the shop
    /// treats that as backorder. Single-product adjustments outside a commit
    /// go through here; the commit transaction runs its own decrements so
    /// they roll back with the invoice.
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Updating stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical invoice items still reference this product; a hard delete
    /// would break their foreign keys.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
