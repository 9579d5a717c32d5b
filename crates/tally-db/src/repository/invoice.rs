//! # Invoice Repository
//!
//! Invoice persistence, including the atomic commit that turns a confirmed
//! cart into durable records.
//!
//! ## The Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     commit(invoice, items)                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT invoice header                                                │
//! │    for each item:                                                       │
//! │        INSERT invoice_items row                                         │
//! │        if item has a product_id:                                        │
//! │            UPDATE products SET stock = stock - quantity                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure before COMMIT rolls the whole unit back: no header,        │
//! │  no items, no stock change. Stock is NOT clamped at zero - selling      │
//! │  more than on-hand records negative stock (backorder).                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::{Invoice, InvoiceItem};

/// Repository for invoice operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    cashier: String,
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    amount_paid_cents: i64,
    created_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            cashier: self.cashier,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            amount_paid_cents: self.amount_paid_cents,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceItemRow {
    id: String,
    invoice_id: String,
    product_id: Option<String>,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
    created_at: DateTime<Utc>,
}

impl InvoiceItemRow {
    fn into_item(self) -> InvoiceItem {
        InvoiceItem {
            id: self.id,
            invoice_id: self.invoice_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            line_total_cents: self.line_total_cents,
            created_at: self.created_at,
        }
    }
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Commits an invoice and its items atomically, decrementing stock for
    /// every item that references a catalog product.
    ///
    /// ## Atomicity
    /// Header insert, item inserts, and stock decrements all run inside a
    /// single transaction. Any failure (constraint violation, missing
    /// product, I/O error) rolls back everything; the caller's cart must be
    /// left untouched so the operator can retry.
    pub async fn commit(&self, invoice: &Invoice, items: &[InvoiceItem]) -> DbResult<()> {
        debug!(
            invoice_number = %invoice.invoice_number,
            item_count = items.len(),
            "Committing invoice"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO invoices \
             (id, invoice_number, customer_name, customer_phone, customer_address, \
              cashier, subtotal_cents, discount_cents, total_cents, amount_paid_cents, \
              created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_phone)
        .bind(&invoice.customer_address)
        .bind(&invoice.cashier)
        .bind(invoice.subtotal_cents)
        .bind(invoice.discount_cents)
        .bind(invoice.total_cents)
        .bind(invoice.amount_paid_cents)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO invoice_items \
                 (id, invoice_id, product_id, product_name, quantity, \
                  unit_price_cents, line_total_cents, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&item.id)
            .bind(&item.invoice_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            // Stock decrement, no zero clamp: negative stock means backorder
            if let Some(product_id) = &item.product_id {
                let result = sqlx::query(
                    "UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1",
                )
                .bind(product_id)
                .bind(item.quantity)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    // Dropping tx rolls back the whole commit
                    return Err(DbError::not_found("Product", product_id));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            invoice_number = %invoice.invoice_number,
            total_cents = invoice.total_cents,
            "Invoice committed"
        );

        Ok(())
    }

    /// Gets an invoice by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            "SELECT id, invoice_number, customer_name, customer_phone, customer_address, \
             cashier, subtotal_cents, discount_cents, total_cents, amount_paid_cents, \
             created_at \
             FROM invoices WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InvoiceRow::into_invoice))
    }

    /// Gets an invoice by its human-facing number.
    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            "SELECT id, invoice_number, customer_name, customer_phone, customer_address, \
             cashier, subtotal_cents, discount_cents, total_cents, amount_paid_cents, \
             created_at \
             FROM invoices WHERE invoice_number = ?1",
        )
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InvoiceRow::into_invoice))
    }

    /// Gets all items belonging to an invoice.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let rows: Vec<InvoiceItemRow> = sqlx::query_as(
            "SELECT id, invoice_id, product_id, product_name, quantity, \
             unit_price_cents, line_total_cents, created_at \
             FROM invoice_items WHERE invoice_id = ?1 ORDER BY rowid",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InvoiceItemRow::into_item).collect())
    }

    /// Lists the most recent invoices, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(
            "SELECT id, invoice_number, customer_name, customer_phone, customer_address, \
             cashier, subtotal_cents, discount_cents, total_cents, amount_paid_cents, \
             created_at \
             FROM invoices ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InvoiceRow::into_invoice).collect())
    }

    /// Deletes an invoice and its items (ON DELETE CASCADE).
    ///
    /// Does NOT restore stock; a void-with-restock flow would be a separate
    /// transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    /// Counts all invoices (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Invoice Number Generation
// =============================================================================

/// Process-wide counter that disambiguates invoices created within the same
/// second.
static INVOICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generates a unique, human-sortable invoice number.
///
/// Format: `INV-YYYYMMDD-HHMMSS-NNNN` where NNNN is a process-wide counter.
/// The timestamp makes numbers sortable; the counter keeps two commits in
/// the same second distinct.
pub fn generate_invoice_number() -> String {
    let seq = INVOICE_SEQ.fetch_add(1, Ordering::Relaxed) % 10_000;
    let now = Utc::now();
    format!("INV-{}-{:04}", now.format("%Y%m%d-%H%M%S"), seq)
}

/// Helper to generate a new invoice or item ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::generate_product_id;
    use tally_core::Product;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            aliases: Vec::new(),
            price_cents,
            stock,
            min_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.catalog().insert(&product).await.unwrap();
        product
    }

    fn header(invoice_number: &str, subtotal_cents: i64) -> Invoice {
        Invoice {
            id: generate_invoice_id(),
            invoice_number: invoice_number.to_string(),
            customer_name: Some("Chị Hoa".to_string()),
            customer_phone: None,
            customer_address: None,
            cashier: "owner".to_string(),
            subtotal_cents,
            discount_cents: 0,
            total_cents: subtotal_cents,
            amount_paid_cents: subtotal_cents,
            created_at: Utc::now(),
        }
    }

    fn item(invoice: &Invoice, product: &Product, quantity: i64) -> InvoiceItem {
        InvoiceItem {
            id: generate_invoice_id(),
            invoice_id: invoice.id.clone(),
            product_id: Some(product.id.clone()),
            product_name: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
            line_total_cents: product.price_cents * quantity,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_persists_and_decrements_stock() {
        let db = db().await;
        let product = seed_product(&db, "Coca Cola", 12000, 50).await;

        let invoice = header("INV-TEST-0001", 36000);
        let items = vec![item(&invoice, &product, 3)];

        db.invoices().commit(&invoice, &items).await.unwrap();

        let stored = db
            .invoices()
            .get_by_number("INV-TEST-0001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_cents, 36000);

        let stored_items = db.invoices().get_items(&stored.id).await.unwrap();
        assert_eq!(stored_items.len(), 1);
        assert_eq!(stored_items[0].quantity, 3);

        let reloaded = db.catalog().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, 47);
    }

    #[tokio::test]
    async fn test_commit_allows_negative_stock() {
        let db = db().await;
        let product = seed_product(&db, "Sprite", 10000, 1).await;

        let invoice = header("INV-TEST-0002", 40000);
        let items = vec![item(&invoice, &product, 4)];
        db.invoices().commit(&invoice, &items).await.unwrap();

        let reloaded = db.catalog().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, -3);
    }

    #[tokio::test]
    async fn test_commit_rolls_back_as_a_unit() {
        let db = db().await;
        let product = seed_product(&db, "Coca Cola", 12000, 50).await;

        let invoice = header("INV-TEST-0003", 60000);
        // Second item points at a product that does not exist, so the
        // foreign key check fails mid-transaction.
        let good = item(&invoice, &product, 2);
        let bad = InvoiceItem {
            product_id: Some("no-such-product".to_string()),
            ..item(&invoice, &product, 3)
        };

        let err = db.invoices().commit(&invoice, &[good, bad]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::ForeignKeyViolation { .. } | DbError::NotFound { .. }
        ));

        // Nothing from the failed commit is visible
        assert!(db
            .invoices()
            .get_by_number("INV-TEST-0003")
            .await
            .unwrap()
            .is_none());
        assert_eq!(db.invoices().count().await.unwrap(), 0);

        let reloaded = db.catalog().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, 50);
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number_rejected() {
        let db = db().await;
        let product = seed_product(&db, "Sprite", 10000, 20).await;

        let first = header("INV-TEST-0004", 10000);
        db.invoices()
            .commit(&first, &[item(&first, &product, 1)])
            .await
            .unwrap();

        let second = header("INV-TEST-0004", 10000);
        let err = db
            .invoices()
            .commit(&second, &[item(&second, &product, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The failed duplicate must not have touched stock
        let reloaded = db.catalog().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, 19);
    }

    #[tokio::test]
    async fn test_delete_cascades_items() {
        let db = db().await;
        let product = seed_product(&db, "Sprite", 10000, 20).await;

        let invoice = header("INV-TEST-0005", 10000);
        db.invoices()
            .commit(&invoice, &[item(&invoice, &product, 1)])
            .await
            .unwrap();

        db.invoices().delete(&invoice.id).await.unwrap();

        assert!(db.invoices().get_by_id(&invoice.id).await.unwrap().is_none());
        assert!(db.invoices().get_items(&invoice.id).await.unwrap().is_empty());
    }

    #[test]
    fn test_invoice_numbers_are_unique_within_a_second() {
        let a = generate_invoice_number();
        let b = generate_invoice_number();
        assert_ne!(a, b);
        assert!(a.starts_with("INV-"));
    }
}
