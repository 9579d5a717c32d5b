//! # Order-Entry Session
//!
//! The session that carries one order from pasted text to committed invoice.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderSession                                     │
//! │                                                                         │
//! │  open(db) ──► catalog snapshot loaded (stable insertion order)          │
//! │                                                                         │
//! │  analyze(text)      rebuilds the cart from scratch every call, so       │
//! │                     re-analyzing edited text is idempotent              │
//! │                                                                         │
//! │  set_quantity /     manual corrections on individual lines              │
//! │  adjust / remove                                                        │
//! │                                                                         │
//! │  quick_add(...)     creates the missing product, then retries every     │
//! │                     error line against the refreshed snapshot           │
//! │                                                                         │
//! │  commit(details)    resolved lines → invoice, atomically persisted;     │
//! │                     cart cleared ONLY on success (failure = retryable)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Semantics
//! The catalog snapshot is loaded once per session and refreshed only by
//! `quick_add` and a successful `commit`. Prices frozen into cart lines at
//! resolution time survive later catalog edits, matching how a paper
//! order pad behaves.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use tally_core::parse::parse_text;
use tally_core::validation::{validate_price_cents, validate_product_name};
use tally_core::{resolve_fragment, Cart, Invoice, InvoiceItem, Product};
use tally_db::repository::catalog::generate_product_id;
use tally_db::repository::invoice::{generate_invoice_id, generate_invoice_number};
use tally_db::Database;

// =============================================================================
// Commit Details
// =============================================================================

/// Operator-supplied details for a commit. All optional; an anonymous
/// walk-in cash sale is `CommitDetails::default()`.
#[derive(Debug, Clone, Default)]
pub struct CommitDetails {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,

    /// Absolute discount in minor units, subtracted from the subtotal.
    pub discount_cents: i64,

    /// Amount tendered; `None` means exact payment.
    pub amount_paid_cents: Option<i64>,
}

// =============================================================================
// Order Session
// =============================================================================

/// One operator's order-entry session against one database.
#[derive(Debug)]
pub struct OrderSession {
    db: Database,
    catalog: Vec<Product>,
    cart: Cart,
    cashier: String,
}

impl OrderSession {
    /// Opens a session, loading the catalog snapshot.
    pub async fn open(db: Database, cashier: impl Into<String>) -> EngineResult<Self> {
        let catalog = db.catalog().list().await?;
        info!(products = catalog.len(), "Order session opened");

        Ok(OrderSession {
            db,
            catalog,
            cart: Cart::new(),
            cashier: cashier.into(),
        })
    }

    /// The current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The catalog snapshot this session resolves against.
    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    /// Reloads the catalog snapshot from the database.
    pub async fn refresh_catalog(&mut self) -> EngineResult<()> {
        self.catalog = self.db.catalog().list().await?;
        debug!(products = self.catalog.len(), "Catalog snapshot refreshed");
        Ok(())
    }

    /// Analyzes raw order text into the cart.
    ///
    /// The cart is rebuilt from scratch on every call: the text box is the
    /// source of truth, so editing a line and re-analyzing never duplicates
    /// quantities. Lines that resolve to the same product merge; lines that
    /// resolve to nothing become error lines awaiting quick-add.
    pub fn analyze(&mut self, text: &str) -> EngineResult<&Cart> {
        self.cart.clear();

        for parsed in parse_text(text) {
            match resolve_fragment(&parsed.name_fragment, &self.catalog) {
                Some(product) => {
                    self.cart
                        .push_resolved(product, parsed.quantity, &parsed.original_text)?;
                }
                None => {
                    self.cart.push_unresolved(
                        &parsed.name_fragment,
                        parsed.quantity,
                        &parsed.original_text,
                    )?;
                }
            }
        }

        debug!(
            lines = self.cart.line_count(),
            unresolved = self.cart.unresolved_lines().count(),
            subtotal_cents = self.cart.subtotal_cents(),
            "Order text analyzed"
        );

        Ok(&self.cart)
    }

    /// Sets a cart line's quantity (0 removes the line).
    pub fn set_quantity(&mut self, line_id: &str, quantity: i64) -> EngineResult<()> {
        self.cart.set_quantity(line_id, quantity)?;
        Ok(())
    }

    /// Adjusts a cart line's quantity by a delta.
    pub fn adjust_quantity(&mut self, line_id: &str, delta: i64) -> EngineResult<()> {
        self.cart.adjust_quantity(line_id, delta)?;
        Ok(())
    }

    /// Removes a cart line.
    pub fn remove_line(&mut self, line_id: &str) -> EngineResult<()> {
        self.cart.remove_line(line_id)?;
        Ok(())
    }

    /// Clears the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Creates a product on the spot and retries every error line against
    /// the enlarged catalog.
    ///
    /// This is the recovery path for "banh bo" typed before Bánh Bò exists:
    /// the operator fills in name and price, the product is persisted, and
    /// any error line whose fragment now matches upgrades in place (merging
    /// into an existing line for the same product where applicable).
    ///
    /// Returns the created product.
    pub async fn quick_add(
        &mut self,
        name: &str,
        price_cents: i64,
        initial_stock: i64,
    ) -> EngineResult<Product> {
        validate_product_name(name).map_err(tally_core::CoreError::from)?;
        validate_price_cents(price_cents).map_err(tally_core::CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.trim().to_string(),
            aliases: Vec::new(),
            price_cents,
            stock: initial_stock,
            min_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.catalog().insert(&product).await?;
        info!(id = %product.id, name = %product.name, "Quick-added product");

        self.refresh_catalog().await?;
        self.retry_unresolved()?;

        Ok(product)
    }

    /// Re-resolves every error line against the current snapshot.
    fn retry_unresolved(&mut self) -> EngineResult<()> {
        let pending: Vec<(String, String)> = self
            .cart
            .unresolved_lines()
            .map(|l| (l.id.clone(), l.display_name.clone()))
            .collect();

        for (line_id, fragment) in pending {
            if let Some(product) = resolve_fragment(&fragment, &self.catalog) {
                let product = product.clone();
                self.cart.resolve_line(&line_id, &product)?;
                debug!(line_id = %line_id, product = %product.name, "Error line resolved");
            }
        }

        Ok(())
    }

    /// Commits the cart's resolved lines as an invoice, atomically.
    ///
    /// ## Semantics
    /// - Error lines are excluded; at least one resolved line is required.
    /// - Header, items and stock decrements persist as one transaction.
    /// - On success the cart is cleared and the snapshot refreshed (stock
    ///   changed). On ANY failure the cart is left exactly as it was, so
    ///   the operator can fix the problem and press commit again.
    pub async fn commit(&mut self, details: CommitDetails) -> EngineResult<Invoice> {
        if !self.cart.has_resolved() {
            return Err(EngineError::EmptyCommit);
        }

        let subtotal_cents = self.cart.subtotal_cents();
        let total_cents = subtotal_cents - details.discount_cents;
        let now = Utc::now();

        let invoice = Invoice {
            id: generate_invoice_id(),
            invoice_number: generate_invoice_number(),
            customer_name: details.customer_name,
            customer_phone: details.customer_phone,
            customer_address: details.customer_address,
            cashier: self.cashier.clone(),
            subtotal_cents,
            discount_cents: details.discount_cents,
            total_cents,
            amount_paid_cents: details.amount_paid_cents.unwrap_or(total_cents),
            created_at: now,
        };

        let items: Vec<InvoiceItem> = self
            .cart
            .resolved_lines()
            .map(|line| InvoiceItem {
                id: generate_invoice_id(),
                invoice_id: invoice.id.clone(),
                product_id: line.product_id.clone(),
                product_name: line.display_name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents,
                created_at: now,
            })
            .collect();

        // Cart stays untouched until the transaction lands
        self.db.invoices().commit(&invoice, &items).await?;

        info!(
            invoice_number = %invoice.invoice_number,
            total_cents = invoice.total_cents,
            items = items.len(),
            "Order committed"
        );

        self.cart.clear();
        self.refresh_catalog().await?;

        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_db::DbConfig;

    async fn session_with_catalog() -> OrderSession {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        for (name, aliases, price, stock) in [
            ("Coca Cola", vec!["coca", "coke"], 12_000, 50),
            ("Sprite", vec![], 10_000, 30),
            ("Áo Sơ Mi", vec!["ao so mi"], 150_000, 12),
        ] {
            let now = Utc::now();
            catalog
                .insert(&Product {
                    id: generate_product_id(),
                    name: name.to_string(),
                    aliases: aliases.into_iter().map(String::from).collect(),
                    price_cents: price,
                    stock,
                    min_stock: 0,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        OrderSession::open(db, "owner").await.unwrap()
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let mut session = session_with_catalog().await;

        let cart = session
            .analyze("3 ao so mi\nCoca Cola x5\n2 cái Sprite\nbanh bo")
            .unwrap();

        assert_eq!(cart.line_count(), 4);
        assert_eq!(cart.unresolved_lines().count(), 1);
        // 3×150_000 + 5×12_000 + 2×10_000, error line contributes 0
        assert_eq!(cart.subtotal_cents(), 530_000);
    }

    #[tokio::test]
    async fn test_reanalyze_is_idempotent() {
        let mut session = session_with_catalog().await;

        session.analyze("3 coca").unwrap();
        session.analyze("3 coca").unwrap();

        let cart = session.cart();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_duplicate_products_merge() {
        let mut session = session_with_catalog().await;

        session.analyze("2 coca\ncoca x3").unwrap();

        let cart = session.cart();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.subtotal_cents(), 60_000);
    }

    #[tokio::test]
    async fn test_quick_add_resolves_error_line() {
        let mut session = session_with_catalog().await;
        session.analyze("2 banh bo").unwrap();
        assert_eq!(session.cart().unresolved_lines().count(), 1);

        session.quick_add("Bánh Bò", 5_000, 20).await.unwrap();

        let cart = session.cart();
        assert_eq!(cart.unresolved_lines().count(), 0);
        assert_eq!(cart.line_count(), 1);
        assert!(cart.lines[0].resolved);
        assert_eq!(cart.subtotal_cents(), 10_000);
    }

    #[tokio::test]
    async fn test_quick_add_rejects_bad_input() {
        let mut session = session_with_catalog().await;

        assert!(session.quick_add("", 5_000, 0).await.is_err());
        assert!(session.quick_add("Bánh Bò", -1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_commit_success_clears_cart_and_decrements_stock() {
        let mut session = session_with_catalog().await;
        session.analyze("3 coca").unwrap();

        let invoice = session.commit(CommitDetails::default()).await.unwrap();

        assert_eq!(invoice.subtotal_cents, 36_000);
        assert_eq!(invoice.total_cents, 36_000);
        assert!(session.cart().is_empty());

        // Snapshot refreshed with the decremented stock
        let coke = session
            .catalog()
            .iter()
            .find(|p| p.name == "Coca Cola")
            .unwrap();
        assert_eq!(coke.stock, 47);
    }

    #[tokio::test]
    async fn test_commit_applies_discount() {
        let mut session = session_with_catalog().await;
        session.analyze("3 coca").unwrap();

        let invoice = session
            .commit(CommitDetails {
                customer_name: Some("Chị Hoa".to_string()),
                discount_cents: 6_000,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(invoice.total_cents, 30_000);
        assert_eq!(invoice.amount_paid_cents, 30_000);
    }

    #[tokio::test]
    async fn test_commit_requires_resolved_lines() {
        let mut session = session_with_catalog().await;

        let err = session.commit(CommitDetails::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyCommit));

        session.analyze("banh bo\nxyz123").unwrap();
        let err = session.commit(CommitDetails::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyCommit));
    }

    #[tokio::test]
    async fn test_failed_commit_preserves_cart() {
        let mut session = session_with_catalog().await;
        session.analyze("3 coca").unwrap();
        let product_id = session.cart().lines[0].product_id.clone().unwrap();

        // Yank the product out from under the session so the commit's stock
        // decrement finds nothing and the transaction rolls back.
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(&product_id)
            .execute(session.db.pool())
            .await
            .unwrap();

        let err = session.commit(CommitDetails::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::Db(_)));

        // Cart untouched, ready for retry
        assert_eq!(session.cart().line_count(), 1);
        assert_eq!(session.cart().subtotal_cents(), 36_000);

        // Nothing was persisted
        assert_eq!(session.db.invoices().count().await.unwrap(), 0);
    }
}
