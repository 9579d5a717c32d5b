//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Invoice      │   │  InvoiceItem    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  invoice_number │   │  invoice_id(FK) │       │
//! │  │  aliases []     │   │  customer_*     │   │  product_id     │       │
//! │  │  price_cents    │   │  subtotal/total │   │  qty × price    │       │
//! │  │  stock/min_stock│   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                        ┌─────────────────┐                              │
//! │                        │   Suggestion    │  best-effort AI enrichment   │
//! │                        │  name/qty/conf  │  (consumed, never trusted)   │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver only ever reads `name` and `aliases` from a product; all other
//! fields belong to catalog management and invoice commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the shop catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to operator and on the invoice.
    pub name: String,

    /// Alternate names the operator may type ("coke", "cocacola", ...).
    /// Matched with the same normalization as `name`.
    pub aliases: Vec<String>,

    /// Price in minor units.
    pub price_cents: i64,

    /// Current stock level. May go negative after a sale: the commit path
    /// does not clamp at zero (backorder semantics).
    pub stock: i64,

    /// Reorder threshold used by low-stock reporting.
    pub min_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether stock has fallen to or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A persisted invoice header.
///
/// Created exactly once at commit time from a cart snapshot containing only
/// resolved lines; immutable thereafter except by explicit correction flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// Human-readable unique number, e.g. `INV-20260827-143005-0001`.
    pub invoice_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    /// Operator who committed the sale.
    pub cashier: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// total = subtotal - discount
    pub total_cents: i64,
    pub amount_paid_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the invoice total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Outstanding balance (total minus amount paid). Negative means change due.
    #[inline]
    pub fn balance_cents(&self) -> i64 {
        self.total_cents - self.amount_paid_cents
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line item on a persisted invoice.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    /// Product reference, when known. Kept optional so correction flows can
    /// carry free-form items; the standard commit path always sets it.
    pub product_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in minor units at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Suggestion
// =============================================================================

/// A candidate line from the external suggestion service.
///
/// Best-effort enrichment only: suggestions never gate manual entry or the
/// fuzzy resolver, and a failed or slow service degrades to an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub quantity: i64,
    /// Service-reported confidence in the range 0.0 ..= 1.0.
    pub confidence: f32,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min_stock: i64) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Coca Cola".to_string(),
            aliases: vec!["coke".to_string()],
            price_cents: 12000,
            stock,
            min_stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock() {
        assert!(product(3, 5).is_low_stock());
        assert!(product(5, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }

    #[test]
    fn test_invoice_balance() {
        let invoice = Invoice {
            id: "i1".to_string(),
            invoice_number: "INV-1".to_string(),
            customer_name: None,
            customer_phone: None,
            customer_address: None,
            cashier: "an".to_string(),
            subtotal_cents: 50000,
            discount_cents: 5000,
            total_cents: 45000,
            amount_paid_cents: 50000,
            created_at: Utc::now(),
        };
        assert_eq!(invoice.balance_cents(), -5000); // change due
        assert_eq!(invoice.total().cents(), 45000);
    }
}
