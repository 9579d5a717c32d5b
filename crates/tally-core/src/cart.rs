//! # Cart Aggregation
//!
//! Builds and maintains the cart produced by order-text analysis.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Line Lifecycle                                │
//! │                                                                         │
//! │  parse ──► resolve ──┬── hit ──► push_resolved()                       │
//! │                      │            ├── same product already in cart?    │
//! │                      │            │   quantity accumulates in place    │
//! │                      │            └── else append resolved line        │
//! │                      │                                                  │
//! │                      └── miss ─► push_unresolved()                     │
//! │                                   └── append error line (price 0,      │
//! │                                       excluded from commit)            │
//! │                                                                         │
//! │  quick-add ──► resolve_line() upgrades an error line in place,         │
//! │                merging into an existing line for the same product      │
//! │                                                                         │
//! │  manual edits: set_quantity / increment; quantity 0 removes the line   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! The subtotal is never stored. `subtotal_cents()` recomputes Σ line_total
//! on every call, so no sequence of add/update/remove operations can drift it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::Product;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line in the order cart.
///
/// A line is either *resolved* (matched to a catalog product, price frozen at
/// match time) or an *error line* (fragment matched nothing; kept visible so
/// the operator can quick-add the product and retry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier (UUID v4), stable across in-place updates.
    pub id: String,

    /// The raw text that produced this line.
    pub original_text: String,

    /// Matched product, when resolved.
    pub product_id: Option<String>,

    /// Product name for resolved lines, the raw fragment for error lines.
    pub display_name: String,

    /// Accumulated quantity, always >= 1 while the line exists.
    pub quantity: i64,

    /// Unit price frozen at resolution time; 0 for error lines.
    pub unit_price_cents: i64,

    /// quantity × unit_price, maintained on every mutation.
    pub line_total_cents: i64,

    /// Whether this line is eligible for commit.
    pub resolved: bool,
}

impl CartLine {
    fn recompute_total(&mut self) {
        self.line_total_cents = self.unit_price_cents * self.quantity;
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The order cart: an ordered collection of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in entry order.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a resolved `(product, quantity)` to the cart.
    ///
    /// ## Behavior
    /// - If a non-error line already references the same product: its
    ///   quantity accumulates and the line total is recomputed in place.
    /// - Otherwise a new resolved line is appended with the product's
    ///   current price frozen in.
    pub fn push_resolved(
        &mut self,
        product: &Product,
        quantity: i64,
        original_text: &str,
    ) -> CoreResult<()> {
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.resolved && l.product_id.as_deref() == Some(product.id.as_str()))
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            line.recompute_total();
            return Ok(());
        }

        self.check_capacity()?;

        let mut line = CartLine {
            id: Uuid::new_v4().to_string(),
            original_text: original_text.to_string(),
            product_id: Some(product.id.clone()),
            display_name: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
            line_total_cents: 0,
            resolved: true,
        };
        line.recompute_total();
        self.lines.push(line);
        Ok(())
    }

    /// Adds an unresolved `(fragment, quantity)` as an error line.
    ///
    /// Error lines carry price 0, stay visible for the quick-add flow, and
    /// never merge with each other: two unmatched typos are two problems.
    pub fn push_unresolved(
        &mut self,
        fragment: &str,
        quantity: i64,
        original_text: &str,
    ) -> CoreResult<()> {
        self.check_capacity()?;

        self.lines.push(CartLine {
            id: Uuid::new_v4().to_string(),
            original_text: original_text.to_string(),
            product_id: None,
            display_name: fragment.to_string(),
            quantity: quantity.max(1),
            unit_price_cents: 0,
            line_total_cents: 0,
            resolved: false,
        });
        Ok(())
    }

    /// Upgrades an error line to a resolved line once its fragment matches
    /// (used after quick-add creates the missing product).
    ///
    /// If a resolved line for the same product already exists, the error
    /// line's quantity merges into it and the error line is removed.
    pub fn resolve_line(&mut self, line_id: &str, product: &Product) -> CoreResult<()> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        let quantity = self.lines[idx].quantity;

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.resolved && l.product_id.as_deref() == Some(product.id.as_str()))
        {
            let new_qty = existing.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            existing.recompute_total();
            self.lines.remove(idx);
            return Ok(());
        }

        let line = &mut self.lines[idx];
        line.product_id = Some(product.id.clone());
        line.display_name = product.name.clone();
        line.unit_price_cents = product.price_cents;
        line.resolved = true;
        line.recompute_total();
        Ok(())
    }

    /// Sets a line's quantity. Quantity 0 removes the line.
    pub fn set_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_line(line_id);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        line.quantity = quantity;
        line.recompute_total();
        Ok(())
    }

    /// Adjusts a line's quantity by a delta (the `+1` / `-1` buttons).
    /// Dropping to 0 or below removes the line.
    pub fn adjust_quantity(&mut self, line_id: &str, delta: i64) -> CoreResult<()> {
        let current = self
            .lines
            .iter()
            .find(|l| l.id == line_id)
            .map(|l| l.quantity)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        self.set_quantity(line_id, current + delta)
    }

    /// Removes a line from the cart.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != line_id);

        if self.lines.len() == before {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Current subtotal, recomputed from the lines on every call.
    /// Error lines contribute 0 by construction (price 0).
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents).sum()
    }

    /// Lines eligible for commit.
    pub fn resolved_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| l.resolved)
    }

    /// Lines awaiting quick-add.
    pub fn unresolved_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| !l.resolved)
    }

    /// Whether at least one line can be committed.
    pub fn has_resolved(&self) -> bool {
        self.lines.iter().any(|l| l.resolved)
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines (resolved and error lines both count).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn check_capacity(&self) -> CoreResult<()> {
        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            price_cents,
            stock: 10,
            min_stock: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_push_resolved_appends_line() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);

        cart.push_resolved(&coke, 3, "3 Coca Cola").unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.lines[0].line_total_cents, 36000);
        assert_eq!(cart.subtotal_cents(), 36000);
    }

    #[test]
    fn test_same_product_accumulates_quantity() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);

        cart.push_resolved(&coke, 3, "3 Coca Cola").unwrap();
        cart.push_resolved(&coke, 2, "2 Coca Cola").unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.subtotal_cents(), 60000);
    }

    #[test]
    fn test_aggregation_order_insensitive_for_totals() {
        let coke = product("p1", "Coca Cola", 12000);

        let mut forward = Cart::new();
        forward.push_resolved(&coke, 3, "3 Coca Cola").unwrap();
        forward.push_resolved(&coke, 2, "2 Coca Cola").unwrap();

        let mut backward = Cart::new();
        backward.push_resolved(&coke, 2, "2 Coca Cola").unwrap();
        backward.push_resolved(&coke, 3, "3 Coca Cola").unwrap();

        let mut single = Cart::new();
        single.push_resolved(&coke, 5, "5 Coca Cola").unwrap();

        assert_eq!(forward.subtotal_cents(), backward.subtotal_cents());
        assert_eq!(forward.subtotal_cents(), single.subtotal_cents());
        assert_eq!(forward.line_count(), 1);
        assert_eq!(backward.line_count(), 1);
    }

    #[test]
    fn test_unresolved_lines_do_not_merge_and_cost_nothing() {
        let mut cart = Cart::new();
        cart.push_unresolved("banh bo", 2, "2 banh bo").unwrap();
        cart.push_unresolved("banh bo", 1, "banh bo").unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.subtotal_cents(), 0);
        assert!(!cart.has_resolved());
        assert_eq!(cart.unresolved_lines().count(), 2);
    }

    #[test]
    fn test_set_quantity_recomputes_totals() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);
        cart.push_resolved(&coke, 3, "3 Coca Cola").unwrap();
        let id = cart.lines[0].id.clone();

        cart.set_quantity(&id, 7).unwrap();
        assert_eq!(cart.subtotal_cents(), 84000);

        cart.adjust_quantity(&id, -1).unwrap();
        assert_eq!(cart.subtotal_cents(), 72000);
    }

    #[test]
    fn test_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);
        cart.push_resolved(&coke, 2, "2 Coca Cola").unwrap();
        let id = cart.lines[0].id.clone();

        cart.set_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal_cents(), 0);
    }

    #[test]
    fn test_subtotal_matches_line_sum_after_mixed_ops() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);
        let sprite = product("p2", "Sprite", 10000);

        cart.push_resolved(&coke, 3, "3 coca").unwrap();
        cart.push_resolved(&sprite, 1, "sprite").unwrap();
        cart.push_unresolved("banh bo", 4, "4 banh bo").unwrap();
        let coke_id = cart.lines[0].id.clone();
        let sprite_id = cart.lines[1].id.clone();
        cart.adjust_quantity(&sprite_id, 2).unwrap();
        cart.remove_line(&coke_id).unwrap();

        let expected: i64 = cart.lines.iter().map(|l| l.line_total_cents).sum();
        assert_eq!(cart.subtotal_cents(), expected);
        assert_eq!(cart.subtotal_cents(), 30000);
    }

    #[test]
    fn test_resolve_line_upgrades_error_line() {
        let mut cart = Cart::new();
        cart.push_unresolved("banh bo", 2, "2 banh bo").unwrap();
        let id = cart.lines[0].id.clone();

        let added = product("p9", "Bánh Bò", 5000);
        cart.resolve_line(&id, &added).unwrap();

        assert_eq!(cart.line_count(), 1);
        let line = &cart.lines[0];
        assert!(line.resolved);
        assert_eq!(line.display_name, "Bánh Bò");
        assert_eq!(line.line_total_cents, 10000);
        assert_eq!(cart.subtotal_cents(), 10000);
    }

    #[test]
    fn test_resolve_line_merges_into_existing_product_line() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);
        cart.push_resolved(&coke, 3, "3 coca").unwrap();
        cart.push_unresolved("cocaco", 2, "2 cocaco").unwrap();
        let error_id = cart.lines[1].id.clone();

        cart.resolve_line(&error_id, &coke).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.subtotal_cents(), 60000);
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        let coke = product("p1", "Coca Cola", 12000);
        cart.push_resolved(&coke, 900, "900 coca").unwrap();
        let err = cart.push_resolved(&coke, 200, "200 coca");
        assert!(matches!(err, Err(CoreError::QuantityTooLarge { .. })));
        // Failed merge leaves the original line untouched
        assert_eq!(cart.lines[0].quantity, 900);
    }

    #[test]
    fn test_unknown_line_errors() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.set_quantity("nope", 2),
            Err(CoreError::LineNotFound(_))
        ));
        assert!(matches!(
            cart.remove_line("nope"),
            Err(CoreError::LineNotFound(_))
        ));
    }
}
