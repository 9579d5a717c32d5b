//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of Tally. It turns an operator's freeform,
//! typo-prone, diacritic-bearing order text into priced, quantified cart
//! lines against a product catalog, as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  Operator types: "3 áo sơ mi\nCoca Cola x5\n2 cái Sprite"              │
//! │       │                                                                 │
//! │  ┌────▼────────────────────────────────────────────────────────────┐   │
//! │  │                ★ tally-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ normalize │─►│   parse   │─►│  resolve  │─►│   cart    │  │   │
//! │  │   │ fold text │  │ qty+name  │  │ exact +   │  │ merge +   │  │   │
//! │  │   │           │  │ cascade   │  │ fuzzy     │  │ subtotal  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └────┬────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │  ┌────▼────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │         SQLite catalog + atomic invoice commit                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`normalize`] - Case/diacritic/punctuation folding (total function)
//! - [`parse`] - Order-line quantity extraction (total function)
//! - [`resolve`] - Exact + fuzzy catalog matching
//! - [`cart`] - Cart aggregation and totals
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, Invoice, etc.)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Total text functions**: normalization and parsing never fail - bad
//!    input degrades to a sensible default (quantity 1, unresolved line)
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are minor units (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod normalize;
pub mod parse;
pub mod resolve;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use cart::{Cart, CartLine};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use parse::ParsedLine;
pub use resolve::{resolve_fragment, DEFAULT_FUZZY_THRESHOLD};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in the cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_LINE_QUANTITY: i64 = 999;
