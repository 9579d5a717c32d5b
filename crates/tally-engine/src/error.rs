//! # Engine Error Types
//!
//! Errors surfaced by the order-entry session. Core and database errors
//! pass through wrapped; the commit path adds the one engine-specific rule
//! (a commit needs at least one resolved line).

use thiserror::Error;

use tally_core::CoreError;
use tally_db::DbError;

/// Order-entry session errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cart has no resolved lines; there is nothing to commit.
    ///
    /// Error lines alone never produce an invoice - they carry price 0 and
    /// exist only so the operator can quick-add the missing products.
    #[error("Nothing to commit: cart has no resolved lines")]
    EmptyCommit,

    /// Business rule violation from the pure layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database failure. Commit failures in particular are retryable:
    /// the transaction rolled back and the cart is untouched.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Suggestion provider failure (transport, decode, provider-side).
    ///
    /// Callers going through [`crate::suggest::suggest_with_timeout`] never
    /// see this; it degrades to an empty suggestion list instead.
    #[error("Suggestion provider failed: {0}")]
    Suggestion(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
