//! # tally-engine: Order-Entry Orchestration
//!
//! The orchestration layer that wires tally-core's pure pipeline to
//! tally-db's persistence.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        tally-engine (THIS CRATE)                        │
//! │                                                                         │
//! │   ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐  │
//! │   │   OrderSession   │   │  CommitDetails   │   │ SuggestionService│  │
//! │   │   (session.rs)   │   │                  │   │   (suggest.rs)   │  │
//! │   │                  │   │ customer, disc., │   │                  │  │
//! │   │ analyze / edit / │   │ amount paid      │   │ advisory, timed, │  │
//! │   │ quick_add/commit │   │                  │   │ degrades to []   │  │
//! │   └────────┬─────────┘   └──────────────────┘   └──────────────────┘  │
//! │            │                                                            │
//! │     tally-core (parse/resolve/cart)    tally-db (catalog/invoices)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//! use tally_engine::{CommitDetails, OrderSession};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let mut session = OrderSession::open(db, "owner").await?;
//!
//! session.analyze("3 coca\nhao hao x2\nsting dau - 4 cái")?;
//! let invoice = session.commit(CommitDetails::default()).await?;
//! ```

pub mod error;
pub mod session;
pub mod suggest;

pub use error::{EngineError, EngineResult};
pub use session::{CommitDetails, OrderSession};
pub use suggest::{
    suggest_with_timeout, NoSuggestions, SuggestionService, DEFAULT_SUGGEST_TIMEOUT,
};
