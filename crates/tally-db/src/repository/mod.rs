//! # Repository Modules
//!
//! Each repository owns the SQL for one aggregate:
//!
//! - [`catalog`] - product catalog reads/writes (the resolver's data source)
//! - [`invoice`] - invoice persistence including the atomic commit

pub mod catalog;
pub mod invoice;
