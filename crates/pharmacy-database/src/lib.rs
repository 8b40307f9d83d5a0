//! # pharmacy-database
//!
//! Storage seams of the back-office: the store traits consumed by the
//! service layer, their PostgreSQL implementations, and an in-memory
//! implementation (feature `memory`) used by tests and local tooling.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use connection::DatabasePool;
