//! In-memory store used by tests and local tooling.

pub mod store;

pub use store::MemoryStore;
