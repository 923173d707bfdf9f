//! Nullable infrastructure — in-memory substitutes for production
//! dependencies, used by tests that don't want an LMDB directory.

pub mod store;

pub use store::MemoryStore;
