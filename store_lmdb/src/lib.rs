//! LMDB storage backend for the Custodia ledger.
//!
//! Implements the `custodia-store` traits using the `heed` LMDB bindings.
//! Each logical store maps to one or more LMDB databases within a single
//! environment; all values are `bincode`-serialized records and ordered
//! indexes use big-endian composite keys so range scans come back sorted.

pub mod environment;
pub mod error;
pub mod keys;
pub mod transaction;
pub mod user;
pub mod wallet;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use write_batch::LmdbWriteBatch;
