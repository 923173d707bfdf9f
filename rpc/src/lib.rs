//! HTTP API server for the Custodia ledger.
//!
//! Provides endpoints for:
//! - Wallet creation and priced wallet listings
//! - Deposits and transfers between users
//! - Transaction history with cursor pagination
//! - Explicit balance reconciliation
//!
//! Every response uses the same JSON envelope: `status` is `"success"`
//! or `"error"`, an optional `message`, and the payload flattened in.
//! Failures are reported in the envelope, not via HTTP status codes.

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer};
