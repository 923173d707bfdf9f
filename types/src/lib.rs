//! Fundamental types for the Custodia ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: identifiers, amounts, currency names, transaction enums, and
//! timestamps.

pub mod amount;
pub mod currency;
pub mod id;
pub mod time;
pub mod transaction;

pub use amount::{Amount, Valuation};
pub use currency::CurrencyType;
pub use id::{TransactionId, TransferId, UserId, WalletId};
pub use time::Timestamp;
pub use transaction::{TransactionStatus, TransactionType};
