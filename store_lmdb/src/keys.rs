//! Key encodings.
//!
//! Primary records are keyed by their id as 8 big-endian bytes. Ordered
//! indexes use fixed-width composite keys so that a plain lexicographic
//! range scan returns rows in the order the API promises:
//!
//! - `user_wallets`: `user_id ++ wallet_id` — ascending wallet id, which
//!   is creation order.
//! - `user_txs`: `user_id ++ !timestamp ++ !transaction_id` — most recent
//!   first, newest id first within a second.

use custodia_types::{TransactionId, Timestamp, UserId, WalletId};
use std::ops::Bound;

pub(crate) fn user_key(user_id: UserId) -> [u8; 8] {
    user_id.raw().to_be_bytes()
}

pub(crate) fn wallet_key(wallet_id: WalletId) -> [u8; 8] {
    wallet_id.raw().to_be_bytes()
}

pub(crate) fn transaction_key(id: TransactionId) -> [u8; 8] {
    id.raw().to_be_bytes()
}

/// `user_wallets` index entry: `user_id ++ wallet_id`.
pub(crate) fn user_wallet_key(user_id: UserId, wallet_id: WalletId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&user_id.raw().to_be_bytes());
    key[8..].copy_from_slice(&wallet_id.raw().to_be_bytes());
    key
}

/// `user_txs` index entry: `user_id ++ !timestamp ++ !transaction_id`.
/// Complemented fields make the ascending scan yield newest-first.
pub(crate) fn user_tx_key(user_id: UserId, ts: Timestamp, id: TransactionId) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&user_id.raw().to_be_bytes());
    key[8..16].copy_from_slice(&(u64::MAX - ts.as_secs()).to_be_bytes());
    key[16..].copy_from_slice(&(u64::MAX - id.raw()).to_be_bytes());
    key
}

/// Range bounds covering every index entry with the given user prefix.
pub(crate) fn user_prefix_bounds(user_id: UserId) -> (Bound<[u8; 8]>, Bound<[u8; 8]>) {
    let lower = user_id.raw().to_be_bytes();
    match user_id.raw().checked_add(1) {
        Some(next) => (Bound::Included(lower), Bound::Excluded(next.to_be_bytes())),
        None => (Bound::Included(lower), Bound::Unbounded),
    }
}
