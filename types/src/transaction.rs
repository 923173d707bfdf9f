//! Transaction kind and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a ledger row records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// A credit of a single wallet with no counterparty.
    Deposit,
    /// The debit half of a transfer, owned by the sender.
    Send,
    /// The credit half of a transfer, owned by the recipient.
    Receive,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deposit => "Deposit",
            Self::Send => "Send",
            Self::Receive => "Receive",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of a transaction row.
///
/// A row only moves Pending → Completed or Pending → Failed, and in this
/// system every row is written `Completed` inside the same batch as its
/// balance change, so a stored status never changes at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Recorded but the underlying wallet mutation has not committed.
    Pending,
    /// The wallet mutation committed; the row is immutable from here on.
    Completed,
    /// The operation was abandoned; the row is immutable from here on.
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_the_frontend() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Receive).unwrap(),
            "\"Receive\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Completed).unwrap(),
            "\"Completed\""
        );
    }
}
