//! Identifier newtypes.
//!
//! All identifiers are sequential u64 values allocated by the storage
//! backend. Newtypes keep a user id from ever being passed where a wallet
//! id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type! {
    /// Owner of wallets. Created by the external registration collaborator.
    UserId
}

id_type! {
    /// A single-currency balance owned by one user.
    WalletId
}

id_type! {
    /// One row in the append-only transaction ledger.
    TransactionId
}

id_type! {
    /// Links the Send and Receive rows produced by a single transfer.
    TransferId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_plain_number() {
        assert_eq!(UserId::new(7).to_string(), "7");
        assert_eq!(WalletId::new(42).to_string(), "42");
    }

    #[test]
    fn serde_is_transparent() {
        let id = TransactionId::new(99);
        assert_eq!(serde_json::to_string(&id).unwrap(), "99");
        let back: TransactionId = serde_json::from_str("99").unwrap();
        assert_eq!(back, id);
    }
}
