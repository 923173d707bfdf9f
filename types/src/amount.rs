//! Currency quantity and valuation types.
//!
//! Amounts are whole currency units stored as u128 — the original schema
//! kept integer balances and all arithmetic here is checked, never
//! floating-point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity of one currency held in a wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtraction that fails (None) rather than wrapping below zero.
    /// The "balance never negative" invariant rests on this.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Value of this quantity at `unit_value` reference units per coin.
    pub fn checked_value(self, unit_value: u128) -> Option<Valuation> {
        self.0.checked_mul(unit_value).map(Valuation)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An aggregate value in the reference currency (USD-equivalent).
///
/// Derived data: a user's stored `Valuation` is always recomputable from
/// their wallets and is only ever written by the reconciler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Valuation(u128);

impl Valuation {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn checked_sub_refuses_overdraw() {
        let a = Amount::new(3);
        assert_eq!(a.checked_sub(Amount::new(5)), None);
        assert_eq!(a.checked_sub(Amount::new(3)), Some(Amount::ZERO));
    }

    #[test]
    fn checked_value_multiplies() {
        // Scenario A numbers: 2 BTC at 50000 each.
        let v = Amount::new(2).checked_value(50_000).unwrap();
        assert_eq!(v, Valuation::new(100_000));
    }

    proptest! {
        /// add then sub of the same amount is the identity (when it fits).
        #[test]
        fn add_sub_roundtrip(base in 0u128..1u128 << 90, delta in 0u128..1u128 << 30) {
            let a = Amount::new(base);
            let d = Amount::new(delta);
            let back = a.checked_add(d).unwrap().checked_sub(d).unwrap();
            prop_assert_eq!(back, a);
        }

        /// valuation is exactly quantity × price whenever it does not overflow.
        #[test]
        fn value_is_exact_product(qty in 0u128..1u128 << 60, price in 0u128..1u128 << 60) {
            let v = Amount::new(qty).checked_value(price).unwrap();
            prop_assert_eq!(v.raw(), qty * price);
        }
    }
}
