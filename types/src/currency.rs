//! Currency name newtype.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of a currency, e.g. "Bitcoin".
///
/// Names are case-sensitive and compared byte-for-byte; whether a name is
/// actually priced is the catalog's business, not this type's.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyType(String);

impl CurrencyType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
