//! Currency catalog — the static mapping from currency name to display
//! symbol and reference unit value.
//!
//! The original application buried this table inside its wallet-creation
//! script; here it is explicit configuration, injected into the ledger so
//! nothing else hard-codes prices. Unit values are static reference prices,
//! not live market data.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use custodia_types::CurrencyType;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One priced entry in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CurrencyInfo {
    /// Display symbol, e.g. "₿". Empty for unknown currencies.
    pub symbol: String,
    /// Reference units per coin.
    pub unit_value: u128,
}

impl CurrencyInfo {
    /// The placeholder entry served for currencies the catalog does not
    /// know. Deliberately permissive: an unknown name prices at zero
    /// instead of failing wallet creation.
    pub fn unknown() -> Self {
        Self {
            symbol: String::new(),
            unit_value: 0,
        }
    }
}

/// The catalog itself. Cheap to clone at startup, immutable afterwards.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCatalog {
    entries: HashMap<String, CurrencyInfo>,
}

impl CurrencyCatalog {
    /// The built-in demo table.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "Bitcoin".to_string(),
            CurrencyInfo {
                symbol: "₿".to_string(),
                unit_value: 50_000,
            },
        );
        entries.insert(
            "Ethereum".to_string(),
            CurrencyInfo {
                symbol: "Ξ".to_string(),
                unit_value: 3_000,
            },
        );
        entries.insert(
            "Litecoin".to_string(),
            CurrencyInfo {
                symbol: "Ł".to_string(),
                unit_value: 150,
            },
        );
        Self { entries }
    }

    /// Load a catalog from TOML:
    ///
    /// ```toml
    /// [Bitcoin]
    /// symbol = "₿"
    /// unit_value = 50000
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(s)?)
    }

    /// Look up a currency. Unknown names get the empty-symbol, zero-value
    /// placeholder rather than an error.
    pub fn lookup(&self, currency: &CurrencyType) -> CurrencyInfo {
        self.entries
            .get(currency.as_str())
            .cloned()
            .unwrap_or_else(CurrencyInfo::unknown)
    }

    pub fn is_known(&self, currency: &CurrencyType) -> bool {
        self.entries.contains_key(currency.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_prices_match_the_reference_table() {
        let catalog = CurrencyCatalog::builtin();
        let btc = catalog.lookup(&CurrencyType::from("Bitcoin"));
        assert_eq!(btc.symbol, "₿");
        assert_eq!(btc.unit_value, 50_000);

        let eth = catalog.lookup(&CurrencyType::from("Ethereum"));
        assert_eq!(eth.symbol, "Ξ");
        assert_eq!(eth.unit_value, 3_000);

        let ltc = catalog.lookup(&CurrencyType::from("Litecoin"));
        assert_eq!(ltc.symbol, "Ł");
        assert_eq!(ltc.unit_value, 150);
    }

    #[test]
    fn unknown_currency_is_permissive() {
        let catalog = CurrencyCatalog::builtin();
        let info = catalog.lookup(&CurrencyType::from("Dogecoin"));
        assert_eq!(info, CurrencyInfo::unknown());
        assert!(!catalog.is_known(&CurrencyType::from("Dogecoin")));
    }

    #[test]
    fn loads_from_toml() {
        let toml = r#"
            [Bitcoin]
            symbol = "₿"
            unit_value = 62000

            [Monero]
            symbol = "ɱ"
            unit_value = 170
        "#;
        let catalog = CurrencyCatalog::from_toml_str(toml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.lookup(&CurrencyType::from("Bitcoin")).unit_value,
            62_000
        );
        assert_eq!(catalog.lookup(&CurrencyType::from("Monero")).symbol, "ɱ");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(CurrencyCatalog::from_toml_str("[Bitcoin]\nsymbol = 3").is_err());
    }
}
