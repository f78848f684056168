//! Symbol lists and display names.
//!
//! Parses symbol lists from configuration or the command line, and maps
//! symbols to the display names shown next to each result.

use std::collections::{BTreeMap, HashSet};

use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolListError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma-separated list into trimmed, uppercase, unique symbols.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(SymbolListError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Known symbols and their display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCatalog {
    names: BTreeMap<String, String>,
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::from_pairs([
            ("NHY", "Norsk Hydro"),
            ("EQNR", "Equinor"),
            ("AKER", "Aker ASA"),
        ])
    }
}

impl SymbolCatalog {
    pub fn from_pairs<I, S, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: AsRef<str>,
        N: Into<String>,
    {
        let names = pairs
            .into_iter()
            .map(|(s, n)| (s.as_ref().trim().to_uppercase(), n.into()))
            .filter(|(s, _)| !s.is_empty())
            .collect();
        Self { names }
    }

    /// Catalog from the `[symbols]` section, or the built-in one when the
    /// section is absent or empty.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let entries = config.get_section("symbols");
        if entries.is_empty() {
            Self::default()
        } else {
            Self::from_pairs(entries)
        }
    }

    /// Display name for `symbol`, falling back to the uppercase symbol.
    pub fn display_name(&self, symbol: &str) -> String {
        let key = symbol.trim().to_uppercase();
        self.names.get(&key).cloned().unwrap_or(key)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.names.contains_key(&symbol.trim().to_uppercase())
    }

    /// `(symbol, name)` pairs sorted by symbol.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(s, n)| (s.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
