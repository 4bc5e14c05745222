//! Normalized ticker symbols.
//!
//! Symbols are normalized once at the boundary (uppercase, trimmed) so every
//! downstream comparison, map key, and duplicate check can use plain
//! equality instead of re-normalizing defensively at every call site.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized equity ticker symbol: uppercase, trimmed, non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

/// Raised when a candidate symbol string fails normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("symbol is empty after trimming")]
    Empty,
}

impl Symbol {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, SymbolError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SymbolError::Empty);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = SymbolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Checks a slice of symbols for duplicates after normalization, as
/// required of strategy allocations and consolidated portfolios.
pub fn first_duplicate(symbols: &[Symbol]) -> Option<&Symbol> {
    for (i, s) in symbols.iter().enumerate() {
        if symbols[..i].contains(s) {
            return Some(s);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(Symbol::parse("  aapl ").unwrap().as_str(), "AAPL");
    }

    #[test]
    fn rejects_empty_symbol() {
        assert_eq!(Symbol::parse("   ").unwrap_err(), SymbolError::Empty);
    }

    #[test]
    fn detects_duplicate_after_normalization() {
        let symbols = vec![Symbol::parse("AAPL").unwrap(), Symbol::parse("aapl").unwrap()];
        assert_eq!(first_duplicate(&symbols).unwrap().as_str(), "AAPL");
    }

    #[test]
    fn no_duplicate_for_distinct_symbols() {
        let symbols = vec![Symbol::parse("AAPL").unwrap(), Symbol::parse("MSFT").unwrap()];
        assert!(first_duplicate(&symbols).is_none());
    }
}
