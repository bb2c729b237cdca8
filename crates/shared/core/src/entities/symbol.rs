use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::QUOTE_ASSET;

/// Base-asset markers of leveraged tokens (BTCUP, ETHBULL...)
const LEVERAGED_MARKERS: [&str; 4] = ["UP", "DOWN", "BULL", "BEAR"];

/// Canonical instrument identifier: upper-case, quote-suffixed (`BTCUSDT`)
///
/// This is the only spelling that crosses the adapter boundary. Native
/// spellings (`BTC-USDT-SWAP`, `BTC_USDT`) live inside the adapters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    /// Create a symbol from any casing of its canonical spelling
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().trim().to_ascii_uppercase())
    }

    /// Build the USDT-quoted symbol for a base asset
    pub fn from_base(base: impl AsRef<str>) -> Self {
        Self(format!("{}{}", base.as_ref().trim().to_ascii_uppercase(), QUOTE_ASSET))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset (`BTC` for `BTCUSDT`)
    pub fn base(&self) -> &str {
        self.0.strip_suffix(QUOTE_ASSET).unwrap_or(&self.0)
    }

    pub fn is_usdt_quoted(&self) -> bool {
        self.0.len() > QUOTE_ASSET.len() && self.0.ends_with(QUOTE_ASSET)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// True when a base asset looks like a leveraged token.
///
/// Substring match, so a handful of genuine assets whose ticker contains one
/// of the markers are excluded as well.
pub fn is_leveraged_base(base: &str) -> bool {
    let upper = base.to_ascii_uppercase();
    LEVERAGED_MARKERS.iter().any(|m| upper.contains(m))
}

/// Parse a comma-separated list of coins (`"btc, eth,SOLUSDT"`) into symbols.
///
/// Bare base assets get the quote suffix, blanks are skipped and duplicates
/// keep their first position.
pub fn parse_symbol_list(input: &str) -> Vec<SymbolId> {
    let mut out: Vec<SymbolId> = Vec::new();
    for entry in input.split(',') {
        let entry = entry.trim().to_ascii_uppercase();
        if entry.is_empty() {
            continue;
        }
        let symbol = if entry.ends_with(QUOTE_ASSET) {
            SymbolId::new(&entry)
        } else {
            SymbolId::from_base(&entry)
        };
        if !symbol.is_usdt_quoted() || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }
    out
}
