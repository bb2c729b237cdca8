use vrsi_core::{Market, QUOTE_ASSET, SymbolId};

/// Translation between canonical symbols and one venue spelling
///
/// A native symbol is `BASE{separator}USDT{suffix}`. Because the quote asset
/// is fixed the mapping is a bijection over every symbol the venue reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolCodec {
    separator: &'static str,
    suffix: &'static str,
}

impl SymbolCodec {
    pub const fn new(separator: &'static str, suffix: &'static str) -> Self {
        Self { separator, suffix }
    }

    /// Same spelling as the canonical form (`BTCUSDT`)
    pub const fn plain() -> Self {
        Self::new("", "")
    }

    pub fn to_native(&self, symbol: &SymbolId) -> String {
        format!(
            "{}{}{}{}",
            symbol.base(),
            self.separator,
            QUOTE_ASSET,
            self.suffix
        )
    }

    /// `None` for anything not quoted in USDT with this venue's spelling
    pub fn to_canonical(&self, native: &str) -> Option<SymbolId> {
        let native = native.trim().to_ascii_uppercase();
        let base = native
            .strip_suffix(self.suffix)?
            .strip_suffix(QUOTE_ASSET)?
            .strip_suffix(self.separator)?;
        if base.is_empty() || (!self.separator.is_empty() && base.contains(self.separator)) {
            return None;
        }
        Some(SymbolId::from_base(base))
    }
}

/// Codecs for both markets of a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketCodecs {
    pub spot: SymbolCodec,
    pub derivatives: SymbolCodec,
}

impl MarketCodecs {
    pub const fn new(spot: SymbolCodec, derivatives: SymbolCodec) -> Self {
        Self { spot, derivatives }
    }

    pub fn for_market(&self, market: Market) -> &SymbolCodec {
        match market {
            Market::Spot => &self.spot,
            Market::Derivatives => &self.derivatives,
        }
    }
}
