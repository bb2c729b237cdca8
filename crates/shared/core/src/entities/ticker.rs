use serde::{Deserialize, Serialize};

use super::SymbolId;
use crate::values::Price;

/// Latest traded price for a symbol; replaces any earlier price wholesale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerUpdate {
    pub symbol: SymbolId,
    pub price: Price,
}

impl TickerUpdate {
    pub fn new(symbol: impl Into<SymbolId>, price: Price) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}
