use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Market segment on a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[default]
    Spot,
    /// USDT-margined perpetual swaps
    #[serde(alias = "futures")]
    Derivatives,
}

impl Market {
    pub fn is_derivatives(&self) -> bool {
        matches!(self, Market::Derivatives)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Derivatives => "derivatives",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Market::Spot),
            "derivatives" | "futures" | "perp" | "perpetual" => Ok(Market::Derivatives),
            other => Err(ParseError::UnknownMarket(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_futures_alias() {
        assert_eq!("futures".parse::<Market>().unwrap(), Market::Derivatives);
        let m: Market = serde_json::from_str("\"futures\"").unwrap();
        assert_eq!(m, Market::Derivatives);
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"derivatives\"");
    }

    #[test]
    fn test_default_is_spot() {
        assert_eq!(Market::default(), Market::Spot);
        assert!(!Market::Spot.is_derivatives());
    }
}
