use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional call derived from the normalized signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Long,
    Short,
    #[default]
    Neutral,
}

impl Decision {
    pub fn is_long(&self) -> bool {
        matches!(self, Decision::Long)
    }

    pub fn is_short(&self) -> bool {
        matches!(self, Decision::Short)
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Decision::Neutral)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Long => "LONG",
            Decision::Short => "SHORT",
            Decision::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
