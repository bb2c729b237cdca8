use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funding and open-interest reading for a perpetual
///
/// `open_interest_prev_estimate` is an approximation derived from the current
/// open interest, not an exchange-reported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FundingSnapshot {
    pub funding_rate: Decimal,
    pub open_interest: Decimal,
    pub open_interest_prev_estimate: Decimal,
}

impl FundingSnapshot {
    /// Snapshot for spot instruments and for failed funding fetches
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a snapshot, estimating prior OI with the venue's discount factor
    pub fn with_discount(funding_rate: Decimal, open_interest: Decimal, discount: Decimal) -> Self {
        Self {
            funding_rate,
            open_interest,
            open_interest_prev_estimate: open_interest * discount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.funding_rate.is_zero() && self.open_interest.is_zero()
    }

    /// Percentage change from the estimated prior OI, zero when undefined
    pub fn open_interest_change_pct(&self) -> Decimal {
        if self.open_interest.is_zero() || self.open_interest_prev_estimate.is_zero() {
            return Decimal::ZERO;
        }
        ((self.open_interest - self.open_interest_prev_estimate) / self.open_interest_prev_estimate
            * Decimal::ONE_HUNDRED)
            .round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_snapshot() {
        let z = FundingSnapshot::zero();
        assert!(z.is_zero());
        assert_eq!(z.open_interest_change_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_discounted_estimate() {
        let s = FundingSnapshot::with_discount(dec!(0.0001), dec!(1000), dec!(0.95));
        assert_eq!(s.open_interest_prev_estimate, dec!(950));
        // (1000 - 950) / 950 = 5.263%
        assert_eq!(s.open_interest_change_pct(), dec!(5.26));
    }
}
