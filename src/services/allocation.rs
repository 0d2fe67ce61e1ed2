// src/services/allocation.rs
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{AllocationWeights, PortfolioConfig};

const SUM_TOLERANCE: f64 = 1e-9;

fn check_pct(name: &str, value: f64) -> AnalyticsResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(AnalyticsError::validation(format!(
            "{} must be within [0, 100], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Splits the three slider percentages into the four fund weights.
///
/// Bonds take whatever stocks leave; each side is then split between the
/// US and international fund.
pub fn decompose(
    stocks_pct: f64,
    intl_stocks_pct: f64,
    intl_bonds_pct: f64,
) -> AnalyticsResult<AllocationWeights> {
    check_pct("stocks_pct", stocks_pct)?;
    check_pct("intl_stocks_pct", intl_stocks_pct)?;
    check_pct("intl_bonds_pct", intl_bonds_pct)?;

    let bonds_pct = 100.0 - stocks_pct;
    let weights = AllocationWeights {
        us_stocks: stocks_pct * (100.0 - intl_stocks_pct) / 10000.0,
        intl_stocks: stocks_pct * intl_stocks_pct / 10000.0,
        us_bonds: bonds_pct * (100.0 - intl_bonds_pct) / 10000.0,
        intl_bonds: bonds_pct * intl_bonds_pct / 10000.0,
    };

    let total = weights.sum();
    if (total - 1.0).abs() > SUM_TOLERANCE {
        return Err(AnalyticsError::invariant(format!(
            "allocation weights sum to {} for ({}, {}, {})",
            total, stocks_pct, intl_stocks_pct, intl_bonds_pct
        )));
    }
    Ok(weights)
}

impl PortfolioConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        check_pct("stocks_pct", self.stocks_pct)?;
        check_pct("intl_stocks_pct", self.intl_stocks_pct)?;
        check_pct("intl_bonds_pct", self.intl_bonds_pct)
    }

    pub fn weights(&self) -> AnalyticsResult<AllocationWeights> {
        decompose(self.stocks_pct, self.intl_stocks_pct, self.intl_bonds_pct)
    }
}
