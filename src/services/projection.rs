// src/services/projection.rs
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::ProjectionPoint;

pub const MAX_PROJECTION_YEARS: u32 = 100;

/// Compounds `initial_value` at a fixed annual return for years `1..=years`.
pub fn project(
    initial_value: f64,
    annualized_return: f64,
    years: u32,
) -> AnalyticsResult<Vec<ProjectionPoint>> {
    if !initial_value.is_finite() || initial_value < 0.0 {
        return Err(AnalyticsError::validation(format!(
            "initial value must be a non-negative amount, got {}",
            initial_value
        )));
    }
    if !annualized_return.is_finite() {
        return Err(AnalyticsError::validation(format!(
            "annualized return must be finite, got {}",
            annualized_return
        )));
    }

    let last = i32::try_from(years)
        .ok()
        .filter(|_| years <= MAX_PROJECTION_YEARS)
        .ok_or_else(|| {
            AnalyticsError::validation(format!(
                "years must be at most {}, got {}",
                MAX_PROJECTION_YEARS, years
            ))
        })?;

    Ok((1..=last)
        .map(|exponent| ProjectionPoint {
            year: exponent.unsigned_abs(),
            value: initial_value * (1.0 + annualized_return).powi(exponent),
        })
        .collect())
}
