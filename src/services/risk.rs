// src/services/risk.rs
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{ReturnSeries, RiskMetrics};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

fn defined_returns(returns: &ReturnSeries, metric: &'static str) -> AnalyticsResult<Vec<f64>> {
    let values = returns.defined_values();
    if values.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            metric,
            required: 2,
            actual: values.len(),
        });
    }
    Ok(values)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; exactly zero for a constant series.
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Mean daily return scaled to a year.
pub fn annualized_mean_return(returns: &ReturnSeries) -> AnalyticsResult<f64> {
    let values = defined_returns(returns, "annualized return")?;
    Ok(mean(&values) * TRADING_DAYS_PER_YEAR)
}

/// Annualized volatility of the defined daily returns.
pub fn volatility(returns: &ReturnSeries) -> AnalyticsResult<f64> {
    let values = defined_returns(returns, "volatility")?;
    Ok(sample_std_dev(&values) * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized Sharpe ratio, `None` when volatility is zero.
pub fn sharpe_ratio(returns: &ReturnSeries, risk_free_rate: f64) -> AnalyticsResult<Option<f64>> {
    if !risk_free_rate.is_finite() {
        return Err(AnalyticsError::validation(format!(
            "risk-free rate must be a finite number, got {}",
            risk_free_rate
        )));
    }
    let values = defined_returns(returns, "sharpe ratio")?;
    let annual_vol = sample_std_dev(&values) * TRADING_DAYS_PER_YEAR.sqrt();
    if annual_vol == 0.0 {
        return Ok(None);
    }
    let annual_return = mean(&values) * TRADING_DAYS_PER_YEAR;
    Ok(Some((annual_return - risk_free_rate) / annual_vol))
}

pub fn risk_metrics(returns: &ReturnSeries, risk_free_rate: f64) -> AnalyticsResult<RiskMetrics> {
    Ok(RiskMetrics {
        volatility: volatility(returns)?,
        sharpe_ratio: sharpe_ratio(returns, risk_free_rate)?,
    })
}
