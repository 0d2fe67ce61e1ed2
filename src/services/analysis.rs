// src/services/analysis.rs
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use super::bands::BandTable;
use super::calculations::{
    cumulative_returns, instrument_returns, performance_table, portfolio_daily_returns,
};
use super::projection::{project, MAX_PROJECTION_YEARS};
use super::risk::{annualized_mean_return, risk_metrics};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AllocationWeights, HistoricalTable, InterpolationBand, PerformanceTable, PortfolioConfig,
    ProjectionPoint, ReturnSeries, RiskMetrics,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Defaults to the last date in the table.
    pub as_of: Option<NaiveDate>,
    pub risk_free_rate: f64,
    pub initial_value: f64,
    pub years: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            as_of: None,
            risk_free_rate: 0.0,
            initial_value: 1000.0,
            years: 10,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(AnalyticsError::validation(format!(
                "risk-free rate must be a finite number, got {}",
                self.risk_free_rate
            )));
        }
        if !self.initial_value.is_finite() || self.initial_value < 0.0 {
            return Err(AnalyticsError::validation(format!(
                "initial value must be a non-negative amount, got {}",
                self.initial_value
            )));
        }
        if self.years > MAX_PROJECTION_YEARS {
            return Err(AnalyticsError::validation(format!(
                "years must be at most {}, got {}",
                MAX_PROJECTION_YEARS, self.years
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioReport {
    pub config: PortfolioConfig,
    pub weights: AllocationWeights,
    pub performance: Option<PerformanceTable>,
    pub cumulative: ReturnSeries,
    pub risk: Option<RiskMetrics>,
    pub annualized_return: Option<f64>,
    pub projection: Option<Vec<ProjectionPoint>>,
    pub band: InterpolationBand,
}

/// Keeps `InsufficientData` as "unavailable", passes every other error on.
fn unavailable_if_short<T>(result: AnalyticsResult<T>) -> AnalyticsResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ AnalyticsError::InsufficientData { .. }) => {
            warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Runs every calculation for one allocation against the stored history.
pub fn analyze(
    table: &HistoricalTable,
    config: &PortfolioConfig,
    params: &AnalysisParams,
    bands: &BandTable,
) -> AnalyticsResult<PortfolioReport> {
    params.validate()?;
    let weights = config.weights()?;
    let band = bands.interpolate(config.stocks_pct)?;

    let portfolio = portfolio_daily_returns(&instrument_returns(table), &weights);
    let performance = params
        .as_of
        .or_else(|| table.last_date())
        .map(|as_of| performance_table(table, &portfolio, as_of));

    let risk = unavailable_if_short(risk_metrics(&portfolio, params.risk_free_rate))?;
    let annualized_return = unavailable_if_short(annualized_mean_return(&portfolio))?;
    let projection = match annualized_return {
        Some(r) => Some(project(params.initial_value, r, params.years)?),
        None => None,
    };

    Ok(PortfolioReport {
        config: *config,
        weights,
        performance,
        cumulative: cumulative_returns(&portfolio),
        risk,
        annualized_return,
        projection,
        band,
    })
}
