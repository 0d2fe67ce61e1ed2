// src/handlers/portfolio.rs
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::models::PortfolioConfig;
use crate::services::analysis::{analyze, AnalysisParams};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AllocationQuery {
    pub stocks_pct: Option<f64>,
    pub intl_stocks_pct: Option<f64>,
    pub intl_bonds_pct: Option<f64>,
}

impl AllocationQuery {
    /// Unset percentages take the default 60/30/20 split.
    pub fn config(&self) -> PortfolioConfig {
        let d = PortfolioConfig::default();
        PortfolioConfig {
            stocks_pct: self.stocks_pct.unwrap_or(d.stocks_pct),
            intl_stocks_pct: self.intl_stocks_pct.unwrap_or(d.intl_stocks_pct),
            intl_bonds_pct: self.intl_bonds_pct.unwrap_or(d.intl_bonds_pct),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PortfolioQuery {
    pub stocks_pct: Option<f64>,
    pub intl_stocks_pct: Option<f64>,
    pub intl_bonds_pct: Option<f64>,
    pub initial: Option<f64>,
    pub years: Option<u32>,
    pub risk_free_rate: Option<f64>,
}

impl PortfolioQuery {
    fn allocation(&self) -> AllocationQuery {
        AllocationQuery {
            stocks_pct: self.stocks_pct,
            intl_stocks_pct: self.intl_stocks_pct,
            intl_bonds_pct: self.intl_bonds_pct,
        }
    }

    fn params(&self, default_risk_free_rate: f64) -> AnalysisParams {
        let d = AnalysisParams::default();
        AnalysisParams {
            as_of: None,
            risk_free_rate: self.risk_free_rate.unwrap_or(default_risk_free_rate),
            initial_value: self.initial.unwrap_or(d.initial_value),
            years: self.years.unwrap_or(d.years),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BandQuery {
    pub stocks_pct: f64,
}

pub async fn get_allocation(query: AllocationQuery) -> Result<Json, Rejection> {
    let weights = query.config().weights().map_err(reject)?;
    Ok(warp::reply::json(&weights))
}

pub async fn get_portfolio(query: PortfolioQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let config = query.allocation().config();
    let params = query.params(state.risk_free_rate);
    // bad input is reported before the store is touched
    params.validate().map_err(reject)?;
    config.validate().map_err(reject)?;
    let table = state.store.load().map_err(reject)?;
    let report = analyze(&table, &config, &params, &state.bands).map_err(reject)?;
    info!(
        "Analyzed {:?} over {} rows of history",
        config,
        table.len()
    );
    Ok(warp::reply::json(&report))
}

pub async fn get_band(query: BandQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let band = state.bands.interpolate(query.stocks_pct).map_err(reject)?;
    Ok(warp::reply::json(&band))
}
