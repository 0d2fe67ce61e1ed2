// src/handlers/history.rs
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::models::Instrument;
use crate::services::update_policy::market_today;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryStatus {
    pub rows: usize,
    pub last_date: Option<NaiveDate>,
    pub last_dates: BTreeMap<Instrument, Option<NaiveDate>>,
    pub first_dates: BTreeMap<Instrument, Option<NaiveDate>>,
    pub update_due: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub force: bool,
}

pub async fn get_history_status(state: Arc<AppState>) -> Result<Json, Rejection> {
    let table = state.store.load().map_err(reject)?;
    let last_date = table.last_date();
    let status = HistoryStatus {
        rows: table.len(),
        last_date,
        last_dates: Instrument::ALL
            .iter()
            .map(|&i| (i, table.last_date_for(i)))
            .collect(),
        first_dates: Instrument::ALL
            .iter()
            .map(|&i| (i, table.first_date_for(i)))
            .collect(),
        update_due: state.policy.should_update(last_date, market_today(), false),
    };
    Ok(warp::reply::json(&status))
}

pub async fn post_history_refresh(
    query: RefreshQuery,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    info!("Refresh requested (force: {})", query.force);
    let outcome = state
        .refresh(market_today(), query.force)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&outcome))
}
