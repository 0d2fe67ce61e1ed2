// src/services/refresh.rs
use chrono::{Duration, NaiveDate};
use log::{error, info};
use serde::Serialize;

use super::price_source::PriceSource;
use super::store::HistoryStore;
use super::update_policy::UpdatePolicy;
use crate::error::AnalyticsResult;
use crate::models::{HistoricalTable, Instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Skipped {
        last_date: Option<NaiveDate>,
    },
    Updated {
        rows_appended: usize,
        /// Prices added to rows that were already stored.
        cells_filled: usize,
        failed: Vec<Instrument>,
    },
}

/// Brings the stored history up to date when the policy says it is due.
///
/// Each fund is fetched from the day after its own last stored price, or in
/// full when it has none. A fund whose fetch fails is reported and skipped;
/// its gaps are filled in on a later refresh.
pub async fn refresh_history(
    store: &HistoryStore,
    source: &dyn PriceSource,
    policy: &UpdatePolicy,
    today: NaiveDate,
    force: bool,
) -> AnalyticsResult<RefreshOutcome> {
    let table = store.load_or_empty();
    let last_date = table.last_date();
    if !policy.should_update(last_date, today, force) {
        info!(
            "Historical data is up to date (last entry: {:?}), skipping refresh",
            last_date
        );
        return Ok(RefreshOutcome::Skipped { last_date });
    }

    let mut fetched = Vec::new();
    let mut failed = Vec::new();
    for instrument in Instrument::ALL {
        let result = match table.last_date_for(instrument) {
            Some(last) => {
                let start = last + Duration::days(1);
                info!("Fetching new data for {} from {}", instrument, start);
                source.fetch_history_since(instrument, start).await
            }
            None => {
                info!("No stored data for {}, fetching max history", instrument);
                source.fetch_max_history(instrument).await
            }
        };
        match result {
            Ok(series) => fetched.push(series),
            Err(e) => {
                error!("Failed to fetch {}: {}", instrument, e);
                failed.push(instrument);
            }
        }
    }

    let summary = store.append(&HistoricalTable::from_series(&fetched))?;
    info!(
        "Refresh finished: {} rows appended, {} prices filled, {} funds failed",
        summary.rows_appended,
        summary.cells_filled,
        failed.len()
    );
    Ok(RefreshOutcome::Updated {
        rows_appended: summary.rows_appended,
        cells_filled: summary.cells_filled,
        failed,
    })
}
