// src/state.rs
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::AnalyticsResult;
use crate::services::bands::BandTable;
use crate::services::price_source::PriceSource;
use crate::services::refresh::{refresh_history, RefreshOutcome};
use crate::services::saved_config::SavedConfigStore;
use crate::services::store::HistoryStore;
use crate::services::update_policy::UpdatePolicy;

/// Everything the server shares between requests and the refresh job.
pub struct AppState {
    pub store: HistoryStore,
    pub configs: SavedConfigStore,
    pub source: Arc<dyn PriceSource>,
    pub policy: UpdatePolicy,
    pub bands: BandTable,
    pub risk_free_rate: f64,
    // the store has a single writer
    refresh_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: &AppConfig, source: Arc<dyn PriceSource>) -> Self {
        AppState {
            store: HistoryStore::new(config.history_path()),
            configs: SavedConfigStore::new(config.configs_dir()),
            source,
            policy: UpdatePolicy::new(config.staleness_days),
            bands: BandTable::historical(),
            risk_free_rate: config.risk_free_rate,
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn refresh(&self, today: NaiveDate, force: bool) -> AnalyticsResult<RefreshOutcome> {
        let _guard = self.refresh_lock.lock().await;
        refresh_history(&self.store, self.source.as_ref(), &self.policy, today, force).await
    }
}
