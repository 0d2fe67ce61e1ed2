// src/bin/init_history.rs
use anyhow::Result;
use dotenv::dotenv;
use log::info;

use four_fund_planner::config::AppConfig;
use four_fund_planner::services::refresh::refresh_history;
use four_fund_planner::services::store::HistoryStore;
use four_fund_planner::services::update_policy::{market_today, UpdatePolicy};
use four_fund_planner::services::yahoo::YahooClient;

/// Downloads the full history of every fund when no usable store exists.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    let store = HistoryStore::new(config.history_path());

    if let Ok(table) = store.load() {
        if !table.is_empty() {
            info!(
                "{} already holds {} rows (last entry: {:?}); run refresh_history instead",
                store.path().display(),
                table.len(),
                table.last_date()
            );
            return Ok(());
        }
    }

    let source = YahooClient::new(config.cache_ttl())?;
    let policy = UpdatePolicy::new(config.staleness_days);
    let outcome = refresh_history(&store, &source, &policy, market_today(), true).await?;
    info!("Initial download finished: {:?}", outcome);
    Ok(())
}
