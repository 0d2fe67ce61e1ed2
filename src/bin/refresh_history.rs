// src/bin/refresh_history.rs
use anyhow::Result;
use dotenv::dotenv;
use log::info;
use std::env;

use four_fund_planner::config::AppConfig;
use four_fund_planner::services::refresh::refresh_history;
use four_fund_planner::services::store::HistoryStore;
use four_fund_planner::services::update_policy::{market_today, UpdatePolicy};
use four_fund_planner::services::yahoo::YahooClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let force = env::args().skip(1).any(|arg| arg == "--force");
    let config = AppConfig::from_env()?;
    let store = HistoryStore::new(config.history_path());
    let source = YahooClient::new(config.cache_ttl())?;
    let policy = UpdatePolicy::new(config.staleness_days);

    info!("Refreshing {} (force: {})", store.path().display(), force);
    let outcome = refresh_history(&store, &source, &policy, market_today(), force).await?;
    info!("Refresh finished: {:?}", outcome);
    Ok(())
}
