use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use warp::Filter;

use four_fund_planner::config::AppConfig;
use four_fund_planner::routes;
use four_fund_planner::services::update_policy::market_today;
use four_fund_planner::services::yahoo::YahooClient;
use four_fund_planner::state::AppState;

/// Registers the non-forced refresh on the configured cron schedule.
async fn start_refresh_job(state: Arc<AppState>, schedule: &str) -> Result<JobScheduler> {
    let sched = JobScheduler::new()
        .await
        .context("failed to create job scheduler")?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            info!("Scheduled refresh of historical data starting");
            match state.refresh(market_today(), false).await {
                Ok(outcome) => info!("Scheduled refresh finished: {:?}", outcome),
                Err(e) => error!("Scheduled refresh failed: {}", e),
            }
        })
    })
    .with_context(|| format!("invalid refresh schedule '{}'", schedule))?;

    sched.add(job).await.context("failed to add refresh job")?;
    sched.start().await.context("failed to start job scheduler")?;
    info!("Refresh job scheduled: {}", schedule);
    Ok(sched)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env()?;
    info!("Using PORT: {}", config.port);
    info!("Historical data file: {}", config.history_path().display());

    let source = YahooClient::new(config.cache_ttl())?;
    let state = Arc::new(AppState::new(&config, Arc::new(source)));

    // held for the lifetime of the server
    let _sched = start_refresh_job(state.clone(), &config.refresh_schedule).await?;

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
