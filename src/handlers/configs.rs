// src/handlers/configs.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::reject;
use crate::models::PortfolioConfig;
use crate::state::AppState;

pub async fn get_config(name: String, state: Arc<AppState>) -> Result<Json, Rejection> {
    let config = state.configs.load(&name).map_err(reject)?;
    Ok(warp::reply::json(&config))
}

pub async fn put_config(
    name: String,
    config: PortfolioConfig,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    state.configs.save(&name, &config).map_err(reject)?;
    info!("Saved portfolio configuration '{}'", name);
    Ok(warp::reply::json(&config))
}
