// src/handlers/funds.rs
use log::{error, info};
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::{reject, ApiError};
use crate::models::Instrument;
use crate::state::AppState;

/// Details for every fund the source can answer for; failures are logged.
pub async fn get_funds(state: Arc<AppState>) -> Result<Json, Rejection> {
    let mut details = Vec::new();
    let mut last_error = None;
    for instrument in Instrument::ALL {
        match state.source.fetch_latest_details(instrument).await {
            Ok(d) => details.push(d),
            Err(e) => {
                error!("Failed to fetch details for {}: {}", instrument, e);
                last_error = Some(e);
            }
        }
    }

    if details.is_empty() {
        return Err(match last_error {
            Some(e) => reject(e),
            None => warp::reject::custom(ApiError::unavailable("no fund details available")),
        });
    }
    info!("Fetched details for {} funds", details.len());
    Ok(warp::reply::json(&details))
}
