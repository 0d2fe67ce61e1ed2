// src/routes.rs
use log::info;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::configs::{get_config, put_config};
use crate::handlers::error::ApiError;
use crate::handlers::funds::get_funds;
use crate::handlers::history::{get_history_status, post_history_refresh, RefreshQuery};
use crate::handlers::portfolio::{
    get_allocation, get_band, get_portfolio, AllocationQuery, BandQuery, PortfolioQuery,
};
use crate::models::PortfolioConfig;
use crate::state::AppState;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        code = StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let allocation_route = warp::path!("api" / "v1" / "allocation")
        .and(warp::get())
        .and(warp::query::<AllocationQuery>())
        .and_then(get_allocation);

    let portfolio_route = warp::path!("api" / "v1" / "portfolio")
        .and(warp::get())
        .and(warp::query::<PortfolioQuery>())
        .and(state_filter.clone())
        .and_then(get_portfolio);

    let bands_route = warp::path!("api" / "v1" / "bands")
        .and(warp::get())
        .and(warp::query::<BandQuery>())
        .and(state_filter.clone())
        .and_then(get_band);

    let funds_route = warp::path!("api" / "v1" / "funds")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_funds);

    let status_route = warp::path!("api" / "v1" / "history" / "status")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_history_status);

    let refresh_route = warp::path!("api" / "v1" / "history" / "refresh")
        .and(warp::post())
        .and(warp::query::<RefreshQuery>())
        .and(state_filter.clone())
        .and_then(post_history_refresh);

    let get_config_route = warp::path!("api" / "v1" / "configs" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_config);

    let put_config_route = warp::path!("api" / "v1" / "configs" / String)
        .and(warp::put())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json::<PortfolioConfig>())
        .and(state_filter.clone())
        .and_then(put_config);

    info!("All routes configured successfully.");

    allocation_route
        .or(portfolio_route)
        .or(bands_route)
        .or(funds_route)
        .or(status_route)
        .or(refresh_route)
        .or(get_config_route)
        .or(put_config_route)
        .recover(handle_rejection)
}
