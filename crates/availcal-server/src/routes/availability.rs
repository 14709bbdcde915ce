//! Availability endpoint

use axum::{Json, Router, extract::State, routing::get};

use crate::cache::Availability;
use crate::error::ServerError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/availability", get(get_availability))
}

/// GET /api/availability - Occupied periods of the rental
async fn get_availability(State(state): State<AppState>) -> Result<Json<Availability>, ServerError> {
    let availability = state.cache.get_availability().await?;
    Ok(Json(availability))
}
