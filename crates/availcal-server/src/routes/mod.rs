pub mod availability;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::state::AppState;

/// Message returned to clients when the calendar cannot be served.
pub const FETCH_ERROR_MESSAGE: &str = "Unable to fetch or parse the calendar";

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors are logged where they happen; clients only get a generic message.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = if self.is_fetch_failure() {
            FETCH_ERROR_MESSAGE
        } else {
            "Internal server error"
        };

        let body = Json(ErrorResponse {
            error: message.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Builds the full application: routes, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(availability::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
