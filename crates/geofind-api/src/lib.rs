//! geofind-api - HTTP API for the geofind location lookup service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;

use axum::{
    http::{header, HeaderName, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::ApiError;
pub use state::AppState;

use handlers::{favorites, health, history, locations, selection};

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = geofind_core::new_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router with tracing, request-id, and CORS layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/locations/resolve", post(locations::resolve_location))
        .route(
            "/api/v1/selection",
            get(selection::get_selection).put(selection::put_selection),
        )
        .route("/api/v1/selection/map-click", post(selection::map_click))
        .route("/api/v1/selection/events", get(selection::selection_events))
        .route("/api/v1/favorites", get(favorites::list_favorites))
        .route("/api/v1/favorites/toggle", post(favorites::toggle_favorite))
        .route("/api/v1/favorites/status", get(favorites::favorite_status))
        .route("/api/v1/favorites/:id", delete(favorites::delete_favorite))
        .route("/api/v1/history", get(history::list_history))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(auth::USER_ID_HEADER),
                    HeaderName::from_static(auth::SESSION_ID_HEADER),
                ])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .with_state(state)
}
