//! Contains all the routes that this application can handle.

mod subscribe;

pub use subscribe::{handle_panic, subscribe, subscribe_preflight, PREFLIGHT_MAX_AGE_SECS};

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{web::cors, AppState};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .merge(subscribe_routes(app_state.clone()))
        .nest("/api", subscribe_routes(app_state))
        .route("/health-check", get(health_check))
}

/// SUBSCRIBE - `POST` relays the subscriber, `OPTIONS` answers the CORS pre-flight.
fn subscribe_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/subscribe", post(subscribe).options(subscribe_preflight))
        .layer(
            ServiceBuilder::new()
                // Outermost, so that panic responses get the CORS headers as well.
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    cors::cors_origin,
                ))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(app_state)
}
