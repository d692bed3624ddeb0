//! Cross-origin handling for the subscribe routes.
//!
//! The allow-list is parsed once at start-up. A wildcard entry echoes `*`, otherwise the request
//! `Origin` is echoed only if it is literally in the list. With no match (or no list) the CORS
//! headers are left out entirely and browsers block the request.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::{config::CorsConfig, AppState};

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        CorsPolicy { allowed_origins }
    }

    /// Picks the value for `Access-Control-Allow-Origin`, if any.
    pub fn pick_origin<'a>(&'a self, request_origin: Option<&'a str>) -> Option<&'a str> {
        if self.allowed_origins.is_empty() {
            return None;
        }
        if self.allowed_origins.iter().any(|o| o == WILDCARD) {
            return Some(WILDCARD);
        }

        let request_origin = request_origin?;
        self.allowed_origins
            .iter()
            .any(|o| o == request_origin)
            .then_some(request_origin)
    }

    /// Sets `Access-Control-Allow-Origin` and `Vary: Origin` on `headers` when the origin is allowed.
    pub fn apply(&self, request_origin: Option<&str>, headers: &mut HeaderMap) {
        let Some(origin) = self.pick_origin(request_origin) else {
            return;
        };
        // The request origin came from a header so it is always a valid value.
        if let Ok(origin) = HeaderValue::from_str(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

impl From<&CorsConfig> for CorsPolicy {
    fn from(config: &CorsConfig) -> Self {
        CorsPolicy::new(config.allowed_origins())
    }
}

/// Middleware adding the CORS origin headers to every response of the routes it wraps.
pub async fn cors_origin(State(app_state): State<AppState>, req: Request, next: Next) -> Response {
    let request_origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|origin| origin.to_str().ok())
        .map(str::to_string);

    let mut res = next.run(req).await;
    app_state
        .cors
        .apply(request_origin.as_deref(), res.headers_mut());

    res
}
