use std::any::Any;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::{
    web::{
        error::{json_response, SubscribeError, WebResult},
        types::{RawSubscription, SubscriptionRequest, SubscriptionResult},
    },
    AppState,
};

/// How long browsers may cache a pre-flight answer, in seconds.
pub const PREFLIGHT_MAX_AGE_SECS: &str = "86400";

/// Answers the browser's CORS pre-flight probe. The allowed origin is added by the CORS middleware.
pub async fn subscribe_preflight() -> impl IntoResponse {
    let headers: [(HeaderName, HeaderValue); 3] = [
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ),
        (
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
        ),
    ];

    (StatusCode::NO_CONTENT, headers)
}

/// Validates the subscriber and relays it to the mailing-list provider.
///
/// The body is read raw: a body that isn't a JSON object is treated as empty and fails
/// email validation, so nothing invalid ever reaches the provider.
/// The same goes for a body that can't be buffered at all, e.g. one over the size limit.
pub async fn subscribe(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = body.unwrap_or_else(|rejection| {
        debug!("{:<12} - unreadable body: {rejection}", "SUBSCRIBE");
        Bytes::new()
    });

    match relay_subscriber(&app_state, &body).await {
        Ok(()) => json_response(StatusCode::OK, SubscriptionResult::Ok),
        Err(er) => er.into_response(),
    }
}

#[tracing::instrument(
    name = "Relaying a new subscriber",
    skip_all,
    fields(subscriber_email = tracing::field::Empty)
)]
async fn relay_subscriber(app_state: &AppState, body: &[u8]) -> WebResult<()> {
    // Fail fast, before looking at the body.
    if !app_state.mailer_client.has_api_key() {
        return Err(SubscribeError::ServerConfig);
    }

    let subscription: SubscriptionRequest = RawSubscription::from_body(body).try_into()?;
    tracing::Span::current().record("subscriber_email", subscription.email.as_ref());

    app_state
        .mailer_client
        .upsert_subscriber(&subscription)
        .await?;

    info!("Subscriber upserted.");
    Ok(())
}

/// Renders a panic inside the subscribe routes as the generic server error envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("{:<12} - handler panicked: {details}", "PANIC");

    SubscribeError::Unexpected(format!("handler panicked: {details}")).into_response()
}
