use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use strum_macros::AsRefStr;

use super::types::SubscriptionResult;
use crate::mailer_client::{self, ProviderRejection};

pub type WebResult<T> = core::result::Result<T, SubscribeError>;

pub const INVALID_EMAIL_MSG: &str = "Please enter a valid email address.";
pub const SERVER_CONFIG_MSG: &str = "Server configuration error (missing API key).";
pub const SIGNUP_FAILED_MSG: &str = "Signup failed";
pub const SERVER_ERROR_MSG: &str = "Server error. Please try again.";

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum SubscribeError {
    #[error("email failed validation")]
    InvalidEmail,
    #[error("the mailing-list API key is not configured")]
    ServerConfig,
    #[error("the mailing-list provider rejected the subscriber with status {status}")]
    Upstream {
        status: StatusCode,
        message: Option<String>,
        errors: Option<Value>,
    },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SubscribeError {
    /// The status code and the envelope that is safe to show to the client.
    /// Only the provider's own `message` and `errors` are passed through, everything else is generic.
    pub fn status_code_and_client_result(&self) -> (StatusCode, SubscriptionResult) {
        use SubscribeError::*;

        match self {
            InvalidEmail => (
                StatusCode::UNPROCESSABLE_ENTITY,
                SubscriptionResult::err(INVALID_EMAIL_MSG),
            ),
            ServerConfig => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SubscriptionResult::err(SERVER_CONFIG_MSG),
            ),
            Upstream {
                status,
                message,
                errors,
            } => (
                *status,
                SubscriptionResult::Err {
                    message: message.as_deref().unwrap_or(SIGNUP_FAILED_MSG).to_string(),
                    errors: errors.clone(),
                },
            ),
            Unexpected(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SubscriptionResult::err(SERVER_ERROR_MSG),
            ),
        }
    }
}

impl From<super::types::DataParsingError> for SubscribeError {
    fn from(_: super::types::DataParsingError) -> Self {
        SubscribeError::InvalidEmail
    }
}

impl From<mailer_client::Error> for SubscribeError {
    fn from(value: mailer_client::Error) -> Self {
        match value {
            mailer_client::Error::MissingApiKey => SubscribeError::ServerConfig,
            mailer_client::Error::Rejected(ProviderRejection {
                status,
                message,
                errors,
            }) => SubscribeError::Upstream {
                status,
                message,
                errors,
            },
            other => SubscribeError::Unexpected(other.to_string()),
        }
    }
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        let (status, body) = self.status_code_and_client_result();
        let mut res = json_response(status, body);

        // Insert the Error into response so that the response mapper can log it.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// Every subscribe response is JSON and must never be cached.
pub fn json_response(status: StatusCode, body: SubscriptionResult) -> Response {
    let mut res = (status, Json(body)).into_response();
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    res
}
