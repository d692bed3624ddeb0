use axum::http::{Method, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::web::SubscribeError;

pub fn log_request(
    req_id: String,
    req_method: Method,
    uri: Uri,
    status_code: StatusCode,
    web_error: Option<&SubscribeError>,
) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let req_method = req_method.to_string();
    let uri = uri.to_string();
    let status_code = status_code.as_u16();
    let web_error_type = web_error.map(|we| we.as_ref().to_string());
    // Provider rejections and unexpected failures keep their details server side only.
    let web_error_detail = web_error.and_then(|we| match we {
        SubscribeError::Upstream { .. } | SubscribeError::Unexpected(_) => Some(we.to_string()),
        SubscribeError::InvalidEmail | SubscribeError::ServerConfig => None,
    });

    let logline = LogLine {
        timestamp,
        req_id,
        req_method,
        uri,
        status_code,
        web_error_type,
        web_error_detail,
    };

    debug!("LOGLINE: {}", json!(logline));
}

#[derive(Serialize)]
struct LogLine {
    timestamp: String,
    req_id: String,

    req_method: String,
    uri: String,
    status_code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    web_error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_error_detail: Option<String>,
}
