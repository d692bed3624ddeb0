use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    response::Response,
};

use crate::web::{log, SubscribeError, REQUEST_ID_HEADER};

/// Logs every request once it has a response. The response itself is passed through untouched,
/// errors have already been rendered into the client envelope by `SubscribeError::into_response`.
pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    let req_id = resp
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let web_error = resp
        .extensions()
        .get::<Arc<SubscribeError>>()
        .map(Arc::as_ref);

    log::log_request(req_id, req_method, uri, resp.status(), web_error);

    resp
}
