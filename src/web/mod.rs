pub mod cors;
mod error;
pub mod log;
pub mod midware;
pub mod routes;
pub mod serve;
pub mod types;

pub use error::{
    json_response, SubscribeError, WebResult, INVALID_EMAIL_MSG, SERVER_CONFIG_MSG,
    SERVER_ERROR_MSG, SIGNUP_FAILED_MSG,
};
pub use serve::serve;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
