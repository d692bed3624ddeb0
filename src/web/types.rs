//! Most of the structs in `web` module and their implementations live here.
//! Includes the inbound subscription data, its validation and the response envelope.

use lazy_regex::{regex, regex_is_match};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// The longest `reason` we forward, counted in characters.
pub const REASON_MAX_CHARS: usize = 280;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Subscription
/// Every field is kept as raw JSON so a wrongly typed field never fails the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct RawSubscription {
    #[serde(default)]
    pub email: Value,
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub company: Value,
    #[serde(default)]
    pub phone: Value,
    #[serde(default)]
    pub reason: Value,
}

impl RawSubscription {
    /// Parses a request body. Anything that isn't a JSON object degrades to an empty subscription.
    pub fn from_body(body: &[u8]) -> Self {
        // Go through a `Map` first, derived structs would also accept a JSON array.
        serde_json::from_slice::<Map<String, Value>>(body)
            .ok()
            .and_then(|map| serde_json::from_value(Value::Object(map)).ok())
            .unwrap_or_default()
    }
}

/// Validated Subscription
/// Optional fields are trimmed and may be empty, `phone` is sanitized and `reason` truncated.
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub email: ValidEmail,
    pub name: String,
    pub company: String,
    pub phone: String,
    pub reason: String,
}

impl TryFrom<RawSubscription> for SubscriptionRequest {
    type Error = DataParsingError;

    fn try_from(raw: RawSubscription) -> Result<Self, Self::Error> {
        let email = match raw.email {
            Value::String(email) => email,
            _ => String::new(),
        };

        Ok(SubscriptionRequest {
            email: ValidEmail::parse(email.trim())?,
            name: coerce_to_string(raw.name).trim().to_string(),
            company: coerce_to_string(raw.company).trim().to_string(),
            phone: sanitize_phone(coerce_to_string(raw.phone).trim()),
            reason: truncate_chars(coerce_to_string(raw.reason).trim(), REASON_MAX_CHARS),
        })
    }
}

/// Validated Subscriber Email
/// Only checks that it looks like `local@domain.tld` without whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", value) {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }
}

/// The optional `fields` mapping sent to the provider. Empty values are left out.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SubscriberFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

impl<'a> From<&'a SubscriptionRequest> for SubscriberFields<'a> {
    fn from(sub: &'a SubscriptionRequest) -> Self {
        let non_empty = |s: &'a String| (!s.is_empty()).then_some(s.as_str());

        SubscriberFields {
            name: non_empty(&sub.name),
            company: non_empty(&sub.company),
            phone: non_empty(&sub.phone),
            reason: non_empty(&sub.reason),
        }
    }
}

impl SubscriberFields<'_> {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.phone.is_none()
            && self.reason.is_none()
    }
}

/// The envelope every subscribe response is wrapped in.
/// Serializes to `{"ok":true}` or `{"ok":false,"message":...,"errors":...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionResult {
    Ok,
    Err {
        message: String,
        errors: Option<Value>,
    },
}

impl SubscriptionResult {
    pub fn err(message: impl Into<String>) -> Self {
        SubscriptionResult::Err {
            message: message.into(),
            errors: None,
        }
    }
}

impl Serialize for SubscriptionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SubscriptionResult::Ok => {
                let mut state = serializer.serialize_struct("SubscriptionResult", 1)?;
                state.serialize_field("ok", &true)?;
                state.end()
            }
            SubscriptionResult::Err { message, errors } => {
                let len = if errors.is_some() { 3 } else { 2 };
                let mut state = serializer.serialize_struct("SubscriptionResult", len)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("message", message)?;
                if let Some(errors) = errors {
                    state.serialize_field("errors", errors)?;
                }
                state.end()
            }
        }
    }
}

// ###################################
// ->   HELPERS
// ###################################
/// Turns a JSON scalar into its textual form; `null`, arrays and objects become empty.
fn coerce_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Keeps only digits, `+`, spaces, `-`, `(` and `)`.
pub fn sanitize_phone(phone: &str) -> String {
    regex!(r"[^0-9+ \-()]").replace_all(phone, "").into_owned()
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, Serialize)]
pub enum DataParsingError {
    EmailInvalid,
}
// Error Boilerplate
impl core::fmt::Display for DataParsingError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for DataParsingError {}
