use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::web::types::{SubscriberFields, SubscriptionRequest};

/// Client for the mailing-list provider's subscriber API.
/// Subscribers are upserted, so sending the same email twice is idempotent on the provider side.
#[derive(Debug)]
pub struct MailerClient {
    pub http_client: Client,
    pub url: reqwest::Url,
    pub group_id: String,
    api_key: Option<SecretString>,
}

impl MailerClient {
    pub fn new<S: AsRef<str>>(
        url: S,
        group_id: String,
        api_key: Option<SecretString>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        // `Url::join` replaces the last path segment unless the base ends with a slash.
        let mut url = url.as_ref().to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        let url = reqwest::Url::parse(&url).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(MailerClient {
            http_client,
            url,
            group_id,
            api_key,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Creates or updates the subscriber and adds them to the configured group.
    ///
    /// A non-success status from the provider is returned as `Error::Rejected`,
    /// carrying whatever `message` and `errors` the provider sent back.
    pub async fn upsert_subscriber(&self, subscription: &SubscriptionRequest) -> Result<()> {
        let api_key = self.api_key.as_ref().ok_or(Error::MissingApiKey)?;
        let url = self
            .url
            .join("subscribers")
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let fields = SubscriberFields::from(subscription);
        let body = UpsertSubscriber {
            email: subscription.email.as_ref(),
            fields,
            groups: [self.group_id.as_str()],
        };

        let resp = self
            .http_client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // An unreadable or non-JSON reply is treated as absent.
        let reply = resp
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());

        Err(Error::Rejected(ProviderRejection::from_reply(status, reply)))
    }
}

#[derive(Serialize)]
pub struct UpsertSubscriber<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "SubscriberFields::is_empty")]
    pub fields: SubscriberFields<'a>,
    pub groups: [&'a str; 1],
}

/// What the provider told us when it refused a subscriber.
#[derive(Debug)]
pub struct ProviderRejection {
    pub status: StatusCode,
    pub message: Option<String>,
    pub errors: Option<Value>,
}

impl ProviderRejection {
    fn from_reply(status: StatusCode, reply: Option<Value>) -> Self {
        let message = reply
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string);
        // Passed through as sent, an explicit `null` included.
        let errors = reply.and_then(|mut v| v.get_mut("errors").map(Value::take));

        ProviderRejection {
            status,
            message,
            errors,
        }
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, derive_more::From)]
pub enum Error {
    UrlParsing(String),
    MissingApiKey,
    Rejected(ProviderRejection),
    #[from]
    Reqwest(reqwest::Error),
}
// Error Boilerplate
impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
