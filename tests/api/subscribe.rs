use anyhow::Result;
use listomat::web::{INVALID_EMAIL_MSG, SERVER_CONFIG_MSG, SERVER_ERROR_MSG, SIGNUP_FAILED_MSG};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, body_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{unused_local_url, TestApp, TEST_API_KEY, TEST_GROUP_ID};

#[tokio::test]
async fn subscribe_valid_email_returns_ok() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/subscribers"))
        .and(method("POST"))
        .and(header("Authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .and(body_json(json!({
            "email": "le_guin@example.com",
            "groups": [TEST_GROUP_ID],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        // Will fail if no requests are received
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({ "email": " le_guin@example.com " }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["cache-control"], "no-store");
    assert_eq!(res.json::<Value>().await?, json!({ "ok": true }));

    Ok(())
}

#[tokio::test]
async fn subscribe_is_also_served_under_api() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/subscribers"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .http_client
        .post(format!("http://{}/api/subscribe", app.addr))
        .json(&json!({ "email": "le_guin@example.com" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn subscribe_forwards_cleaned_optional_fields() -> Result<()> {
    let app = TestApp::spawn().await?;
    let reason = "r".repeat(300);

    Mock::given(path("/subscribers"))
        .and(body_json(json!({
            "email": "le_guin@example.com",
            "fields": {
                "name": "Ursula Le Guin",
                "company": "Earthsea",
                "phone": "+1 (555) 123-4567",
                "reason": "r".repeat(280),
            },
            "groups": [TEST_GROUP_ID],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({
            "email": "le_guin@example.com",
            "name": "  Ursula Le Guin  ",
            "company": "Earthsea",
            "phone": "+1 (555) 123-4567#ext",
            "reason": reason,
        }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn subscribe_invalid_email_returns_422_without_calling_provider() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailer_server)
        .await;

    let cases = [
        (json!({}).to_string(), "Empty json"),
        (json!({ "name": "Ursula" }).to_string(), "Missing email"),
        (json!({ "email": "" }).to_string(), "Empty email"),
        (json!({ "email": "ursuladomain.com" }).to_string(), "Missing @"),
        (json!({ "email": "ursula@domain" }).to_string(), "Missing dot"),
        (json!({ "email": "ur sula@domain.com" }).to_string(), "Whitespace"),
        (json!({ "email": 12 }).to_string(), "Number email"),
        (json!(["le_guin@example.com"]).to_string(), "Array body"),
        ("{not json".to_string(), "Malformed json"),
        (String::new(), "Empty body"),
    ];

    for (body, description) in cases {
        let res = app.post_subscribe_raw(body, None).await?;
        assert_eq!(
            res.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "Wrong response for request with: {description}"
        );
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "ok": false, "message": INVALID_EMAIL_MSG }),
            "Wrong body for request with: {description}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_missing_api_key_returns_500_without_calling_provider() -> Result<()> {
    let app = TestApp::spawn_with(|config| config.mailer_config.api_key = None).await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["cache-control"], "no-store");
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": SERVER_CONFIG_MSG })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_mirrors_provider_rejection() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/subscribers"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "already subscribed" })),
        )
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": "already subscribed" })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_passes_provider_errors_through() -> Result<()> {
    let app = TestApp::spawn().await?;
    let errors = json!({ "email": ["The email must be a valid email address."] });

    Mock::given(path("/subscribers"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "The given data was invalid.",
            "errors": errors,
        })))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": "The given data was invalid.", "errors": errors })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_provider_rejection_without_message_uses_fallback() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/subscribers"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": SIGNUP_FAILED_MSG })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_network_failure_returns_generic_500() -> Result<()> {
    let unreachable = unused_local_url()?;
    let app = TestApp::spawn_with(|config| config.mailer_config.base_url = unreachable).await?;

    let res = app
        .post_subscribe(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": SERVER_ERROR_MSG })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_oversized_body_returns_json_422() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailer_server)
        .await;

    // Past axum's default 2 MB body limit.
    let body = json!({
        "email": "le_guin@example.com",
        "reason": "r".repeat(3 * 1024 * 1024),
    });

    let res = app.post_subscribe(&body).await?;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["cache-control"], "no-store");
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": INVALID_EMAIL_MSG })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_keeps_null_provider_errors() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/subscribers"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Conflict",
            "errors": null,
        })))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let res = app
        .post_subscribe(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "ok": false, "message": "Conflict", "errors": null })
    );

    Ok(())
}
