mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use hmac::{Hmac, Mac};
use lectern::clients::{EmailClient, StripeClient};
use lectern::http::{build_router, AppState};
use lectern::store::Database;
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(db: &Database, base: &str) -> axum::Router {
    let config = config_with_bases(base);
    let state = AppState::new(
        config,
        db.clone(),
        schema_for(db, base),
        StripeClient::new(stripe_config(base)).unwrap(),
        EmailClient::new(email_config(base)).unwrap(),
    );
    build_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

#[tokio::test]
async fn test_health_endpoint() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_graphql_endpoint_answers_queries() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let request = post_json("/api", json!({ "query": "{ authUrl }" }));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["authUrl"]
        .as_str()
        .unwrap()
        .contains("client_id=test-client-id"));
}

#[tokio::test]
async fn test_graphql_endpoint_mirrors_cors_origin() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let mut request = post_json("/api", json!({ "query": "{ authUrl }" }));
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

#[tokio::test]
async fn test_playground_served_on_get() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let response = app
        .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("GraphQL Playground"));
}

#[tokio::test]
async fn test_payment_intent_rejects_non_positive_amount() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let request = post_json("/create-payment-intent", json!({ "amount": 0 }));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("INVALID_INPUT"));
}

#[tokio::test]
async fn test_payment_intent_returns_client_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "client_secret": "pi_123_secret_456"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = Database::new();
    let app = app(&db, &server.uri());

    let request = post_json("/create-payment-intent", json!({ "amount": 2000 }));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "clientSecret": "pi_123_secret_456" })
    );
}

#[tokio::test]
async fn test_checkout_session_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_123",
            "url": "https://checkout.stripe.com/pay/cs_123"
        })))
        .mount(&server)
        .await;

    let db = Database::new();
    let app = app(&db, &server.uri());

    let request = post_json(
        "/create-checkout-session",
        json!({
            "priceId": "price_1",
            "userId": "u1",
            "successUrl": "https://app.example.com/done",
            "cancelUrl": "https://app.example.com/cancel"
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], json!("cs_123"));
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("stripe-signature", "t=1,v1=deadbeef")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("WEBHOOK_SIGNATURE"));
}

#[tokio::test]
async fn test_webhook_links_customer_on_checkout_completed() {
    let db = Database::new();
    db.users.insert(user("u1", "Ada", "tok-1")).unwrap();
    let app = app(&db, "http://127.0.0.1:9");

    let payload = json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_123",
                "client_reference_id": "u1",
                "customer": "cus_123"
            }
        }
    })
    .to_string();
    let signature = sign(
        payload.as_bytes(),
        "whsec_test_123",
        chrono::Utc::now().timestamp(),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        db.users.get("u1").unwrap().unwrap().payment_id,
        Some("cus_123".to_string())
    );
}

#[tokio::test]
async fn test_contact_requires_all_fields() {
    let db = Database::new();
    let app = app(&db, "http://127.0.0.1:9");

    let request = post_json(
        "/contact",
        json!({ "name": "", "email": "ada@example.com", "message": "hi" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_sends_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "messageId": "202408221234.123@smtp-relay"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = Database::new();
    let app = app(&db, &server.uri());

    let request = post_json(
        "/contact",
        json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "Loving the fractions series."
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "sent": true }));
}

#[tokio::test]
async fn test_viewer_cookie_set_on_google_log_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-access-token"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/people/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "names": [{
                "displayName": "Ada Lovelace",
                "metadata": { "source": { "id": "108" } }
            }],
            "photos": [{ "url": "https://lh3.example.com/photo.jpg" }],
            "emailAddresses": [{ "value": "ada@example.com" }]
        })))
        .mount(&server)
        .await;

    let db = Database::new();
    let app = app(&db, &server.uri());

    let request = post_json(
        "/api",
        json!({
            "query": r#"mutation { logIn(input: { code: "oauth-code" }) { id didRequest } }"#
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("viewer="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    let body = body_json(response).await;
    assert_eq!(body["data"]["logIn"]["id"], json!("108"));
    assert!(db.users.get("108").unwrap().is_some());
}
