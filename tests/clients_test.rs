mod common;

use common::*;
use lectern::clients::{ContactForm, EmailClient, GoogleClient, OpenAiClient, StripeClient};
use lectern::error::AppError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_google_log_in_fetches_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=oauth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-access-token",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/people/me"))
        .and(query_param("personFields", "names,emailAddresses,photos"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "names": [{
                "displayName": "Ada Lovelace",
                "metadata": { "source": { "id": "108" } }
            }],
            "photos": [{ "url": "https://lh3.example.com/photo.jpg" }],
            "emailAddresses": [{ "value": "ada@example.com" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleClient::new(google_config(&server.uri())).unwrap();
    let profile = client.log_in("oauth-code").await.unwrap();

    assert_eq!(profile.id, "108");
    assert_eq!(profile.name, "Ada Lovelace");
    assert_eq!(profile.email, "ada@example.com");
}

#[tokio::test]
async fn test_google_log_in_rejects_incomplete_profile() {
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
            "names": [{ "displayName": "Ada Lovelace" }]
        })))
        .mount(&server)
        .await;

    let client = GoogleClient::new(google_config(&server.uri())).unwrap();
    let err = client.log_in("oauth-code").await.unwrap_err();
    assert!(matches!(err, AppError::Google(_)));
}

#[tokio::test]
async fn test_stripe_create_payment_intent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(body_string_contains("amount=2000"))
        .and(body_string_contains("currency=usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "client_secret": "pi_123_secret_456"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StripeClient::new(stripe_config(&server.uri())).unwrap();
    let intent = client.create_payment_intent(2000, "usd").await.unwrap();
    assert_eq!(intent.client_secret, "pi_123_secret_456");
}

#[tokio::test]
async fn test_stripe_checkout_session_carries_client_reference() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("mode=subscription"))
        .and(body_string_contains("client_reference_id=u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_123",
            "url": "https://checkout.stripe.com/pay/cs_123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StripeClient::new(stripe_config(&server.uri())).unwrap();
    let session = client
        .create_checkout_session(
            "price_1",
            Some("u1"),
            "https://app.example.com/done",
            "https://app.example.com/cancel",
        )
        .await
        .unwrap();
    assert_eq!(session.id, "cs_123");
    assert_eq!(
        session.url.as_deref(),
        Some("https://checkout.stripe.com/pay/cs_123")
    );
}

#[tokio::test]
async fn test_stripe_find_customer_by_email() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/search"))
        .and(query_param("query", "email:'ada@example.com'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "cus_123" }]
        })))
        .mount(&server)
        .await;

    let client = StripeClient::new(stripe_config(&server.uri())).unwrap();
    let customer = client
        .find_customer_by_email("ada@example.com")
        .await
        .unwrap();
    assert_eq!(customer.map(|c| c.id), Some("cus_123".to_string()));
}

#[tokio::test]
async fn test_stripe_customer_package_without_subscription() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_123",
            "subscriptions": { "data": [] }
        })))
        .mount(&server)
        .await;

    let client = StripeClient::new(stripe_config(&server.uri())).unwrap();
    let package = client.customer_package("cus_123").await.unwrap();
    assert!(package.is_none());
}

#[tokio::test]
async fn test_stripe_connect_returns_account_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=ac_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stripe_user_id": "acct_42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StripeClient::new(stripe_config(&server.uri())).unwrap();
    assert_eq!(client.connect("ac_123").await.unwrap(), "acct_42");
}

#[tokio::test]
async fn test_openai_generate_quiz_sends_counts_and_subject() {
    let server = MockServer::start().await;
    let quiz_json = r#"{"questions":[{"question":"Capital of France?"}]}"#;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4-1106-preview",
            "response_format": { "type": "json_object" }
        })))
        .and(body_string_contains(
            "Generate 3 multiple choice questions and 2 true/false questions about geography.",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": quiz_json } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(openai_config(&server.uri())).unwrap();
    let output = client.generate_quiz(3, 2, "geography").await.unwrap();
    assert_eq!(output, quiz_json);
}

#[tokio::test]
async fn test_openai_empty_choices_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(openai_config(&server.uri())).unwrap();
    let err = client.generate_quiz(1, 1, "geography").await.unwrap_err();
    assert!(matches!(err, AppError::OpenAi(_)));
}

#[tokio::test]
async fn test_email_send_contact() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .and(header("api-key", "xkeysib-test"))
        .and(body_partial_json(json!({
            "to": [{ "email": "hello@example.com" }],
            "replyTo": { "email": "ada@example.com", "name": "Ada" },
            "textContent": "Loving the fractions series."
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "messageId": "202408221234.123@smtp-relay"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EmailClient::new(email_config(&server.uri())).unwrap();
    let form = ContactForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        message: "Loving the fractions series.".to_string(),
    };
    client.send_contact(&form).await.unwrap();
}

#[tokio::test]
async fn test_email_provider_failure_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = EmailClient::new(email_config(&server.uri())).unwrap();
    let form = ContactForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        message: "hi".to_string(),
    };
    let err = client.send_contact(&form).await.unwrap_err();
    match err {
        AppError::Email(message) => assert!(message.contains("401")),
        other => panic!("expected email error, got {other:?}"),
    }
}
