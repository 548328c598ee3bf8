//! Stripe payments: payment intents, checkout sessions, Connect, and
//! webhook signature verification.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Accept webhook events at most this many seconds from now.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
}

/// The slice of a customer's first subscription shown on their profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub amount: i64,
    pub cadence: String,
    pub status: String,
    pub since: i64,
    pub trial_end: i64,
}

/// Minimal view of a webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    /// Create a payment intent for a one-off charge.
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> AppResult<PaymentIntent> {
        let amount = amount.to_string();
        let intent = self
            .http
            .post(format!("{}/v1/payment_intents", self.config.api_base))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(intent)
    }

    /// Open a subscription checkout session.
    ///
    /// `client_reference_id` carries our user id so the completion
    /// webhook can attach the resulting customer to the right account.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        client_reference_id: Option<&str>,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession> {
        let mut form = vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
        ];
        if let Some(user_id) = client_reference_id {
            form.push(("client_reference_id", user_id.to_string()));
        }

        let session = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(session)
    }

    /// Look up a customer by the email they signed up with.
    pub async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<Customer>> {
        let search: CustomerSearch = self
            .http
            .get(format!("{}/v1/customers/search", self.config.api_base))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .query(&[("query", format!("email:'{email}'"))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(search.data.into_iter().next())
    }

    /// Fetch a customer's first subscription, if they have one.
    pub async fn customer_package(
        &self,
        customer_id: &str,
    ) -> AppResult<Option<SubscriptionSummary>> {
        let customer: CustomerWithSubscriptions = self
            .http
            .get(format!("{}/v1/customers/{customer_id}", self.config.api_base))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .query(&[("expand[]", "subscriptions")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(customer
            .subscriptions
            .and_then(|subs| subs.data.into_iter().next())
            .map(|sub| SubscriptionSummary {
                amount: sub.plan.amount,
                cadence: sub.plan.interval,
                status: sub.status,
                since: sub.created,
                trial_end: sub.trial_end.unwrap_or(0),
            }))
    }

    /// Finish a Connect OAuth flow, returning the connected account id.
    pub async fn connect(&self, code: &str) -> AppResult<String> {
        let response: ConnectResponse = self
            .http
            .post(format!("{}/oauth/token", self.config.connect_base))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&[("grant_type", "authorization_code"), ("code", code)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.stripe_user_id)
    }
}

#[derive(Deserialize)]
struct CustomerSearch {
    #[serde(default)]
    data: Vec<Customer>,
}

#[derive(Deserialize)]
struct CustomerWithSubscriptions {
    subscriptions: Option<SubscriptionList>,
}

#[derive(Deserialize)]
struct SubscriptionList {
    #[serde(default)]
    data: Vec<Subscription>,
}

#[derive(Deserialize)]
struct Subscription {
    plan: Plan,
    status: String,
    created: i64,
    trial_end: Option<i64>,
}

#[derive(Deserialize)]
struct Plan {
    amount: i64,
    interval: String,
}

#[derive(Deserialize)]
struct ConnectResponse {
    stripe_user_id: String,
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// The header format is `t=<unix>,v1=<hex hmac>[,v1=...]`; the MAC is
/// HMAC-SHA256 over `"{t}.{body}"` keyed with the endpoint secret.
/// Events outside the tolerance window are rejected even when a
/// signature matches.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> AppResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", value)) => timestamp = value.trim().parse().ok(),
            Some(("v1", value)) => candidates.push(value.trim()),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::WebhookSignature("missing timestamp".to_string()))?;
    if candidates.is_empty() {
        return Err(AppError::WebhookSignature(
            "missing v1 signature".to_string(),
        ));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::WebhookSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|err| AppError::WebhookSignature(err.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }
    Err(AppError::WebhookSignature(
        "no matching v1 signature".to_string(),
    ))
}
