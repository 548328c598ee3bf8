//! HTTP surface: the GraphQL endpoint, payment routes, the Stripe
//! webhook, the contact form, and SPA hosting.

use std::sync::Arc;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRef, Request, State};
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::Key;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::auth::{graphql_handler, CSRF_HEADER};
use crate::clients::{verify_signature, ContactForm, EmailClient, StripeClient, WebhookEvent};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::graphql::AppSchema;
use crate::store::Database;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub db: Database,
    pub config: Arc<Config>,
    pub cookie_key: Key,
    pub stripe: StripeClient,
    pub mailer: EmailClient,
}

impl AppState {
    /// `config.cookie_secret` must be at least 32 bytes; `Config::from_env`
    /// enforces this.
    pub fn new(
        config: Config,
        db: Database,
        schema: AppSchema,
        stripe: StripeClient,
        mailer: EmailClient,
    ) -> Self {
        let cookie_key = Key::derive_from(config.cookie_secret.as_bytes());
        Self {
            schema,
            db,
            config: Arc::new(config),
            cookie_key,
            stripe,
            mailer,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let spa = ServeDir::new(&state.config.public_dir)
        .fallback(ServeFile::new(state.config.public_dir.join("index.html")));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)]);

    Router::new()
        .route("/api", post(graphql_handler).get(playground))
        .route("/contact", post(contact_handler))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/webhook", post(stripe_webhook))
        .route("/health", get(health))
        .fallback_service(spa)
        .layer(middleware::from_fn_with_state(state.clone(), enforce_https))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: AppState) -> AppResult<()> {
    let addr = state.config.server_addr();
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /api serves the GraphQL playground.
async fn playground() -> Html<String> {
    Html(playground_source(GraphQLPlaygroundConfig::new("/api")))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn contact_handler(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty()
    {
        return Err(AppError::InvalidInput(
            "name, email, and message are all required".to_string(),
        ));
    }
    state.mailer.send_contact(&form).await?;
    Ok(Json(json!({ "sent": true })))
}

#[derive(Deserialize)]
struct PaymentIntentRequest {
    amount: i64,
    currency: Option<String>,
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.amount <= 0 {
        return Err(AppError::InvalidInput(
            "amount must be positive".to_string(),
        ));
    }
    let currency = request.currency.unwrap_or_else(|| "usd".to_string());
    let intent = state
        .stripe
        .create_payment_intent(request.amount, &currency)
        .await?;
    Ok(Json(json!({ "clientSecret": intent.client_secret })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSessionRequest {
    price_id: String,
    user_id: Option<String>,
    success_url: String,
    cancel_url: String,
}

async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CheckoutSessionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = state
        .stripe
        .create_checkout_session(
            &request.price_id,
            request.user_id.as_deref(),
            &request.success_url,
            &request.cancel_url,
        )
        .await?;
    Ok(Json(json!({ "id": session.id, "url": session.url })))
}

/// Stripe webhook receiver.
///
/// Verifies the signature over the raw body before any parsing. On
/// `checkout.session.completed` the session's customer id is stored on
/// the user named by `client_reference_id`.
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::WebhookSignature("missing stripe-signature header".to_string())
        })?;
    verify_signature(
        &payload,
        signature,
        &state.config.stripe.webhook_secret,
        Utc::now().timestamp(),
    )?;

    let event: WebhookEvent = serde_json::from_slice(&payload)
        .map_err(|err| AppError::InvalidInput(format!("malformed webhook payload: {err}")))?;

    if event.event_type == "checkout.session.completed" {
        let object = event.data.object;
        if let (Some(user_id), Some(customer)) = (object.client_reference_id, object.customer) {
            let updated = state
                .db
                .users
                .update(&user_id, |user| user.payment_id = Some(customer))?;
            if updated.is_some() {
                tracing::info!(user = %user_id, "linked stripe customer from checkout");
            } else {
                tracing::warn!(user = %user_id, "checkout completed for unknown user");
            }
        }
    }

    Ok(StatusCode::OK)
}

/// Redirect plain-HTTP traffic when running behind a TLS-terminating
/// proxy. Does nothing unless `enforce_https` is set.
async fn enforce_https(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.config.enforce_https {
        let proto = request
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok());
        if proto == Some("http") {
            let host = request
                .headers()
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let target = format!("https://{host}{}", request.uri());
            return Redirect::permanent(&target).into_response();
        }
    }
    next.run(request).await
}
