use lectern::clients::{EmailClient, GoogleClient, OpenAiClient, StripeClient};
use lectern::config::Config;
use lectern::error::AppResult;
use lectern::graphql::build_schema;
use lectern::http::{self, AppState};
use lectern::store::Database;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let db = Database::new();
    let google = GoogleClient::new(config.google.clone())?;
    let stripe = StripeClient::new(config.stripe.clone())?;
    let openai = OpenAiClient::new(config.openai.clone())?;
    let mailer = EmailClient::new(config.email.clone())?;

    let schema = build_schema(db.clone(), google, stripe.clone(), openai);
    let state = AppState::new(config, db, schema, stripe, mailer);

    http::serve(state).await
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
