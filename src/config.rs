//! Environment-driven configuration, read once at startup.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_PUBLIC_DIR: &str = "client";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4-1106-preview";

/// Google OAuth and People API settings.
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_base: String,
    pub token_base: String,
    pub people_base: String,
}

/// Stripe API settings.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub connect_base: String,
}

/// OpenAI chat completion settings.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

/// Transactional email settings for the contact form.
#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub api_base: String,
    pub sender: String,
    pub contact_recipient: String,
}

/// Application configuration.
///
/// `secure_cookies` and `enforce_https` both follow `APP_ENV`: anything
/// other than `production` keeps local development working over plain
/// HTTP.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub secure_cookies: bool,
    pub enforce_https: bool,
    pub cookie_secret: String,
    pub public_dir: PathBuf,
    pub google: GoogleConfig,
    pub stripe: StripeConfig,
    pub openai: OpenAiConfig,
    pub email: EmailConfig,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let production = env::var("APP_ENV").map(|v| v == "production").unwrap_or(false);

        let cookie_secret = required("SECRET")?;
        if cookie_secret.len() < 32 {
            return Err(AppError::Config(
                "SECRET must be at least 32 bytes".to_string(),
            ));
        }

        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PUBLIC_DIR));

        Ok(Self {
            port,
            secure_cookies: production,
            enforce_https: production,
            cookie_secret,
            public_dir,
            google: GoogleConfig {
                client_id: required("G_CLIENT_ID")?,
                client_secret: required("G_CLIENT_SECRET")?,
                redirect_uri: required("G_REDIRECT_URI")?,
                auth_base: "https://accounts.google.com".to_string(),
                token_base: "https://oauth2.googleapis.com".to_string(),
                people_base: "https://people.googleapis.com".to_string(),
            },
            stripe: StripeConfig {
                secret_key: required("S_SECRET_KEY")?,
                webhook_secret: required("S_WEBHOOK_SECRET")?,
                api_base: "https://api.stripe.com".to_string(),
                connect_base: "https://connect.stripe.com".to_string(),
            },
            openai: OpenAiConfig {
                api_key: required("OPENAI_API_KEY")?,
                api_base: "https://api.openai.com".to_string(),
                model: env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            },
            email: EmailConfig {
                api_key: required("EMAIL_API_KEY")?,
                api_base: "https://api.brevo.com".to_string(),
                sender: required("EMAIL_FROM")?,
                contact_recipient: required("CONTACT_EMAIL")?,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn required(name: &'static str) -> AppResult<String> {
    env::var(name)
        .map_err(|_| AppError::Config(format!("missing required environment variable {name}")))
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("secure_cookies", &self.secure_cookies)
            .field("enforce_https", &self.enforce_https)
            .field("cookie_secret", &"<redacted>")
            .field("public_dir", &self.public_dir)
            .finish_non_exhaustive()
    }
}
