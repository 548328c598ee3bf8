#![allow(dead_code)]

use async_graphql::{Request, Response};
use lectern::auth::{CookieSink, Credentials};
use lectern::clients::{GoogleClient, OpenAiClient, StripeClient};
use lectern::config::{Config, EmailConfig, GoogleConfig, OpenAiConfig, StripeConfig};
use lectern::graphql::{build_schema, AppSchema};
use lectern::loaders::Loaders;
use lectern::models::{Lesson, Playlist, User};
use lectern::scalars::LessonDate;
use lectern::store::Database;
use std::path::PathBuf;

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

pub fn google_config(base: &str) -> GoogleConfig {
    GoogleConfig {
        client_id: "test-client-id".to_string(),
        client_secret: "test-client-secret".to_string(),
        redirect_uri: "http://localhost:3000/login".to_string(),
        auth_base: base.to_string(),
        token_base: base.to_string(),
        people_base: base.to_string(),
    }
}

pub fn stripe_config(base: &str) -> StripeConfig {
    StripeConfig {
        secret_key: "sk_test_123".to_string(),
        webhook_secret: "whsec_test_123".to_string(),
        api_base: base.to_string(),
        connect_base: base.to_string(),
    }
}

pub fn openai_config(base: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "sk-test".to_string(),
        api_base: base.to_string(),
        model: "gpt-4-1106-preview".to_string(),
    }
}

pub fn email_config(base: &str) -> EmailConfig {
    EmailConfig {
        api_key: "xkeysib-test".to_string(),
        api_base: base.to_string(),
        sender: "noreply@example.com".to_string(),
        contact_recipient: "hello@example.com".to_string(),
    }
}

pub fn config_with_bases(base: &str) -> Config {
    Config {
        port: 0,
        secure_cookies: false,
        enforce_https: false,
        cookie_secret: TEST_SECRET.to_string(),
        public_dir: PathBuf::from("client"),
        google: google_config(base),
        stripe: stripe_config(base),
        openai: openai_config(base),
        email: email_config(base),
    }
}

/// Schema whose clients all point at `base`.
pub fn schema_for(db: &Database, base: &str) -> AppSchema {
    build_schema(
        db.clone(),
        GoogleClient::new(google_config(base)).unwrap(),
        StripeClient::new(stripe_config(base)).unwrap(),
        OpenAiClient::new(openai_config(base)).unwrap(),
    )
}

pub fn user(id: &str, name: &str, token: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        avatar: format!("https://avatars.example.com/{id}.png"),
        contact: format!("{id}@example.com"),
        token: token.to_string(),
        payment_id: None,
        package: None,
        watched: Vec::new(),
        bookmarks: Vec::new(),
    }
}

pub fn lesson(id: &str, title: &str, creator: &str) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        meta: "A short lesson summary.".to_string(),
        category: vec!["math".to_string()],
        start_date: LessonDate("2024-01-01".to_string()),
        end_date: LessonDate("Present".to_string()),
        video: format!("https://videos.example.com/{id}.mp4"),
        duration: 10.0,
        creator: creator.to_string(),
    }
}

pub fn playlist(id: &str, name: &str, creator: &str, public: bool) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        creator: creator.to_string(),
        public,
        plan: Vec::new(),
    }
}

pub fn creds(viewer: &str, token: &str) -> Credentials {
    Credentials {
        viewer: Some(viewer.to_string()),
        csrf_token: Some(token.to_string()),
    }
}

/// Execute a query anonymously with a fresh per-request loader set.
pub async fn execute(schema: &AppSchema, db: &Database, query: &str) -> Response {
    execute_as(schema, db, query, Credentials::default()).await
}

/// Execute a query with the given credentials.
pub async fn execute_as(
    schema: &AppSchema,
    db: &Database,
    query: &str,
    credentials: Credentials,
) -> Response {
    let request = Request::new(query)
        .data(Loaders::new(db))
        .data(credentials)
        .data(CookieSink::default());
    schema.execute(request).await
}
