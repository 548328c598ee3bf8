//! Google OAuth sign-in and People API profile lookup.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::error::{AppError, AppResult};

const SCOPES: &str = "https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/userinfo.profile";

/// Profile details pulled from the People API after consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub email: String,
}

#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    /// Consent screen URL the client redirects users to.
    pub fn auth_url(&self) -> AppResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/o/oauth2/v2/auth", self.config.auth_base),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "online"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|err| AppError::Google(err.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an OAuth code for the viewer's profile.
    pub async fn log_in(&self, code: &str) -> AppResult<GoogleProfile> {
        let token: TokenResponse = self
            .http
            .post(format!("{}/token", self.config.token_base))
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let person: Person = self
            .http
            .get(format!("{}/v1/people/me", self.config.people_base))
            .query(&[("personFields", "names,emailAddresses,photos")])
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        profile_from(person)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    names: Vec<PersonName>,
    #[serde(default)]
    photos: Vec<PersonPhoto>,
    #[serde(default)]
    email_addresses: Vec<PersonEmail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonName {
    display_name: Option<String>,
    metadata: Option<NameMetadata>,
}

#[derive(Deserialize)]
struct NameMetadata {
    source: Option<NameSource>,
}

#[derive(Deserialize)]
struct NameSource {
    id: Option<String>,
}

#[derive(Deserialize)]
struct PersonPhoto {
    url: Option<String>,
}

#[derive(Deserialize)]
struct PersonEmail {
    value: Option<String>,
}

/// A usable profile needs all four of id, name, avatar, and email.
fn profile_from(person: Person) -> AppResult<GoogleProfile> {
    let name_entry = person.names.first();
    let id = name_entry
        .and_then(|n| n.metadata.as_ref())
        .and_then(|m| m.source.as_ref())
        .and_then(|s| s.id.clone());
    let name = name_entry.and_then(|n| n.display_name.clone());
    let avatar = person.photos.first().and_then(|p| p.url.clone());
    let email = person.email_addresses.first().and_then(|e| e.value.clone());

    match (id, name, avatar, email) {
        (Some(id), Some(name), Some(avatar), Some(email)) => Ok(GoogleProfile {
            id,
            name,
            avatar,
            email,
        }),
        _ => Err(AppError::Google(
            "profile is missing required fields".to_string(),
        )),
    }
}
