//! Contact form delivery through a transactional email API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

/// A message submitted through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    /// Forward a contact form submission to the site mailbox.
    pub async fn send_contact(&self, form: &ContactForm) -> AppResult<()> {
        let body = json!({
            "sender": { "email": self.config.sender },
            "to": [{ "email": self.config.contact_recipient }],
            "replyTo": { "email": form.email, "name": form.name },
            "subject": format!("New message from {}", form.name),
            "textContent": form.message,
        });

        let response = self
            .http
            .post(format!("{}/v3/smtp/email", self.config.api_base))
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!(
                "provider returned {status}: {detail}"
            )));
        }
        Ok(())
    }
}
