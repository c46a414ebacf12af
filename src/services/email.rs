// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound e-mail through an HTTP mail relay.
//!
//! Without relay configuration (local development) messages are written to
//! the log instead of being sent.

use crate::config::EmailConfig;
use crate::error::AppError;
use serde::Serialize;

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
    html: String,
}

#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    config: Option<EmailConfig>,
}

impl EmailService {
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Send the login link for `to`.
    pub async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), AppError> {
        let Some(config) = &self.config else {
            tracing::warn!(to = %to, link = %link, "Mail relay not configured, magic link logged only");
            return Ok(());
        };

        let message = RelayMessage {
            from: &config.from,
            to,
            subject: "Your TalentHub login link",
            text: format!(
                "Click the link below to log in to TalentHub:\n\n{}\n\n\
                 The link can be used once. If you did not request it, ignore this email.",
                link
            ),
            html: format!(
                "<p>Click the button below to log in to TalentHub.</p>\
                 <p><a href=\"{0}\">Log in</a></p>\
                 <p>Or paste this link into your browser: {0}</p>\
                 <p>The link can be used once. If you did not request it, ignore this email.</p>",
                link
            ),
        };

        let response = self
            .client
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("relay returned {}: {}", status, body)));
        }

        tracing::info!(to = %to, "Magic link email sent");
        Ok(())
    }
}
