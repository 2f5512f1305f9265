use serde::Serialize;

use crate::configuration::EmailClientSettings;
use crate::error::{AppError, EmailError};
use crate::validators::is_valid_email;

/// Client for the transactional email HTTP API
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
    authorization_token: String,
}

/// Validated sender address
#[derive(Clone, Debug)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let email = is_valid_email(s).map_err(|e| EmailError::InvalidRecipient(e.to_string()))?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SenderEmail,
        authorization_token: String,
        timeout: std::time::Duration,
    ) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sender,
            authorization_token,
        })
    }

    pub fn from_settings(settings: &EmailClientSettings) -> Result<Self, AppError> {
        Self::new(
            settings.base_url.clone(),
            SenderEmail::parse(&settings.sender_email)?,
            settings.authorization_token.clone(),
            settings.timeout(),
        )
    }

    /// Send one email. A single attempt; any transport failure or non-2xx
    /// status is returned as `EmailError::SendFailed`.
    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner(),
            to: recipient,
            subject,
            html_body: html_content,
            text_body: text_content,
        };

        self.http_client
            .post(&url)
            .header("X-Postmark-Server-Token", &self.authorization_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send email");
                EmailError::SendFailed(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!(error = %e, "Email service returned error");
                EmailError::SendFailed(e.to_string())
            })?;

        Ok(())
    }

    /// Send the account verification link to a newly registered user.
    pub async fn send_verification_email(
        &self,
        recipient: &str,
        username: &str,
        verification_link: &str,
    ) -> Result<(), EmailError> {
        let html = format!(
            "Welcome, {}!<br />Click <a href=\"{}\">here</a> to verify your account.",
            username, verification_link
        );
        let text = format!(
            "Welcome, {}!\nVisit {} to verify your account.",
            username, verification_link
        );

        self.send_email(recipient, "Verify your account", &html, &text)
            .await
    }
}
