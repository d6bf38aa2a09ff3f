//! Email service for sending sign-in magic links after provisioning.
//!
//! Sends via the Resend API when an API key is configured; otherwise
//! reports `NoApiKey` and lets the caller downgrade to the
//! password-reset flow. Transient failures (network, 5xx, 429) retry
//! with exponential backoff; 4xx fails immediately.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Retry delays in seconds (exponential backoff: 1s, 4s, 16s)
const RETRY_DELAYS: &[u64] = &[1, 4, 16];

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Result of attempting to send a magic-link email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSendResult {
    Sent,
    /// No Resend API key configured for this deployment
    NoApiKey,
}

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    text: String,
    html: String,
}

#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    #[allow(dead_code)]
    id: String,
}

#[derive(Clone)]
pub struct EmailService {
    api_key: Option<String>,
    from_email: String,
    http_client: Client,
}

impl EmailService {
    pub fn new(api_key: Option<String>, from_email: String) -> Self {
        Self {
            api_key,
            from_email,
            http_client: Client::new(),
        }
    }

    /// Send the post-signup magic-link email. The link itself is the
    /// only credential involved; no password ever appears here.
    pub async fn send_magic_link_email(
        &self,
        to_email: &str,
        action_link: &str,
    ) -> Result<EmailSendResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("No Resend API key configured, cannot send magic link email");
            return Ok(EmailSendResult::NoApiKey);
        };

        let subject = "Your wedding site is ready".to_string();
        let text = format!(
            "Your wedding site is ready!\n\nYour payment was received and your site has been created.\n\nClick the link below to sign in and start customizing:\n\n{}\n\nThis link can only be used once. If it expires, use \"Forgot password\" on the login page.\n\nIf you didn't sign up, you can ignore this email.",
            action_link
        );
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
<h2 style="color: #333;">Your wedding site is ready</h2>
<p>Your payment was received and your site has been created.</p>
<div style="margin: 24px 0; text-align: center;">
<a href="{}" style="background: #333; color: #fff; padding: 14px 28px; border-radius: 8px; text-decoration: none; display: inline-block;">Sign in to your site</a>
</div>
<p style="color: #666;">This link can only be used once. If it expires, use "Forgot password" on the login page.</p>
<hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
<p style="color: #999; font-size: 12px;">If you didn't sign up, you can ignore this email.</p>
</body>
</html>"#,
            action_link
        );

        let request = ResendEmailRequest {
            from: &self.from_email,
            to: vec![to_email],
            subject,
            text,
            html,
        };

        self.send_request_with_retry(api_key, &request, to_email).await
    }

    /// Send a request to Resend with exponential backoff retry.
    async fn send_request_with_retry(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
        to_email: &str,
    ) -> Result<EmailSendResult> {
        let mut last_error: Option<AppError> = None;

        for (attempt, delay_secs) in std::iter::once(&0u64).chain(RETRY_DELAYS).enumerate() {
            if *delay_secs > 0 {
                tracing::warn!(
                    attempt,
                    delay_secs,
                    "Retrying magic link email after transient failure"
                );
                tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
            }

            match self.send_resend_request(api_key, request).await {
                Ok(()) => {
                    tracing::info!(to = %to_email, attempt, "Magic link email sent via Resend");
                    return Ok(EmailSendResult::Sent);
                }
                Err((error, is_transient)) => {
                    if is_transient {
                        last_error = Some(error);
                    } else {
                        return Err(error);
                    }
                }
            }
        }

        tracing::error!(
            to = %to_email,
            attempts = RETRY_DELAYS.len() + 1,
            "Magic link email failed after all retries"
        );
        Err(last_error.unwrap_or_else(|| {
            AppError::Upstream("email service: all retries exhausted".into())
        }))
    }

    /// Returns Ok(()) on success, or Err((error, is_transient)) on failure.
    async fn send_resend_request(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
    ) -> std::result::Result<(), (AppError, bool)> {
        let response = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                // Network errors are transient
                (AppError::Upstream(format!("email service: {}", e)), true)
            })?;

        let status = response.status();

        if status.is_success() {
            let _result: ResendEmailResponse = response.json().await.map_err(|e| {
                (
                    AppError::Upstream(format!("email service response: {}", e)),
                    false,
                )
            })?;
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            let is_transient = status.as_u16() == 429 || status.is_server_error();

            if is_transient {
                tracing::warn!(status = %status, body = %body, "Resend returned transient error");
            } else {
                tracing::error!(status = %status, body = %body, "Resend returned non-transient error");
            }

            Err((
                AppError::Upstream(format!("email service: {} - {}", status, body)),
                is_transient,
            ))
        }
    }
}
