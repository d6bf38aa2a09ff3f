//! GoTrue-compatible auth admin client.
//!
//! Identity creation/deletion and magic-link generation go through the
//! auth provider's admin API with a service-role key. The service key
//! never leaves this process; the temporary password never leaves the
//! create call.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::email::{EmailSendResult, EmailService};
use crate::error::{AppError, Result};
use crate::password::TempPassword;
use crate::provisioning::{IdentityError, IdentityProvider, MagicLinkDelivery};

#[derive(Debug, Deserialize)]
struct AdminUserResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GenerateLinkResponse {
    action_link: String,
}

#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/{}", self.base_url, path)
    }

    /// Generate a one-time sign-in link for `email`. The link is only
    /// ever handed to the email service, never returned to a client.
    pub async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> Result<String> {
        let response = self
            .client
            .post(self.admin_url("generate_link"))
            .bearer_auth(&self.service_key)
            .json(&json!({
                "type": "magiclink",
                "email": email,
                "redirect_to": redirect_to,
            }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth generate_link: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "auth generate_link failed ({}): {}",
                status, body
            )));
        }

        let link: GenerateLinkResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("auth generate_link parse: {}", e)))?;
        Ok(link.action_link)
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn create_user(
        &self,
        email: &str,
        password: &TempPassword,
    ) -> std::result::Result<String, IdentityError> {
        let response = self
            .client
            .post(self.admin_url("users"))
            .bearer_auth(&self.service_key)
            .json(&json!({
                "email": email,
                "password": password.expose(),
                "email_confirm": true,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(format!("create user request: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            return Err(IdentityError::EmailTaken);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("already been registered") || body.contains("already registered") {
                return Err(IdentityError::EmailTaken);
            }
            return Err(IdentityError::Upstream(format!(
                "create user failed ({}): {}",
                status, body
            )));
        }

        let user: AdminUserResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(format!("create user parse: {}", e)))?;
        Ok(user.id)
    }

    async fn delete_user(&self, user_id: &str) -> std::result::Result<(), IdentityError> {
        let response = self
            .client
            .delete(self.admin_url(&format!("users/{}", user_id)))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(format!("delete user request: {}", e)))?;

        // 404 counts as deleted: the orphan is already gone.
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(IdentityError::Upstream(format!(
            "delete user failed ({}): {}",
            status, body
        )))
    }
}

/// Production magic-link delivery: generate the action link at the auth
/// provider, then mail it via the email service.
#[derive(Clone)]
pub struct GoTrueMagicLink {
    auth: Arc<GoTrueClient>,
    email: Arc<EmailService>,
}

impl GoTrueMagicLink {
    pub fn new(auth: Arc<GoTrueClient>, email: Arc<EmailService>) -> Self {
        Self { auth, email }
    }
}

#[async_trait]
impl MagicLinkDelivery for GoTrueMagicLink {
    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<()> {
        let action_link = self.auth.generate_magic_link(email, redirect_to).await?;

        match self.email.send_magic_link_email(email, &action_link).await? {
            EmailSendResult::Sent => Ok(()),
            EmailSendResult::NoApiKey => Err(AppError::Upstream(
                "magic link generated but no email API key configured".into(),
            )),
        }
    }
}
