use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::PendingSignup;
use crate::provisioning::{PaymentVerification, PaymentVerifier};

use super::{CheckoutSessions, CreatedCheckout};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Minimal Stripe checkout-session shape we care about.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_status: String,
    pub customer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    /// Pre-configured Price ID for the one-off site purchase
    price_id: String,
}

impl StripeClient {
    pub fn new(secret_key: String, price_id: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            price_id,
        }
    }

    /// Retrieve a checkout session. Read-only; errors are internal
    /// detail and get sanitized at the response boundary.
    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let response = self
            .client
            .get(format!(
                "{}/checkout/sessions/{}",
                STRIPE_API_BASE,
                urlencoding::encode(session_id)
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Stripe session lookup failed ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Stripe response: {}", e)))
    }
}

#[async_trait]
impl PaymentVerifier for StripeClient {
    async fn verify(&self, session_id: &str) -> Result<PaymentVerification> {
        let session = self.retrieve_checkout_session(session_id).await?;
        Ok(PaymentVerification {
            paid: session.payment_status == "paid",
            customer_id: session.customer,
        })
    }
}

#[async_trait]
impl CheckoutSessions for StripeClient {
    /// Create a checkout session using the pre-configured price. The
    /// pending-signup id travels in metadata so webhook/verify flows can
    /// correlate it back.
    async fn create_session(
        &self,
        signup: &PendingSignup,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CreatedCheckout> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "payment"),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
                ("customer_email", signup.email.as_str()),
                ("line_items[0][price]", self.price_id.as_str()),
                ("line_items[0][quantity]", "1"),
                ("metadata[pending_signup_id]", signup.id.as_str()),
                ("metadata[slug]", signup.slug.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Stripe checkout creation failed: {}",
                error_text
            )));
        }

        let session: CreateCheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Stripe response: {}", e)))?;

        Ok(CreatedCheckout {
            session_id: session.id,
            url: session.url,
        })
    }
}
