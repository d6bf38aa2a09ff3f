mod stripe;

pub use stripe::{CheckoutSession, StripeClient};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PendingSignup;

/// A hosted checkout session created at the payment processor.
#[derive(Debug, Clone)]
pub struct CreatedCheckout {
    pub session_id: String,
    pub url: String,
}

/// Creation side of the processor integration (signup checkout flow).
/// Verification lives on [`crate::provisioning::PaymentVerifier`].
#[async_trait]
pub trait CheckoutSessions: Send + Sync {
    async fn create_session(
        &self,
        signup: &PendingSignup,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CreatedCheckout>;
}
