use serde::{Deserialize, Serialize};

/// A checkout-in-progress, created when the couple starts the hosted
/// checkout and keyed by the Stripe checkout session id once that
/// session exists.
///
/// `completed_at` is the idempotency marker: it is set exactly once,
/// inside the atomic account transaction, and never unset. Records are
/// never deleted by the provisioning flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSignup {
    pub id: String,
    pub stripe_session_id: Option<String>,
    pub email: String,
    pub partner_one: String,
    pub partner_two: String,
    /// Chosen site address, e.g. "alice-bob". Global uniqueness is
    /// enforced by the account transaction, not here.
    pub slug: String,
    pub theme_id: String,
    /// ISO date (YYYY-MM-DD), optional at signup time
    pub wedding_date: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePendingSignup {
    pub email: String,
    pub partner_one: String,
    pub partner_two: String,
    pub slug: String,
    pub theme_id: String,
    #[serde(default)]
    pub wedding_date: Option<String>,
}
