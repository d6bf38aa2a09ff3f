use serde::{Deserialize, Serialize};

/// Tenant profile. `id` is the auth provider's user id (1:1 with the
/// auth identity); created only inside the atomic account transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub subscription_status: String,
    pub subscription_ends_at: Option<i64>,
    pub stripe_customer_id: Option<String>,
    pub created_at: i64,
}
