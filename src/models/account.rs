use serde::Serialize;

/// Success payload of the atomic account transaction.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResult {
    pub user_id: String,
    pub wedding_id: String,
    pub email: String,
    pub slug: String,
    /// "Alice & Bob" - used in the welcome email
    pub display_name: String,
    pub guest_code: String,
}
