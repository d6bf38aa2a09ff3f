use serde::{Deserialize, Serialize};

/// The tenant workspace: one wedding site per couple, addressed by a
/// globally unique slug. Created together with its owner `Profile`
/// inside the atomic account transaction - never partially.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wedding {
    pub id: String,
    pub owner_id: String,
    pub slug: String,
    pub theme_id: String,
    pub partner_one: String,
    pub partner_two: String,
    pub wedding_date: Option<String>,
    /// Code guests use to unlock the private parts of the site
    pub guest_code: String,
    pub created_at: i64,
}
