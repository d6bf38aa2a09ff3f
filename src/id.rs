//! Prefixed ID generation for Evermore entities.
//!
//! IDs use an `ev_` brand prefix so they can never be confused with
//! payment provider IDs (Stripe's `cs_`, `cus_`, `pi_`, etc.) or with
//! auth provider UUIDs.
//!
//! Format: `ev_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// Entity types that have prefixed IDs in Evermore.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    PendingSignup,
    Wedding,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::PendingSignup => "ev_ps",
            Self::Wedding => "ev_wed",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
