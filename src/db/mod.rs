mod from_row;
pub mod queries;
mod schema;

pub use from_row::FromRow;
pub use schema::init_db;

use std::sync::Arc;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;
use crate::models::{AccountResult, PendingSignup};
use crate::payments::CheckoutSessions;
use crate::provisioning::{AccountStore, IdentityProvider, MagicLinkDelivery, PaymentVerifier};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state. External collaborators are held as trait objects
/// so the provisioning logic stays unit-testable without network mocks;
/// `None` means the integration is not configured (routes needing it
/// answer 503).
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Base URL of this API (Stripe redirects are built from it)
    pub base_url: String,
    /// Base URL of the couple-facing site
    pub app_url: String,
    pub payment_verifier: Option<Arc<dyn PaymentVerifier>>,
    pub checkout_sessions: Option<Arc<dyn CheckoutSessions>>,
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub magic_link: Option<Arc<dyn MagicLinkDelivery>>,
}

pub fn create_pool(database_path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Pool::builder().max_size(10).build(manager)
}

/// Production [`AccountStore`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteAccountStore {
    pool: DbPool,
}

impl SqliteAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn find_signup_by_session(&self, session_id: &str) -> Result<Option<PendingSignup>> {
        let conn = self.pool.get()?;
        queries::get_pending_signup_by_session(&conn, session_id)
    }

    async fn create_account_from_payment(
        &self,
        user_id: &str,
        pending_signup_id: &str,
        stripe_customer_id: Option<&str>,
    ) -> std::result::Result<AccountResult, queries::ProvisionTxError> {
        let mut conn = self.pool.get().map_err(|e| {
            queries::ProvisionTxError::Integrity(format!("connection pool: {}", e))
        })?;
        queries::create_account_from_payment(
            &mut conn,
            user_id,
            pending_signup_id,
            stripe_customer_id,
        )
    }
}
