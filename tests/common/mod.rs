//! Test utilities, fixtures and mock collaborators for Evermore
//! integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::routing::{get, post};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub use evermore::db::{init_db, queries, AppState, DbPool};
pub use evermore::error::{AppError, Result};
pub use evermore::handlers::signup::{initiate_checkout, verify_payment};
pub use evermore::models::*;
pub use evermore::password::TempPassword;
pub use evermore::payments::{CheckoutSessions, CreatedCheckout};
pub use evermore::provisioning::{
    AccountStore, IdentityError, IdentityProvider, MagicLinkDelivery, PaymentVerification,
    PaymentVerifier, Provisioned, Provisioner,
};

use evermore::db::queries::ProvisionTxError;

/// In-memory pool with a single connection so every request and every
/// assertion sees the same database.
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Insert a pending signup attached to `session_id`.
pub fn create_test_signup(
    conn: &rusqlite::Connection,
    session_id: &str,
    slug: &str,
) -> PendingSignup {
    let input = CreatePendingSignup {
        email: "alice@example.com".to_string(),
        partner_one: "Alice".to_string(),
        partner_two: "Bob".to_string(),
        slug: slug.to_string(),
        theme_id: "classic".to_string(),
        wedding_date: Some("2027-06-19".to_string()),
    };
    let signup = queries::create_pending_signup(conn, &input).expect("create signup");
    queries::set_pending_signup_session(conn, &signup.id, session_id).expect("set session");
    PendingSignup {
        stripe_session_id: Some(session_id.to_string()),
        ..signup
    }
}

/// Mark a signup completed directly (simulates a previous provisioning run).
pub fn mark_signup_completed(conn: &rusqlite::Connection, signup_id: &str, at: i64) {
    conn.execute(
        "UPDATE pending_signups SET completed_at = ?1 WHERE id = ?2",
        params![at, signup_id],
    )
    .expect("mark completed");
}

// ============ Mock collaborators ============

pub struct MockPayments {
    pub paid: bool,
    pub customer_id: Option<String>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockPayments {
    pub fn paid() -> Self {
        Self {
            paid: true,
            customer_id: Some("cus_test_123".to_string()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unpaid() -> Self {
        Self {
            paid: false,
            customer_id: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            paid: false,
            customer_id: None,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentVerifier for MockPayments {
    async fn verify(&self, _session_id: &str) -> Result<PaymentVerification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Upstream("stripe: connection refused".into()));
        }
        Ok(PaymentVerification {
            paid: self.paid,
            customer_id: self.customer_id.clone(),
        })
    }
}

pub struct MockIdentity {
    pub user_id: String,
    pub email_taken: bool,
    pub fail_delete: bool,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub deleted_ids: Mutex<Vec<String>>,
    /// Captured temp credentials, so tests can assert they never leak
    pub seen_passwords: Mutex<Vec<String>>,
}

impl MockIdentity {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email_taken: false,
            fail_delete: false,
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            deleted_ids: Mutex::new(Vec::new()),
            seen_passwords: Mutex::new(Vec::new()),
        }
    }

    pub fn email_taken() -> Self {
        Self {
            email_taken: true,
            ..Self::new("unused")
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn create_user(
        &self,
        _email: &str,
        password: &TempPassword,
    ) -> std::result::Result<String, IdentityError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_passwords
            .lock()
            .unwrap()
            .push(password.expose().to_string());
        if self.email_taken {
            return Err(IdentityError::EmailTaken);
        }
        Ok(self.user_id.clone())
    }

    async fn delete_user(&self, user_id: &str) -> std::result::Result<(), IdentityError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.deleted_ids.lock().unwrap().push(user_id.to_string());
        if self.fail_delete {
            return Err(IdentityError::Upstream("auth: 502".into()));
        }
        Ok(())
    }
}

pub struct MockMagicLink {
    pub fail: bool,
    pub calls: AtomicUsize,
    pub sent_to: Mutex<Vec<String>>,
}

impl MockMagicLink {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            sent_to: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
            sent_to: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MagicLinkDelivery for MockMagicLink {
    async fn send_magic_link(&self, email: &str, _redirect_to: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent_to.lock().unwrap().push(email.to_string());
        if self.fail {
            return Err(AppError::Upstream("resend: 500".into()));
        }
        Ok(())
    }
}

/// Scripted transaction behavior for orchestrator-level tests.
pub enum TxBehavior {
    Succeed,
    SignupNotFound,
    AlreadyCompleted(&'static str),
    SlugConflict,
    Integrity(&'static str),
}

pub struct MockAccounts {
    pub signup: Option<PendingSignup>,
    pub behavior: TxBehavior,
    pub find_calls: AtomicUsize,
    pub tx_calls: AtomicUsize,
}

impl MockAccounts {
    pub fn with_fresh_signup(behavior: TxBehavior) -> Self {
        Self {
            signup: Some(PendingSignup {
                id: "ev_ps_0123456789abcdef0123456789abcdef".to_string(),
                stripe_session_id: Some("cs_test_123".to_string()),
                email: "alice@example.com".to_string(),
                partner_one: "Alice".to_string(),
                partner_two: "Bob".to_string(),
                slug: "alice-bob".to_string(),
                theme_id: "classic".to_string(),
                wedding_date: Some("2027-06-19".to_string()),
                created_at: now(),
                completed_at: None,
            }),
            behavior,
            find_calls: AtomicUsize::new(0),
            tx_calls: AtomicUsize::new(0),
        }
    }

    pub fn completed_signup() -> Self {
        let mut mock = Self::with_fresh_signup(TxBehavior::Succeed);
        if let Some(signup) = mock.signup.as_mut() {
            signup.completed_at = Some(now() - 3600);
        }
        mock
    }

    pub fn empty() -> Self {
        Self {
            signup: None,
            behavior: TxBehavior::Succeed,
            find_calls: AtomicUsize::new(0),
            tx_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AccountStore for MockAccounts {
    async fn find_signup_by_session(&self, _session_id: &str) -> Result<Option<PendingSignup>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.signup.clone())
    }

    async fn create_account_from_payment(
        &self,
        user_id: &str,
        _pending_signup_id: &str,
        _stripe_customer_id: Option<&str>,
    ) -> std::result::Result<AccountResult, ProvisionTxError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            TxBehavior::Succeed => {
                let signup = self.signup.as_ref().expect("scripted signup");
                Ok(AccountResult {
                    user_id: user_id.to_string(),
                    wedding_id: "ev_wed_0123456789abcdef0123456789abcdef".to_string(),
                    email: signup.email.clone(),
                    slug: signup.slug.clone(),
                    display_name: format!("{} & {}", signup.partner_one, signup.partner_two),
                    guest_code: "ABCD2345".to_string(),
                })
            }
            TxBehavior::SignupNotFound => Err(ProvisionTxError::SignupNotFound),
            TxBehavior::AlreadyCompleted(slug) => Err(ProvisionTxError::AlreadyCompleted {
                slug: slug.to_string(),
            }),
            TxBehavior::SlugConflict => Err(ProvisionTxError::SlugConflict),
            TxBehavior::Integrity(detail) => Err(ProvisionTxError::Integrity(detail.to_string())),
        }
    }
}

pub struct MockCheckout {
    pub session_id: String,
    pub calls: AtomicUsize,
}

impl MockCheckout {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CheckoutSessions for MockCheckout {
    async fn create_session(
        &self,
        _signup: &PendingSignup,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CreatedCheckout> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedCheckout {
            session_id: self.session_id.clone(),
            url: format!("https://checkout.stripe.com/c/pay/{}", self.session_id),
        })
    }
}

// ============ App / state builders ============

/// State with every integration wired to a mock.
pub fn test_state(
    pool: DbPool,
    payments: Arc<dyn PaymentVerifier>,
    identity: Arc<dyn IdentityProvider>,
    magic_link: Option<Arc<dyn MagicLinkDelivery>>,
    checkout: Option<Arc<dyn CheckoutSessions>>,
) -> AppState {
    AppState {
        db: pool,
        base_url: "http://localhost:3000".to_string(),
        app_url: "http://localhost:3000".to_string(),
        payment_verifier: Some(payments),
        checkout_sessions: checkout,
        identity: Some(identity),
        magic_link,
    }
}

/// State with nothing configured (503 behavior).
pub fn unconfigured_state(pool: DbPool) -> AppState {
    AppState {
        db: pool,
        base_url: "http://localhost:3000".to_string(),
        app_url: "http://localhost:3000".to_string(),
        payment_verifier: None,
        checkout_sessions: None,
        identity: None,
        magic_link: None,
    }
}

/// Router with the public signup endpoints (no rate limiting in tests).
pub fn signup_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(evermore::handlers::health))
        .route("/signup/checkout", post(initiate_checkout))
        .route("/signup/verify-payment", post(verify_payment))
        .with_state(state)
}

/// POST a JSON body and return (status, parsed JSON body).
pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(axum::body::Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
