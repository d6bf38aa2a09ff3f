//! The payment-to-account provisioning orchestrator.
//!
//! State machine:
//!
//! ```text
//! VerifyingPayment -> CheckingIdempotency -> (AlreadyCompleted
//!     | CreatingIdentity -> RunningTransaction
//!         -> (Success | RollingBack -> Failed))
//! ```
//!
//! Every step strictly depends on the previous one, so the flow is a
//! straight line of awaits; the only branch that creates cleanup work
//! is a transaction failure after the auth identity exists, which lands
//! in `RollingBack`. Collaborators are injected as trait objects - no
//! process-wide singletons - so every path is testable with hand-rolled
//! mocks.

use async_trait::async_trait;

use crate::db::queries::ProvisionTxError;
use crate::error::{msg, AppError, Result};
use crate::models::{AccountResult, PendingSignup};
use crate::password::TempPassword;

/// Outcome of a checkout-session lookup at the payment processor.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    pub paid: bool,
    /// Processor-side customer id, linked to the profile on success
    pub customer_id: Option<String>,
}

/// Read-only lookup of a checkout session's payment state.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, session_id: &str) -> Result<PaymentVerification>;
}

/// Errors from the auth provider, split so the orchestrator can tell
/// "user already exists" (client error, no retry, no rollback) from
/// infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("email already registered")]
    EmailTaken,

    #[error("auth service error: {0}")]
    Upstream(String),
}

/// Create/delete auth identities at the external auth provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity with a temporary credential; returns the user id.
    async fn create_user(
        &self,
        email: &str,
        password: &TempPassword,
    ) -> std::result::Result<String, IdentityError>;

    /// Delete an identity (rollback path).
    async fn delete_user(&self, user_id: &str) -> std::result::Result<(), IdentityError>;
}

/// The signup record store plus the atomic account transaction.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_signup_by_session(&self, session_id: &str) -> Result<Option<PendingSignup>>;

    async fn create_account_from_payment(
        &self,
        user_id: &str,
        pending_signup_id: &str,
        stripe_customer_id: Option<&str>,
    ) -> std::result::Result<AccountResult, ProvisionTxError>;
}

/// Best-effort delivery of the sign-in magic link after provisioning.
#[async_trait]
pub trait MagicLinkDelivery: Send + Sync {
    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<()>;
}

/// Terminal success states. Failures surface as [`AppError`].
#[derive(Debug)]
pub enum Provisioned {
    Created {
        account: AccountResult,
        /// false means the user must fall back to password reset
        magic_link_sent: bool,
    },
    /// Idempotent replay: the signup was already provisioned. Carries
    /// the slug chosen by the original request.
    AlreadyCompleted { slug: String },
}

pub struct Provisioner<'a> {
    payments: &'a dyn PaymentVerifier,
    identity: &'a dyn IdentityProvider,
    accounts: &'a dyn AccountStore,
    /// None when email delivery is not configured; the success response
    /// then takes the password-reset shape.
    magic_link: Option<&'a dyn MagicLinkDelivery>,
    /// Base URL of the couple-facing site, for the magic-link redirect
    app_url: &'a str,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        payments: &'a dyn PaymentVerifier,
        identity: &'a dyn IdentityProvider,
        accounts: &'a dyn AccountStore,
        magic_link: Option<&'a dyn MagicLinkDelivery>,
        app_url: &'a str,
    ) -> Self {
        Self {
            payments,
            identity,
            accounts,
            magic_link,
            app_url,
        }
    }

    /// Run the full provisioning flow for one checkout session.
    pub async fn provision(&self, session_id: &str) -> Result<Provisioned> {
        // VerifyingPayment
        if session_id.trim().is_empty() {
            return Err(AppError::BadRequest(msg::SESSION_ID_REQUIRED.into()));
        }

        let verification = self.payments.verify(session_id).await?;
        if !verification.paid {
            tracing::info!(session_id, "Rejecting unpaid checkout session");
            return Err(AppError::BadRequest(msg::PAYMENT_NOT_COMPLETED.into()));
        }

        // CheckingIdempotency
        let signup = self
            .accounts
            .find_signup_by_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(msg::SIGNUP_NOT_FOUND.into()))?;

        if signup.completed_at.is_some() {
            tracing::info!(
                session_id,
                slug = %signup.slug,
                "Signup already completed, replaying success"
            );
            return Ok(Provisioned::AlreadyCompleted { slug: signup.slug });
        }

        // CreatingIdentity
        let password = TempPassword::generate();
        let user_id = match self.identity.create_user(&signup.email, &password).await {
            Ok(id) => id,
            Err(IdentityError::EmailTaken) => {
                tracing::info!(session_id, "Identity creation refused: email already registered");
                return Err(AppError::AccountExists);
            }
            Err(IdentityError::Upstream(detail)) => {
                return Err(AppError::Upstream(format!("identity create: {}", detail)));
            }
        };
        drop(password);

        // RunningTransaction
        let tx_result = self
            .accounts
            .create_account_from_payment(
                &user_id,
                &signup.id,
                verification.customer_id.as_deref(),
            )
            .await;

        let account = match tx_result {
            Ok(account) => account,
            Err(ProvisionTxError::AlreadyCompleted { slug }) => {
                // Another request won the race and owns the account; our
                // identity is an orphan and must go, but the caller still
                // gets the idempotent success.
                tracing::warn!(
                    session_id,
                    slug = %slug,
                    "Concurrent provisioning race lost, rolling back duplicate identity"
                );
                self.roll_back_identity(&user_id).await;
                return Ok(Provisioned::AlreadyCompleted { slug });
            }
            Err(ProvisionTxError::SignupNotFound) => {
                self.roll_back_identity(&user_id).await;
                return Err(AppError::NotFound(msg::SIGNUP_NOT_FOUND.into()));
            }
            Err(e @ ProvisionTxError::SlugConflict) => {
                // Post-payment slug collision is surfaced as a hard error
                // rather than auto-suffixed; support has to step in.
                self.roll_back_identity(&user_id).await;
                return Err(AppError::Upstream(format!("account transaction: {}", e)));
            }
            Err(e) => {
                self.roll_back_identity(&user_id).await;
                return Err(AppError::Upstream(format!("account transaction: {}", e)));
            }
        };

        // Success: best-effort magic link. A failure here downgrades the
        // response shape but never fails the request.
        let redirect_to = format!("{}/{}/admin", self.app_url, account.slug);
        let magic_link_sent = match self.magic_link {
            Some(delivery) => match delivery.send_magic_link(&account.email, &redirect_to).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        session_id,
                        user_id = %account.user_id,
                        "Magic link delivery failed, user will need password reset: {}",
                        e
                    );
                    false
                }
            },
            None => {
                tracing::warn!(session_id, "Email delivery not configured, skipping magic link");
                false
            }
        };

        tracing::info!(
            session_id,
            user_id = %account.user_id,
            wedding_id = %account.wedding_id,
            slug = %account.slug,
            magic_link_sent,
            "Account provisioned"
        );

        Ok(Provisioned::Created {
            account,
            magic_link_sent,
        })
    }

    /// RollingBack: delete the identity created this request. Failure is
    /// logged at the highest severity (an orphaned identity needs manual
    /// remediation) but never alters the response already chosen.
    async fn roll_back_identity(&self, user_id: &str) {
        if let Err(e) = self.identity.delete_user(user_id).await {
            tracing::error!(
                user_id,
                "CRITICAL: failed to delete orphaned auth identity after provisioning \
                 failure, manual cleanup required: {}",
                e
            );
        } else {
            tracing::info!(user_id, "Rolled back auth identity");
        }
    }
}
