//! The two public signup endpoints: checkout initiation and the
//! payment-verification / provisioning endpoint.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState, SqliteAccountStore};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::CreatePendingSignup;
use crate::provisioning::{Provisioned, Provisioner};

// ============ POST /signup/checkout ============

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub session_id: String,
}

fn valid_slug(slug: &str) -> bool {
    (3..=63).contains(&slug.len())
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Create a pending signup and a hosted Stripe checkout for it.
///
/// The slug availability check here is advisory (a better error before
/// the couple pays); the atomic account transaction is the authority.
pub async fn initiate_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreatePendingSignup>,
) -> Result<Json<CheckoutResponse>> {
    if !request.email.contains('@') || request.email.len() < 5 {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL.into()));
    }
    if !valid_slug(&request.slug) {
        return Err(AppError::BadRequest(msg::INVALID_SLUG.into()));
    }
    if request.partner_one.trim().is_empty()
        || request.partner_two.trim().is_empty()
        || request.theme_id.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "Partner names and theme are required".into(),
        ));
    }

    let checkout = state
        .checkout_sessions
        .as_deref()
        .ok_or(AppError::NotConfigured("payments"))?;

    let conn = state.db.get()?;
    if queries::slug_in_use(&conn, &request.slug)? {
        return Err(AppError::BadRequest(msg::SLUG_TAKEN.into()));
    }

    let signup = queries::create_pending_signup(&conn, &request)?;

    // Stripe substitutes the session id into the literal placeholder.
    let success_url = format!(
        "{}/signup/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
        state.app_url
    );
    let cancel_url = format!("{}/signup", state.app_url);

    let created = checkout
        .create_session(&signup, &success_url, &cancel_url)
        .await?;

    queries::set_pending_signup_session(&conn, &signup.id, &created.session_id)?;

    tracing::info!(
        signup_id = %signup.id,
        slug = %signup.slug,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        checkout_url: created.url,
        session_id: created.session_id,
    }))
}

// ============ POST /signup/verify-payment ============

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub session_id: String,
}

/// Success body. Error bodies come from [`AppError`].
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(rename = "alreadyCompleted", skip_serializing_if = "Option::is_none")]
    pub already_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub redirect: String,
    #[serde(rename = "needsPasswordReset", skip_serializing_if = "Option::is_none")]
    pub needs_password_reset: Option<bool>,
    pub message: String,
}

/// Verify a checkout session and provision the account.
///
/// Idempotent: replays (double submit, duplicate webhook-driven
/// verification) return the already-completed success shape. The
/// response never carries the temporary credential or any session
/// token; sign-in happens through the emailed magic link.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let payments = state
        .payment_verifier
        .as_deref()
        .ok_or(AppError::NotConfigured("payments"))?;
    let identity = state
        .identity
        .as_deref()
        .ok_or(AppError::NotConfigured("auth"))?;

    let accounts = SqliteAccountStore::new(state.db.clone());

    let provisioner = Provisioner::new(
        payments,
        identity,
        &accounts,
        state.magic_link.as_deref(),
        &state.app_url,
    );

    let response = match provisioner.provision(&request.session_id).await? {
        Provisioned::Created {
            account,
            magic_link_sent: true,
        } => VerifyPaymentResponse {
            success: true,
            already_completed: None,
            slug: None,
            redirect: format!("/{}/signup/check-email", account.slug),
            needs_password_reset: None,
            message: "Your account is ready. Check your email for a sign-in link.".into(),
        },
        Provisioned::Created {
            account,
            magic_link_sent: false,
        } => VerifyPaymentResponse {
            success: true,
            already_completed: None,
            slug: None,
            redirect: format!(
                "/connexion?email={}&message=account_created_email_failed",
                urlencoding::encode(&account.email)
            ),
            needs_password_reset: Some(true),
            message: "Your account is ready. Use \"Forgot password\" on the login page to sign in."
                .into(),
        },
        Provisioned::AlreadyCompleted { slug } => VerifyPaymentResponse {
            success: true,
            already_completed: Some(true),
            redirect: format!("/{}/admin", slug),
            slug: Some(slug),
            needs_password_reset: None,
            message: "This signup was already completed. You can sign in to your site.".into(),
        },
    };

    Ok(Json(response))
}
