use rand::rngs::OsRng;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::from_row::{query_one, FromRow, PENDING_SIGNUP_COLS, PROFILE_COLS, WEDDING_COLS};
use crate::error::Result;
use crate::id::EntityType;
use crate::models::{AccountResult, CreatePendingSignup, PendingSignup, Profile, Wedding};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Unambiguous uppercase alphabet for guest codes (no O/0, I/1, L).
const GUEST_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const GUEST_CODE_LEN: usize = 8;

/// Generate the access code guests type to unlock a wedding site.
pub fn generate_guest_code() -> String {
    let mut rng = OsRng;
    (0..GUEST_CODE_LEN)
        .map(|_| GUEST_CODE_ALPHABET[rng.gen_range(0..GUEST_CODE_ALPHABET.len())] as char)
        .collect()
}

// ============ Pending Signups ============

pub fn create_pending_signup(
    conn: &Connection,
    input: &CreatePendingSignup,
) -> Result<PendingSignup> {
    let id = EntityType::PendingSignup.gen_id();
    let created_at = now();

    conn.execute(
        "INSERT INTO pending_signups (id, email, partner_one, partner_two, slug, theme_id, wedding_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            &input.email,
            &input.partner_one,
            &input.partner_two,
            &input.slug,
            &input.theme_id,
            &input.wedding_date,
            created_at
        ],
    )?;

    Ok(PendingSignup {
        id,
        stripe_session_id: None,
        email: input.email.clone(),
        partner_one: input.partner_one.clone(),
        partner_two: input.partner_two.clone(),
        slug: input.slug.clone(),
        theme_id: input.theme_id.clone(),
        wedding_date: input.wedding_date.clone(),
        created_at,
        completed_at: None,
    })
}

/// Attach the Stripe checkout session id once Stripe has created it.
pub fn set_pending_signup_session(
    conn: &Connection,
    signup_id: &str,
    stripe_session_id: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE pending_signups SET stripe_session_id = ?1 WHERE id = ?2",
        params![stripe_session_id, signup_id],
    )?;
    Ok(())
}

pub fn get_pending_signup_by_session(
    conn: &Connection,
    stripe_session_id: &str,
) -> Result<Option<PendingSignup>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM pending_signups WHERE stripe_session_id = ?1",
            PENDING_SIGNUP_COLS
        ),
        &[&stripe_session_id],
    )
}

/// Cheap pre-checkout availability check. Advisory only: the account
/// transaction's UNIQUE constraint is the authoritative gate.
pub fn slug_in_use(conn: &Connection, slug: &str) -> Result<bool> {
    let taken: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM weddings WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )
        .optional()?;
    Ok(taken.is_some())
}

// ============ Profiles / Weddings ============

pub fn get_profile_by_id(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLS),
        &[&id],
    )
}

pub fn get_wedding_by_slug(conn: &Connection, slug: &str) -> Result<Option<Wedding>> {
    query_one(
        conn,
        &format!("SELECT {} FROM weddings WHERE slug = ?1", WEDDING_COLS),
        &[&slug],
    )
}

pub fn count_profiles(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
        .map_err(Into::into)
}

pub fn count_weddings(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM weddings", [], |row| row.get(0))
        .map_err(Into::into)
}

// ============ Atomic Account Transaction ============

/// Failure taxonomy of [`create_account_from_payment`]. The orchestrator
/// branches on these to pick the response: `AlreadyCompleted` is the
/// idempotent-success path, everything else triggers identity rollback.
#[derive(Debug, Error)]
pub enum ProvisionTxError {
    #[error("pending signup not found")]
    SignupNotFound,

    #[error("signup already completed")]
    AlreadyCompleted { slug: String },

    #[error("wedding slug already taken")]
    SlugConflict,

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

/// Map an INSERT failure onto the transaction's failure taxonomy.
fn map_constraint(e: rusqlite::Error) -> ProvisionTxError {
    if let rusqlite::Error::SqliteFailure(err, detail) = &e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            let detail = detail.as_deref().unwrap_or("constraint violation");
            if detail.contains("weddings.slug") {
                return ProvisionTxError::SlugConflict;
            }
            return ProvisionTxError::Integrity(detail.to_string());
        }
    }
    ProvisionTxError::Db(e)
}

/// Create the tenant account from a paid signup, all-or-nothing.
///
/// One SQLite transaction writes the profile row, the wedding row and
/// the `completed_at` marker; if any step fails nothing is observable.
/// The guard on `completed_at IS NULL` is the serialization point for
/// concurrent duplicate requests: exactly one caller commits, the rest
/// get `AlreadyCompleted`.
pub fn create_account_from_payment(
    conn: &mut Connection,
    user_id: &str,
    pending_signup_id: &str,
    stripe_customer_id: Option<&str>,
) -> std::result::Result<AccountResult, ProvisionTxError> {
    let tx = conn.transaction()?;

    let signup: Option<PendingSignup> = tx
        .query_row(
            &format!(
                "SELECT {} FROM pending_signups WHERE id = ?1",
                PENDING_SIGNUP_COLS
            ),
            params![pending_signup_id],
            PendingSignup::from_row,
        )
        .optional()?;

    let signup = signup.ok_or(ProvisionTxError::SignupNotFound)?;
    if signup.completed_at.is_some() {
        return Err(ProvisionTxError::AlreadyCompleted { slug: signup.slug });
    }

    let created_at = now();

    tx.execute(
        "INSERT INTO profiles (id, email, subscription_status, stripe_customer_id, created_at)
         VALUES (?1, ?2, 'active', ?3, ?4)",
        params![user_id, &signup.email, stripe_customer_id, created_at],
    )
    .map_err(map_constraint)?;

    let wedding_id = EntityType::Wedding.gen_id();
    let guest_code = generate_guest_code();
    tx.execute(
        "INSERT INTO weddings (id, owner_id, slug, theme_id, partner_one, partner_two, wedding_date, guest_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &wedding_id,
            user_id,
            &signup.slug,
            &signup.theme_id,
            &signup.partner_one,
            &signup.partner_two,
            &signup.wedding_date,
            &guest_code,
            created_at
        ],
    )
    .map_err(map_constraint)?;

    let claimed = tx.execute(
        "UPDATE pending_signups SET completed_at = ?1 WHERE id = ?2 AND completed_at IS NULL",
        params![created_at, pending_signup_id],
    )?;
    if claimed == 0 {
        // Lost the race: another request completed this signup between
        // our SELECT and UPDATE. Dropping the tx rolls everything back.
        return Err(ProvisionTxError::AlreadyCompleted { slug: signup.slug });
    }

    tx.commit()?;

    Ok(AccountResult {
        user_id: user_id.to_string(),
        wedding_id,
        email: signup.email,
        slug: signup.slug,
        display_name: format!("{} & {}", signup.partner_one, signup.partner_two),
        guest_code,
    })
}
