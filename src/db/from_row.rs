//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

// ============ SQL SELECT Constants ============

pub const PENDING_SIGNUP_COLS: &str = "id, stripe_session_id, email, partner_one, partner_two, slug, theme_id, wedding_date, created_at, completed_at";

pub const PROFILE_COLS: &str =
    "id, email, subscription_status, subscription_ends_at, stripe_customer_id, created_at";

pub const WEDDING_COLS: &str =
    "id, owner_id, slug, theme_id, partner_one, partner_two, wedding_date, guest_code, created_at";

// ============ FromRow Implementations ============

impl FromRow for PendingSignup {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PendingSignup {
            id: row.get(0)?,
            stripe_session_id: row.get(1)?,
            email: row.get(2)?,
            partner_one: row.get(3)?,
            partner_two: row.get(4)?,
            slug: row.get(5)?,
            theme_id: row.get(6)?,
            wedding_date: row.get(7)?,
            created_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }
}

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            email: row.get(1)?,
            subscription_status: row.get(2)?,
            subscription_ends_at: row.get(3)?,
            stripe_customer_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Wedding {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Wedding {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            slug: row.get(2)?,
            theme_id: row.get(3)?,
            partner_one: row.get(4)?,
            partner_two: row.get(5)?,
            wedding_date: row.get(6)?,
            guest_code: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}
