use rusqlite::Connection;

/// Initialize the database schema.
///
/// `weddings.slug` is the global uniqueness constraint the account
/// transaction relies on; `pending_signups.completed_at` is the
/// idempotency marker and is only written by that transaction.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        -- Pending signups (one per checkout attempt, keyed by Stripe session)
        CREATE TABLE IF NOT EXISTS pending_signups (
            id TEXT PRIMARY KEY,
            stripe_session_id TEXT UNIQUE,
            email TEXT NOT NULL,
            partner_one TEXT NOT NULL,
            partner_two TEXT NOT NULL,
            slug TEXT NOT NULL,
            theme_id TEXT NOT NULL,
            wedding_date TEXT,
            created_at INTEGER NOT NULL,
            completed_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_pending_signups_slug ON pending_signups(slug);

        -- Tenant profiles (id = auth provider user id)
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            subscription_status TEXT NOT NULL DEFAULT 'active',
            subscription_ends_at INTEGER,
            stripe_customer_id TEXT,
            created_at INTEGER NOT NULL
        );

        -- Wedding workspaces (one per profile, globally unique slug)
        CREATE TABLE IF NOT EXISTS weddings (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL UNIQUE REFERENCES profiles(id),
            slug TEXT NOT NULL UNIQUE,
            theme_id TEXT NOT NULL,
            partner_one TEXT NOT NULL,
            partner_two TEXT NOT NULL,
            wedding_date TEXT,
            guest_code TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_weddings_owner ON weddings(owner_id);
        "#,
    )?;
    Ok(())
}
