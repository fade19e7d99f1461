//! Database schema SQL.

/// Admin accounts, stored members, and the append-only commission ledger.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS admins (
    user_id TEXT PRIMARY KEY,
    company_id TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stored_members (
    id TEXT PRIMARY KEY,
    membership_id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    username TEXT NOT NULL,
    name TEXT,
    profile_picture_url TEXT,
    admin_user_id TEXT NOT NULL,
    company_id TEXT NOT NULL,
    product_id TEXT NOT NULL,
    product_title TEXT NOT NULL,
    plan_id TEXT NOT NULL,
    status TEXT NOT NULL,
    renewal_period_start TEXT,
    renewal_period_end TEXT,
    cancel_at_period_end INTEGER NOT NULL DEFAULT 0,
    canceled_at TEXT,
    cancellation_reason TEXT,
    commission_processed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stored_members_admin ON stored_members(admin_user_id);
CREATE INDEX IF NOT EXISTS idx_stored_members_user ON stored_members(user_id);

CREATE TABLE IF NOT EXISTS commission_payments (
    id TEXT PRIMARY KEY,
    payment_id TEXT NOT NULL,
    admin_user_id TEXT NOT NULL,
    amount INTEGER NOT NULL,
    commission_amount INTEGER NOT NULL,
    customer_user_id TEXT,
    customer_email TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (payment_id, admin_user_id)
);

CREATE INDEX IF NOT EXISTS idx_commission_payments_admin ON commission_payments(admin_user_id);
"#;
