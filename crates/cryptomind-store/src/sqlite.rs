//! SQLite-backed member store.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::store::MemberStore;
use crate::types::*;
use cryptomind_core::{Error, MembershipStatus, Result};

const MEMBER_COLUMNS: &str = "id, membership_id, user_id, username, name, profile_picture_url, \
     admin_user_id, company_id, product_id, product_title, plan_id, status, \
     renewal_period_start, renewal_period_end, cancel_at_period_end, canceled_at, \
     cancellation_reason, commission_processed, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, payment_id, admin_user_id, amount, commission_amount, \
     customer_user_id, customer_email, created_at";

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

/// SQLite store for members, commission payments, and admins.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the SQLite store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/cryptomind.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("cryptomind.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        info!(
            "SqliteStore initialized: {} admins, {} members, path={}",
            store.get_all_admins()?.len(),
            store.count_stored_members()?,
            store.db_path.display()
        );

        Ok(store)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Admins
    // ---------------------------------------------------------------

    /// Register an admin, or update its company id.
    pub fn upsert_admin(&self, user_id: &str, company_id: Option<&str>) -> Result<AdminAccount> {
        let company_id = company_id.map(str::trim).filter(|c| !c.is_empty());
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO admins (user_id, company_id, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET company_id = excluded.company_id",
            params![user_id, company_id, Utc::now()],
        )
        .map_err(db_err)?;
        let mut stmt = conn
            .prepare_cached("SELECT user_id, company_id, created_at FROM admins WHERE user_id = ?1")
            .map_err(db_err)?;
        stmt.query_row(params![user_id], Self::row_to_admin)
            .map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------

    pub fn count_stored_members(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM stored_members", [], |row| row.get(0))
            .map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Commission payments
    // ---------------------------------------------------------------

    /// All payments credited to an admin, oldest first.
    pub fn list_commission_payments_by_admin(
        &self,
        admin_user_id: &str,
    ) -> Result<Vec<CommissionPayment>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM commission_payments WHERE admin_user_id = ?1 ORDER BY created_at, id",
            PAYMENT_COLUMNS
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![admin_user_id], Self::row_to_payment)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMember> {
        let status: String = row.get("status")?;
        Ok(StoredMember {
            id: row.get("id")?,
            membership_id: row.get("membership_id")?,
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            name: row.get("name")?,
            profile_picture_url: row.get("profile_picture_url")?,
            admin_user_id: row.get("admin_user_id")?,
            company_id: row.get("company_id")?,
            product_id: row.get("product_id")?,
            product_title: row.get("product_title")?,
            plan_id: row.get("plan_id")?,
            status: MembershipStatus::parse(&status),
            raw_status: status,
            renewal_period_start: row.get("renewal_period_start")?,
            renewal_period_end: row.get("renewal_period_end")?,
            cancel_at_period_end: row.get("cancel_at_period_end")?,
            canceled_at: row.get("canceled_at")?,
            cancellation_reason: row.get("cancellation_reason")?,
            commission_processed: row.get("commission_processed")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn row_to_payment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommissionPayment> {
        Ok(CommissionPayment {
            id: row.get("id")?,
            payment_id: row.get("payment_id")?,
            admin_user_id: row.get("admin_user_id")?,
            amount: row.get("amount")?,
            commission_amount: row.get("commission_amount")?,
            customer_user_id: row.get("customer_user_id")?,
            customer_email: row.get("customer_email")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_admin(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdminAccount> {
        Ok(AdminAccount {
            user_id: row.get("user_id")?,
            company_id: row.get("company_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl MemberStore for SqliteStore {
    fn get_stored_members_by_admin(&self, admin_user_id: &str) -> Result<Vec<StoredMember>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM stored_members WHERE admin_user_id = ?1 ORDER BY created_at, id",
            MEMBER_COLUMNS
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![admin_user_id], Self::row_to_member)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn upsert_stored_member(&self, record: &MemberRecord) -> Result<UpsertOutcome> {
        let now = Utc::now();
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let exists = tx
            .prepare_cached("SELECT 1 FROM stored_members WHERE membership_id = ?1")
            .map_err(db_err)?
            .query_row(params![record.membership_id], |_| Ok(()))
            .optional()
            .map_err(db_err)?
            .is_some();

        if exists {
            // Record id, owning admin and company are fixed at creation.
            tx.execute(
                "UPDATE stored_members SET \
                 user_id = ?2, username = ?3, name = ?4, profile_picture_url = ?5, \
                 product_id = ?6, product_title = ?7, plan_id = ?8, status = ?9, \
                 renewal_period_start = ?10, renewal_period_end = ?11, \
                 cancel_at_period_end = ?12, canceled_at = ?13, cancellation_reason = ?14, \
                 commission_processed = MAX(commission_processed, ?15), updated_at = ?16 \
                 WHERE membership_id = ?1",
                params![
                    record.membership_id,
                    record.user_id,
                    record.username,
                    record.name,
                    record.profile_picture_url,
                    record.product_id,
                    record.product_title,
                    record.plan_id,
                    record.stored_status(),
                    record.renewal_period_start,
                    record.renewal_period_end,
                    record.cancel_at_period_end,
                    record.canceled_at,
                    record.cancellation_reason,
                    record.commission_processed,
                    now,
                ],
            )
            .map_err(db_err)?;
        } else {
            tx.execute(
                &format!(
                    "INSERT INTO stored_members ({}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)",
                    MEMBER_COLUMNS
                ),
                params![
                    record.id,
                    record.membership_id,
                    record.user_id,
                    record.username,
                    record.name,
                    record.profile_picture_url,
                    record.admin_user_id,
                    record.company_id,
                    record.product_id,
                    record.product_title,
                    record.plan_id,
                    record.stored_status(),
                    record.renewal_period_start,
                    record.renewal_period_end,
                    record.cancel_at_period_end,
                    record.canceled_at,
                    record.cancellation_reason,
                    record.commission_processed,
                    now,
                ],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        debug!(
            "Upserted member {} (new={})",
            record.membership_id, !exists
        );
        Ok(UpsertOutcome { is_new: !exists })
    }

    fn get_stored_member_by_membership_id(
        &self,
        membership_id: &str,
    ) -> Result<Option<StoredMember>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM stored_members WHERE membership_id = ?1",
            MEMBER_COLUMNS
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
        stmt.query_row(params![membership_id], Self::row_to_member)
            .optional()
            .map_err(db_err)
    }

    fn has_processed_payment(&self, payment_id: &str, admin_user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let found = conn
            .prepare_cached(
                "SELECT 1 FROM commission_payments WHERE payment_id = ?1 AND admin_user_id = ?2",
            )
            .map_err(db_err)?
            .query_row(params![payment_id, admin_user_id], |_| Ok(()))
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    fn record_commission_payment(
        &self,
        payment: &NewCommissionPayment,
    ) -> Result<CommissionPayment> {
        let created_at = Utc::now();
        let conn = self.conn.lock();
        conn.prepare_cached(&format!(
            "INSERT INTO commission_payments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            PAYMENT_COLUMNS
        ))
        .map_err(db_err)?
        .execute(params![
            payment.id,
            payment.payment_id,
            payment.admin_user_id,
            payment.amount,
            payment.commission_amount,
            payment.customer_user_id,
            payment.customer_email,
            created_at,
        ])
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicatePayment(payment.payment_id.clone())
            } else {
                db_err(e)
            }
        })?;

        Ok(CommissionPayment {
            id: payment.id.clone(),
            payment_id: payment.payment_id.clone(),
            admin_user_id: payment.admin_user_id.clone(),
            amount: payment.amount,
            commission_amount: payment.commission_amount,
            customer_user_id: payment.customer_user_id.clone(),
            customer_email: payment.customer_email.clone(),
            created_at,
        })
    }

    fn mark_member_commission_processed(&self, membership_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE stored_members SET commission_processed = 1, updated_at = ?2 \
                 WHERE membership_id = ?1",
                params![membership_id, Utc::now()],
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    fn get_all_admins(&self) -> Result<Vec<AdminAccount>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT user_id, company_id, created_at FROM admins ORDER BY created_at, user_id")
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_admin).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }
}
