//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Every operation runs under
//! a bounded timeout so a wedged storage layer surfaces as
//! `DatabaseError::Timeout` instead of a hang.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::channels::UserId;
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{Database, NewSubmission, Submission, UserCounts};

/// Default per-operation timeout.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and serializes access internally.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    timeout: Duration,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path, timeout: Duration) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
            timeout,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
            timeout: DEFAULT_STORAGE_TIMEOUT,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run a storage operation under the configured timeout.
    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DatabaseError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }

    /// Run a single-value `COUNT(*)` style query.
    async fn count(
        &self,
        operation: &'static str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        let conn = self.conn();
        self.timed(operation, async {
            let mut rows = conn
                .query(sql, params)
                .await
                .map_err(|e| DatabaseError::Query(format!("{operation}: {e}")))?;
            match rows.next().await {
                Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0).max(0) as u64),
                Ok(None) => Ok(0),
                Err(e) => Err(DatabaseError::Query(format!("{operation}: {e}"))),
            }
        })
        .await
    }

    async fn query_submissions(
        &self,
        operation: &'static str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Submission>, DatabaseError> {
        let conn = self.conn();
        self.timed(operation, async {
            let mut rows = conn
                .query(sql, params)
                .await
                .map_err(|e| DatabaseError::Query(format!("{operation}: {e}")))?;

            let mut submissions = Vec::new();
            loop {
                match rows.next().await {
                    Ok(Some(row)) => match row_to_submission(&row) {
                        Ok(s) => submissions.push(s),
                        Err(e) => tracing::warn!("Skipping submission row: {e}"),
                    },
                    Ok(None) => break,
                    Err(e) => return Err(DatabaseError::Query(format!("{operation}: {e}"))),
                }
            }
            Ok(submissions)
        })
        .await
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical timestamp format: RFC 3339 UTC with microseconds, which sorts
/// lexically in creation order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // SQLite CURRENT_TIMESTAMP / datetime() output
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql Row to a Submission.
///
/// Column order matches SUBMISSION_COLUMNS.
fn row_to_submission(row: &libsql::Row) -> Result<Submission, libsql::Error> {
    let created_str: String = row.get(7)?;
    Ok(Submission {
        id: row.get(0)?,
        user_id: row.get(1)?,
        // Rows from the earlier deployment may have a NULL name.
        display_name: row.get::<String>(2).unwrap_or_default(),
        group_name: row.get(3)?,
        date: row.get(4)?,
        child_name: row.get(5)?,
        video_attachment: row.get(6)?,
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const SUBMISSION_COLUMNS: &str =
    "id, user_id, display_name, group_name, date, child_name, video_attachment, created_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Submissions ─────────────────────────────────────────────────

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, DatabaseError> {
        let conn = self.conn();
        let created_at = Utc::now().trunc_subsecs(6);

        let id = self
            .timed("insert_submission", async {
                let mut rows = conn
                    .query(
                        "INSERT INTO submissions (user_id, display_name, group_name, date, child_name, video_attachment, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
                        params![
                            new.user_id(),
                            new.display_name(),
                            new.group_name(),
                            new.date(),
                            new.child_name(),
                            new.video_attachment(),
                            format_datetime(&created_at),
                        ],
                    )
                    .await
                    .map_err(|e| DatabaseError::Query(format!("insert_submission: {e}")))?;

                match rows.next().await {
                    Ok(Some(row)) => row
                        .get::<i64>(0)
                        .map_err(|e| DatabaseError::Query(format!("insert_submission id: {e}"))),
                    Ok(None) => Err(DatabaseError::Query(
                        "insert_submission: no id returned".into(),
                    )),
                    Err(e) => Err(DatabaseError::Query(format!("insert_submission: {e}"))),
                }
            })
            .await?;

        debug!(submission_id = id, date = new.date(), "Submission inserted into DB");

        Ok(Submission {
            id,
            user_id: new.user_id(),
            display_name: new.display_name().to_string(),
            group_name: new.group_name().to_string(),
            date: new.date().to_string(),
            child_name: new.child_name().to_string(),
            video_attachment: new.video_attachment().to_string(),
            created_at,
        })
    }

    async fn submissions_by_date(&self, date: &str) -> Result<Vec<Submission>, DatabaseError> {
        self.query_submissions(
            "submissions_by_date",
            &format!(
                "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE date = ?1 ORDER BY created_at DESC, id DESC"
            ),
            params![date],
        )
        .await
    }

    async fn count_submissions_by_date(&self, date: &str) -> Result<u64, DatabaseError> {
        self.count(
            "count_submissions_by_date",
            "SELECT COUNT(*) FROM submissions WHERE date = ?1",
            params![date],
        )
        .await
    }

    async fn count_submissions(&self) -> Result<u64, DatabaseError> {
        self.count("count_submissions", "SELECT COUNT(*) FROM submissions", ())
            .await
    }

    async fn recent_submissions(&self, limit: usize) -> Result<Vec<Submission>, DatabaseError> {
        self.query_submissions(
            "recent_submissions",
            &format!(
                "SELECT {SUBMISSION_COLUMNS} FROM submissions ORDER BY created_at DESC, id DESC LIMIT ?1"
            ),
            params![limit as i64],
        )
        .await
    }

    // ── User settings ───────────────────────────────────────────────

    async fn get_use_bot(&self, user_id: UserId) -> Result<Option<bool>, DatabaseError> {
        let conn = self.conn();
        self.timed("get_use_bot", async {
            let mut rows = conn
                .query(
                    "SELECT use_bot FROM user_settings WHERE user_id = ?1",
                    params![user_id],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("get_use_bot: {e}")))?;

            match rows.next().await {
                Ok(Some(row)) => Ok(Some(row.get::<i64>(0).unwrap_or(1) != 0)),
                Ok(None) => Ok(None),
                Err(e) => Err(DatabaseError::Query(format!("get_use_bot: {e}"))),
            }
        })
        .await
    }

    async fn set_use_bot(&self, user_id: UserId, use_bot: bool) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = format_datetime(&Utc::now());
        self.timed("set_use_bot", async {
            conn.execute(
                "INSERT INTO user_settings (user_id, use_bot, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id) DO UPDATE SET use_bot = ?2, updated_at = ?3",
                params![user_id, i64::from(use_bot), now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_use_bot: {e}")))?;
            Ok(())
        })
        .await?;

        debug!(user_id, use_bot, "User setting updated in DB");
        Ok(())
    }

    async fn user_counts(&self) -> Result<UserCounts, DatabaseError> {
        let conn = self.conn();
        self.timed("user_counts", async {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*), COALESCE(SUM(CASE WHEN use_bot = 0 THEN 1 ELSE 0 END), 0)
                     FROM user_settings",
                    (),
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("user_counts: {e}")))?;

            match rows.next().await {
                Ok(Some(row)) => Ok(UserCounts {
                    total_users: row.get::<i64>(0).unwrap_or(0).max(0) as u64,
                    message_mode_users: row.get::<i64>(1).unwrap_or(0).max(0) as u64,
                }),
                Ok(None) => Ok(UserCounts::default()),
                Err(e) => Err(DatabaseError::Query(format!("user_counts: {e}"))),
            }
        })
        .await
    }

    // ── Maintenance ─────────────────────────────────────────────────

    async fn backup_to(&self, path: &Path) -> Result<(), DatabaseError> {
        let target = path.to_string_lossy().into_owned();
        let conn = self.conn();
        self.timed("backup_to", async {
            conn.execute("VACUUM INTO ?1", params![target.clone()])
                .await
                .map_err(|e| DatabaseError::Backup(format!("VACUUM INTO {target}: {e}")))?;
            Ok(())
        })
        .await
    }
}

// ── Tests ───────────────────────────────────────────────────────────
