//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.
//! On first run against a database written by the earlier deployment
//! (`submissions` exists, no `_migrations` table) it renames the legacy
//! `user_name` column and seeds V1 without re-creating tables.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                display_name TEXT,
                group_name TEXT NOT NULL,
                date TEXT NOT NULL,
                child_name TEXT NOT NULL,
                video_attachment TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_date ON submissions(date);
            CREATE INDEX IF NOT EXISTS idx_user_id ON submissions(user_id);

            CREATE TABLE IF NOT EXISTS user_settings (
                user_id INTEGER PRIMARY KEY,
                use_bot INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
        "#,
    },
    Migration {
        version: 2,
        name: "submissions_created_index",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_submissions_created ON submissions(created_at);
        "#,
    },
];

/// Run all pending migrations against the given connection.
///
/// Creates the `_migrations` table if it doesn't exist.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let mut current_version = get_current_version(conn).await?;

    if current_version == 0 && table_exists(conn, "submissions").await? {
        upgrade_legacy(conn).await?;
        seed_version(conn, 1, "initial_schema").await?;
        current_version = 1;
        tracing::info!("Legacy database detected, seeded migration V1");
    }

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    let version = get_current_version(conn).await?;
    tracing::info!(version, "Database migrations complete");
    Ok(())
}

/// Bring a legacy schema in line with V1.
async fn upgrade_legacy(conn: &Connection) -> Result<(), DatabaseError> {
    if column_exists(conn, "submissions", "user_name").await? {
        conn.execute(
            "ALTER TABLE submissions RENAME COLUMN user_name TO display_name",
            (),
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to rename user_name: {e}")))?;
    }

    // user_settings may be missing if the old bot crashed before creating it.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_settings (
            user_id INTEGER PRIMARY KEY,
            use_bot INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_date ON submissions(date);
        CREATE INDEX IF NOT EXISTS idx_user_id ON submissions(user_id);",
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to upgrade legacy schema: {e}")))?;
    Ok(())
}

/// Get the highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => {
            let version: i64 = row.get(0).map_err(|e| {
                DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
            })?;
            Ok(version)
        }
        None => Ok(0),
    }
}

async fn table_exists(conn: &Connection, table: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            libsql::params![table],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to check table {table}: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to read table check: {e}")))?;

    match row {
        Some(row) => {
            let count: i64 = row.get(0).unwrap_or(0);
            Ok(count > 0)
        }
        None => Ok(false),
    }
}

async fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            libsql::params![table, column],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to inspect {table}: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to read column check: {e}")))?;

    Ok(row.map(|r| r.get::<i64>(0).unwrap_or(0) > 0).unwrap_or(false))
}

/// Insert a version record into `_migrations`.
async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in &["submissions", "user_settings", "_migrations"] {
            assert!(
                table_exists(&conn, table).await.unwrap(),
                "Table '{}' should exist",
                table
            );
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn legacy_db_is_upgraded_in_place() {
        let conn = test_conn().await;

        // Schema as written by the earlier deployment.
        conn.execute_batch(
            "CREATE TABLE submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                user_name TEXT,
                group_name TEXT NOT NULL,
                date TEXT NOT NULL,
                child_name TEXT NOT NULL,
                video_attachment TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO submissions (user_id, user_name, group_name, date, child_name, video_attachment)
                VALUES (1, 'Анна Петрова', 'Вега', '01.12.2024', 'Ivan Ivanov', 'video1_2');",
        )
        .await
        .unwrap();

        run_migrations(&conn).await.unwrap();

        assert!(column_exists(&conn, "submissions", "display_name").await.unwrap());
        assert!(!column_exists(&conn, "submissions", "user_name").await.unwrap());
        assert!(table_exists(&conn, "user_settings").await.unwrap());
        assert_eq!(get_current_version(&conn).await.unwrap(), 2);

        let mut rows = conn
            .query("SELECT display_name FROM submissions", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let name: String = row.get(0).unwrap();
        assert_eq!(name, "Анна Петрова");
    }

    #[tokio::test]
    async fn version_tracking() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT version, name FROM _migrations ORDER BY version", ())
            .await
            .unwrap();
        let row1 = rows.next().await.unwrap().unwrap();
        assert_eq!(row1.get::<i64>(0).unwrap(), 1);
        assert_eq!(row1.get::<String>(1).unwrap(), "initial_schema");

        let row2 = rows.next().await.unwrap().unwrap();
        assert_eq!(row2.get::<i64>(0).unwrap(), 2);
        assert_eq!(row2.get::<String>(1).unwrap(), "submissions_created_index");
    }
}
