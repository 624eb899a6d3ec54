//! Schema upgrades for the cache database.
//!
//! `_migrations` records every applied step by version and name. A step
//! runs at most once and commits together with its ledger row.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// One schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "cache_storage",
        sql: include_str!("../../migrations/001_cache_storage.sql"),
    },
    Migration {
        version: 2,
        name: "entry_indexes",
        sql: include_str!("../../migrations/002_entry_indexes.sql"),
    },
];

fn applied_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
    Ok(version)
}

fn apply(conn: &mut rusqlite::Connection, step: &Migration) -> Result<(), Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)
        .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", step.name, step.version)))?;
    tx.execute(
        "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![step.version, step.name, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    tracing::debug!(version = step.version, name = step.name, "applied migration");
    Ok(())
}

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current = applied_version(conn)?;
        for step in MIGRATIONS.iter().filter(|step| step.version > current) {
            apply(conn, step)?;
        }
        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ledger(conn: &Connection) -> Vec<(i64, String)> {
        conn.call(|conn| {
            let mut stmt = conn.prepare("SELECT version, name FROM _migrations ORDER BY version")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<(i64, String)>, _>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_ledger_records_each_step() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(
            ledger(&conn).await,
            vec![(1, "cache_storage".to_string()), (2, "entry_indexes".to_string())]
        );
    }

    #[tokio::test]
    async fn test_rerun_applies_nothing() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(ledger(&conn).await.len(), MIGRATIONS.len());
        let tables: i64 = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type='table' AND name IN ('cache_namespaces', 'cache_entries')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[tokio::test]
    async fn test_resumes_from_recorded_version() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| -> Result<(), Error> {
            applied_version(conn)?;
            apply(conn, &MIGRATIONS[0])
        })
        .await
        .unwrap();

        run(&conn).await.unwrap();

        assert_eq!(ledger(&conn).await.len(), 2);
    }
}
