//! Database connection utilities.

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

/// SQLite pragmas applied to file-backed databases.
///
/// - `journal_mode=WAL` lets the refresher read while a sync writes
/// - `busy_timeout=5000` waits for locks instead of failing immediately
/// - `synchronous=NORMAL` is safe under WAL
const SQLITE_PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode=WAL",
    "PRAGMA busy_timeout=5000",
    "PRAGMA synchronous=NORMAL",
];

async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    for pragma in SQLITE_PRAGMAS {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }
    Ok(())
}

fn connect_options(database_url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);

    // Every pooled connection to `:memory:` would otherwise see its own empty database.
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    options
}

/// Establish a connection to the database.
///
/// File-backed SQLite databases get WAL mode, a 5 second busy timeout and
/// `synchronous=NORMAL`.
///
/// # Arguments
/// * `database_url` - e.g. `sqlite:///var/lib/orgmirror/mirror.db?mode=rwc` or `postgres:///orgmirror`
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(connect_options(database_url)).await?;

    if database_url.starts_with("sqlite://") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection and run all pending migrations.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
///
/// # Example
/// ```ignore
/// let db = orgmirror::connect_and_migrate("sqlite::memory:").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn configure_sqlite_runs_all_pragmas() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results(SQLITE_PRAGMAS.map(|_| MockExecResult {
                rows_affected: 0,
                last_insert_id: 0,
            }))
            .into_connection();

        configure_sqlite(&db)
            .await
            .expect("mock sqlite pragma execs should succeed");

        let log = db.into_transaction_log();
        assert_eq!(log.len(), SQLITE_PRAGMAS.len());
    }

    #[test]
    fn memory_databases_use_a_single_connection() {
        let options = connect_options("sqlite::memory:");
        assert_eq!(options.get_max_connections(), Some(1));

        let options = connect_options("postgres:///orgmirror");
        assert_eq!(options.get_max_connections(), None);
    }

    #[tokio::test]
    async fn connect_returns_error_for_invalid_database_url() {
        let err = connect("this-is-not-a-db-url")
            .await
            .expect_err("invalid URL should error");
        let msg = err.to_string().to_ascii_lowercase();
        assert!(
            msg.contains("error") || msg.contains("invalid"),
            "unexpected error message: {err}"
        );
    }
}
