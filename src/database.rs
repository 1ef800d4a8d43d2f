use std::path::PathBuf;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use tracing::debug;

use crate::config::DatabaseConfig;

pub mod migrations;
pub mod models;

/// Connection URL for one named database under the configured server.
///
/// For SQLite the configured URL is a directory holding one file per
/// database; `mode=rw` keeps a missing database an error instead of
/// silently creating an empty file.
pub fn connection_url(db_config: &DatabaseConfig, db_name: &str) -> String {
    let base = db_config.url.trim_end_matches('/');
    if is_sqlite(db_config) {
        format!("{base}/{db_name}.db?mode=rw")
    } else {
        format!("{base}/{db_name}")
    }
}

fn is_sqlite(db_config: &DatabaseConfig) -> bool {
    db_config.url.starts_with("sqlite")
}

fn sqlite_path(db_config: &DatabaseConfig, db_name: &str) -> PathBuf {
    let dir = db_config
        .url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_end_matches('/');
    PathBuf::from(dir).join(format!("{db_name}.db"))
}

/// Open a pooled connection to the named database.
pub async fn connect(db_config: &DatabaseConfig, db_name: &str) -> Result<DatabaseConnection, DbErr> {
    connect_with_pool_size(db_config, db_name, db_config.pool_size).await
}

/// Open a connection whose pool holds exactly one connection, so that
/// every statement issued through it shares that connection. Transaction
/// cursors are built on this.
pub async fn connect_single(
    db_config: &DatabaseConfig,
    db_name: &str,
) -> Result<DatabaseConnection, DbErr> {
    connect_with_pool_size(db_config, db_name, 1).await
}

async fn connect_with_pool_size(
    db_config: &DatabaseConfig,
    db_name: &str,
    pool_size: u32,
) -> Result<DatabaseConnection, DbErr> {
    let url = connection_url(db_config, db_name);

    let mut options = ConnectOptions::new(url.clone());
    options.sqlx_logging(false); // Disable SQL query logging to reduce noise
    options.max_connections(pool_size);
    options.min_connections(1);

    debug!("Connecting to database at: {}", url);

    Database::connect(options).await
}

/// Check whether the named database exists without creating it.
///
/// Postgres is asked through a maintenance connection to the `postgres`
/// database; for SQLite the database file is checked on disk.
pub async fn database_exists(db_config: &DatabaseConfig, db_name: &str) -> Result<bool, DbErr> {
    if is_sqlite(db_config) {
        return Ok(sqlite_path(db_config, db_name).exists());
    }

    let base = db_config.url.trim_end_matches('/');
    let mut options = ConnectOptions::new(format!("{base}/postgres"));
    options.sqlx_logging(false);
    options.max_connections(1);

    let conn = Database::connect(options).await?;
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT datname FROM pg_catalog.pg_database WHERE lower(datname) = lower($1)",
        [db_name.into()],
    );
    let row = conn.query_one(stmt).await?;
    let _ = conn.close().await;

    Ok(row.is_some())
}
