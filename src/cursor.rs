use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use tracing::trace;

use crate::{config::DatabaseConfig, database};

/// A single open transaction against one database.
///
/// Backed by a dedicated single-connection pool so that
/// `BEGIN`/`COMMIT`/`ROLLBACK` and every statement issued through the
/// cursor share one connection. The cursor is always inside a transaction
/// from `open` until `close`: `commit` and `rollback` finalize the current
/// transaction and immediately start the next one.
///
/// Cloning yields another handle onto the same transaction; the underlying
/// connection is never shared across lifecycles.
#[derive(Clone, Debug)]
pub struct Cursor {
    conn: DatabaseConnection,
    db_name: String,
}

impl Cursor {
    pub(crate) async fn open(db_config: &DatabaseConfig, db_name: &str) -> Result<Self, DbErr> {
        let conn = database::connect_single(db_config, db_name).await?;
        let cursor = Self {
            conn,
            db_name: db_name.to_string(),
        };
        if let Err(e) = cursor.execute("BEGIN").await {
            let _ = cursor.conn.clone().close().await;
            return Err(e);
        }
        Ok(cursor)
    }

    /// The connection every statement in this transaction goes through.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Commit the current transaction and open the next one.
    pub async fn commit(&self) -> Result<(), DbErr> {
        self.execute("COMMIT").await?;
        self.execute("BEGIN").await
    }

    /// Discard the current transaction and open the next one.
    pub async fn rollback(&self) -> Result<(), DbErr> {
        self.execute("ROLLBACK").await?;
        self.execute("BEGIN").await
    }

    /// Release the cursor. Whatever is still pending is discarded with the
    /// connection.
    pub(crate) async fn close(&self) {
        let _ = self.execute("ROLLBACK").await;
        let _ = self.conn.clone().close().await;
    }

    async fn execute(&self, sql: &str) -> Result<(), DbErr> {
        trace!("{} [{}]", sql, self.db_name);
        self.conn
            .execute(Statement::from_string(
                self.conn.get_database_backend(),
                sql,
            ))
            .await
            .map(|_| ())
    }
}
