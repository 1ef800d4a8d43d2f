use std::future::Future;

use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    config::DatabaseConfig,
    cursor::Cursor,
    database::models::{
        config_param,
        user::{self, SUPERUSER_ID},
    },
    registry::Registry,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Language used when the stored user context cannot be read.
pub const DEFAULT_LANG: &str = "en_US";

/// Locale and preference values attached to the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub lang: String,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// The registry could not be built. Nothing was acquired, nothing to
    /// roll back.
    #[error("could not initialize the registry for '{database}': {source}")]
    Registry { database: String, source: DbErr },
    /// Cursor or transaction plumbing failed.
    #[error("transaction error: {0}")]
    Transaction(#[from] DbErr),
    /// The caller-supplied code failed. The transaction was not committed.
    #[error("{0}")]
    Session(BoxError),
}

/// Everything caller code needs to talk to one database: the open cursor,
/// the acting user id and that user's context.
///
/// Valid only inside the [`with_environment`] scope that produced it.
/// Clones share the same cursor.
#[derive(Clone, Debug)]
pub struct Environment {
    cursor: Cursor,
    uid: i32,
    context: Context,
}

impl Environment {
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub const fn uid(&self) -> i32 {
        self.uid
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Fetch a system parameter inside the current transaction.
    pub async fn get_param(&self, key: &str) -> Result<Option<String>, DbErr> {
        config_param::Entity::get(self.cursor.connection(), key).await
    }

    /// Set a system parameter inside the current transaction.
    pub async fn set_param(&self, key: &str, value: &str) -> Result<(), DbErr> {
        config_param::Entity::set(self.cursor.connection(), key, value).await
    }
}

/// Run caller-supplied code inside a fully initialized environment for
/// `database`, and finalize the transaction exactly once on the way out.
///
/// On a normal return the transaction is committed, unless `rollback` is
/// set, in which case it is rolled back; callers opt into safety rather
/// than out of persistence. On an error from the caller's code nothing is
/// committed and the error propagates after being logged. On every exit
/// path, the cursor is released and the registry entry for `database` is
/// invalidated, so the next lifecycle in this process starts from a clean
/// slate.
pub async fn with_environment<T, F, Fut>(
    db_config: &DatabaseConfig,
    database: &str,
    rollback: bool,
    f: F,
) -> Result<T, EnvironmentError>
where
    F: FnOnce(Environment) -> Fut,
    Fut: Future<Output = Result<T, BoxError>>,
{
    let registry = Registry::get(db_config, database)
        .await
        .map_err(|source| EnvironmentError::Registry {
            database: database.to_string(),
            source,
        })?;

    let result = run_with_cursor(&registry, rollback, f).await;

    // Stale model state or leaked connections must never survive into the
    // next lifecycle in this process.
    Registry::delete(database).await;

    result
}

async fn run_with_cursor<T, F, Fut>(
    registry: &Registry,
    rollback: bool,
    f: F,
) -> Result<T, EnvironmentError>
where
    F: FnOnce(Environment) -> Fut,
    Fut: Future<Output = Result<T, BoxError>>,
{
    let cursor = registry.cursor().await?;
    let result = session(&cursor, rollback, f).await;
    cursor.close().await;
    result
}

async fn session<T, F, Fut>(cursor: &Cursor, rollback: bool, f: F) -> Result<T, EnvironmentError>
where
    F: FnOnce(Environment) -> Fut,
    Fut: Future<Output = Result<T, BoxError>>,
{
    let context = match user::Entity::context_get(cursor.connection(), SUPERUSER_ID).await {
        Ok(context) => context,
        Err(e) => {
            // Happens, for instance, when fields declared on the user
            // model are not yet in the database (schema mid-upgrade).
            warn!(
                "Could not obtain a user context, continuing anyway with a \
                 default context. Error was: {e}"
            );
            Context::default()
        }
    };

    let env = Environment {
        cursor: cursor.clone(),
        uid: SUPERUSER_ID,
        context,
    };

    // The context lookup must not leak reads or writes into the caller's
    // transaction.
    cursor.rollback().await?;

    match f(env).await {
        Ok(value) => {
            if rollback {
                cursor.rollback().await?;
            } else {
                cursor.commit().await?;
            }
            Ok(value)
        }
        Err(e) => {
            error!("Uncaught error in environment session: {e}");
            Err(EnvironmentError::Session(e))
        }
    }
}
