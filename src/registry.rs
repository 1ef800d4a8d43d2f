use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use sea_orm::{DatabaseConnection, DbBackend, DbErr, Statement};
use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::{config::DatabaseConfig, cursor::Cursor, database};

/// Tables backed by a model entity in this crate. The registry records
/// which of them actually exist in the target database.
const MODEL_TABLES: [&str; 2] = ["config_param", "user"];

/// Registries already built in this process, one per database name.
static REGISTRIES: LazyLock<DashMap<String, Arc<Registry>>> = LazyLock::new(DashMap::new);

/// The set of loaded data models for one database: a pooled connection
/// plus the model tables present in that database.
///
/// Cached process-wide by database name. A lifecycle that used a registry
/// must [`Registry::delete`] it on the way out so stale model state never
/// leaks into the next lifecycle of a long-lived process.
pub struct Registry {
    db_name: String,
    db_config: DatabaseConfig,
    conn: DatabaseConnection,
    models: Vec<String>,
}

impl Registry {
    /// Fetch the cached registry for `db_name`, building it on first use.
    pub async fn get(db_config: &DatabaseConfig, db_name: &str) -> Result<Arc<Self>, DbErr> {
        if let Some(registry) = REGISTRIES.get(db_name) {
            debug!("Reusing registry for {}", db_name);
            return Ok(registry.clone());
        }

        let registry = Arc::new(Self::build(db_config, db_name).await?);
        REGISTRIES.insert(db_name.to_string(), registry.clone());
        Ok(registry)
    }

    async fn build(db_config: &DatabaseConfig, db_name: &str) -> Result<Self, DbErr> {
        let conn = database::connect(db_config, db_name).await?;
        let models = load_models(&conn).await?;
        info!("Modules loaded: {}", models.join(", "));
        Ok(Self {
            db_name: db_name.to_string(),
            db_config: db_config.clone(),
            conn,
            models,
        })
    }

    /// Open a transaction cursor against this registry's database.
    pub async fn cursor(&self) -> Result<Cursor, DbErr> {
        Cursor::open(&self.db_config, &self.db_name).await
    }

    /// Model tables present in the database.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Whether a registry for `db_name` is currently cached.
    pub fn is_cached(db_name: &str) -> bool {
        REGISTRIES.contains_key(db_name)
    }

    /// Drop the cached registry for `db_name` and close its pooled
    /// connections. A no-op when nothing is cached.
    pub async fn delete(db_name: &str) {
        if let Some((_, registry)) = REGISTRIES.remove(db_name) {
            debug!("Invalidating registry for {}", db_name);
            let _ = registry.conn.clone().close().await;
        }
    }
}

async fn load_models(conn: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
    let backend = conn.get_database_backend();
    let stmt = match backend {
        DbBackend::Sqlite => Statement::from_string(
            backend,
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        ),
        _ => Statement::from_string(
            backend,
            "SELECT tablename FROM pg_catalog.pg_tables WHERE schemaname = 'public' \
             ORDER BY tablename",
        ),
    };

    let rows = conn.query_all(stmt).await?;
    let mut models = Vec::new();
    for row in rows {
        let table: String = row.try_get_by_index(0)?;
        if MODEL_TABLES.contains(&table.as_str()) {
            models.push(table);
        }
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::setup_test::{setup_empty_database, setup_test_database};

    #[tokio::test]
    async fn registries_are_cached_until_deleted() {
        let db = setup_test_database("registry_cache").await;

        let first = Registry::get(&db.config.database, &db.name).await.unwrap();
        let second = Registry::get(&db.config.database, &db.name).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Registry::is_cached(&db.name));

        Registry::delete(&db.name).await;
        assert!(!Registry::is_cached(&db.name));
    }

    #[tokio::test]
    async fn migrated_databases_expose_their_models() {
        let db = setup_test_database("registry_models").await;

        let registry = Registry::get(&db.config.database, &db.name).await.unwrap();
        assert_eq!(
            registry.models(),
            &["config_param".to_string(), "user".to_string()][..],
        );
        assert_eq!(registry.db_name(), db.name);

        Registry::delete(&db.name).await;
    }

    #[tokio::test]
    async fn unmigrated_databases_build_an_empty_registry() {
        let db = setup_empty_database("registry_empty").await;

        let registry = Registry::get(&db.config.database, &db.name).await.unwrap();
        assert!(registry.models().is_empty());

        Registry::delete(&db.name).await;
    }

    #[tokio::test]
    async fn missing_databases_fail_to_build() {
        let db = setup_test_database("registry_missing").await;

        let result = Registry::get(&db.config.database, "no_such_database").await;
        assert!(result.is_err());
        assert!(!Registry::is_cached("no_such_database"));
        drop(db);
    }
}
