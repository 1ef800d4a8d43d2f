use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait as _;
use tempfile::TempDir;

use crate::{
    config::{Config, DatabaseConfig, ScriptingConfig, TracingConfig},
    database::migrations::Migrator,
};

static TRACING_INITIALIZED: std::sync::Once = std::sync::Once::new();

/// Initialize tracing for tests
fn init_tracing() {
    TRACING_INITIALIZED.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}

/// A disposable SQLite database living in its own temporary directory.
///
/// The directory is removed with the value, taking the database file with
/// it; keep the value alive as long as connections are open.
pub struct TestDatabase {
    pub config: Config,
    pub name: String,
    _dir: TempDir,
}

/// Create a migrated test database. Each test should pick a unique name,
/// as registries are cached process-wide by database name.
pub async fn setup_test_database(name: &str) -> TestDatabase {
    let db = setup_empty_database(name).await;

    let url = format!(
        "sqlite://{}?mode=rwc",
        sqlite_file(&db).display()
    );
    let conn = Database::connect(ConnectOptions::new(url))
        .await
        .expect("connect to test database");
    Migrator::up(&conn, None).await.expect("migrate test database");
    conn.close().await.expect("close setup connection");

    db
}

/// Create a test database with no schema at all, for exercising the
/// degraded paths (missing tables, mid-upgrade lookups).
pub async fn setup_empty_database(name: &str) -> TestDatabase {
    init_tracing();

    let dir = TempDir::new().expect("create temp dir");
    let config = Config {
        database: DatabaseConfig {
            url: format!("sqlite://{}", dir.path().display()),
            name: Some(name.to_string()),
            ..DatabaseConfig::default()
        },
        tracing: TracingConfig::default(),
        scripting: ScriptingConfig::default(),
    };
    let db = TestDatabase {
        config,
        name: name.to_string(),
        _dir: dir,
    };

    // Touch the database file so read-write (non-creating) connections
    // can open it.
    let url = format!("sqlite://{}?mode=rwc", sqlite_file(&db).display());
    let conn = Database::connect(ConnectOptions::new(url))
        .await
        .expect("create test database file");
    conn.close().await.expect("close creation connection");

    db
}

fn sqlite_file(db: &TestDatabase) -> std::path::PathBuf {
    db._dir.path().join(format!("{}.db", db.name))
}
