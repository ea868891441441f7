use expresarte_config::DatabaseConfig;
use expresarte_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

use crate::scope::TxScope;

/// Open a PostgreSQL pool sized and bounded by `config`.
///
/// `acquire_timeout` caps how long an operation waits for a free connection;
/// exceeding it surfaces as a storage error rather than an unbounded wait.
#[instrument(skip(config), fields(max_connections = config.max_connections))]
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await?;

    info!("database pool ready");
    Ok(pool)
}

/// Apply the embedded migrations in `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

/// Shared database handle owned by every service.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        Ok(Self::new(init_db_pool(config).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start a transaction for one service operation.
    pub async fn begin(&self, label: &'static str) -> Result<TxScope, AppError> {
        TxScope::begin(&self.pool, label).await
    }
}

impl From<PgPool> for Database {
    fn from(pool: PgPool) -> Self {
        Self::new(pool)
    }
}
