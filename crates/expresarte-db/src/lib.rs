//! # Expresarte DB
//!
//! Connection pool setup, embedded migrations and [`TxScope`], the
//! transaction wrapper every mutating service operation runs inside.
//!
//! # Example
//!
//! ```ignore
//! use expresarte_config::DatabaseConfig;
//! use expresarte_db::{Database, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()?).await?;
//! run_migrations(&pool).await?;
//! let db = Database::new(pool);
//!
//! let mut tx = db.begin("create_period").await?;
//! let result = insert_period(tx.conn(), &dto).await;
//! let period = tx.finish(result).await?;
//! ```

mod errors;
mod pool;
mod scope;

pub use errors::{
    conflict_on_foreign_key, conflict_on_unique, is_foreign_key_violation, is_unique_violation,
    not_found_on_foreign_key,
};
pub use pool::{Database, init_db_pool, run_migrations};
pub use scope::TxScope;

pub use sqlx::{PgConnection, PgPool};
