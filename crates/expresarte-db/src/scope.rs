//! Transaction scope.
//!
//! A [`TxScope`] owns one database transaction for the duration of a service
//! operation. It commits only through [`TxScope::commit`] or a successful
//! [`TxScope::finish`]; an error passed to `finish` rolls back, and so does
//! dropping the scope without committing (e.g. on an early `?` return).
//!
//! Nested work borrows the scope's connection via [`TxScope::conn`] instead of
//! opening a second transaction.

use expresarte_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, warn};

pub struct TxScope {
    tx: Transaction<'static, Postgres>,
    label: &'static str,
}

impl TxScope {
    pub async fn begin(pool: &PgPool, label: &'static str) -> Result<Self, AppError> {
        let tx = pool.begin().await?;
        debug!(scope = label, "transaction started");
        Ok(Self { tx, label })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), AppError> {
        let label = self.label;
        self.tx.commit().await?;
        debug!(scope = label, "transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        let label = self.label;
        self.tx.rollback().await?;
        debug!(scope = label, "transaction rolled back");
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err`, and hand the result back.
    ///
    /// A failed rollback is logged; the original error is what the caller sees.
    pub async fn finish<T>(self, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let label = self.label;
                if let Err(rollback_err) = self.tx.rollback().await {
                    warn!(scope = label, error = %rollback_err, "rollback failed");
                } else {
                    debug!(scope = label, kind = %err.kind, "transaction rolled back");
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for TxScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxScope").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use expresarte_core::ErrorKind;

    async fn insert_period(conn: &mut PgConnection, name: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO academic_periods (name, start_date, end_date)
               VALUES ($1, $2, $3)"#,
        )
        .bind(name)
        .bind(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
        .bind(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap())
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn period_count(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM academic_periods")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_finish_ok_commits(pool: PgPool) {
        let mut tx = TxScope::begin(&pool, "test").await.unwrap();
        let result = insert_period(tx.conn(), "2025-I").await;
        tx.finish(result).await.unwrap();

        assert_eq!(period_count(&pool).await, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_finish_err_rolls_back(pool: PgPool) {
        let mut tx = TxScope::begin(&pool, "test").await.unwrap();
        insert_period(tx.conn(), "2025-I").await.unwrap();

        let err = tx
            .finish::<()>(Err(AppError::validation(anyhow::anyhow!("late failure"))))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(period_count(&pool).await, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_drop_rolls_back(pool: PgPool) {
        {
            let mut tx = TxScope::begin(&pool, "test").await.unwrap();
            insert_period(tx.conn(), "2025-I").await.unwrap();
        }

        assert_eq!(period_count(&pool).await, 0);
    }
}
