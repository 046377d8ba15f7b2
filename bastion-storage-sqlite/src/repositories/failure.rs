//! SQLite implementation of the failure repository.
//!
//! Every operation is a single SQL statement, so SQLite's statement atomicity is what
//! serializes concurrent updates to the same account key.

use async_trait::async_trait;
use bastion_core::{
    Error, FailureRecord, error::StorageError, error::utilities::DatabaseResultExt,
    repositories::FailureRepository,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// SQLite repository for login failure records.
pub struct SqliteFailureRepository {
    pool: SqlitePool,
}

impl SqliteFailureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteFailureRecord {
    account_key: String,
    failure_count: i64,
    first_failure_at: i64,
    last_failure_at: i64,
}

impl TryFrom<SqliteFailureRecord> for FailureRecord {
    type Error = Error;

    fn try_from(row: SqliteFailureRecord) -> Result<Self, Self::Error> {
        let timestamp = |millis: i64| {
            DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                Error::Storage(StorageError::Database(format!(
                    "Invalid timestamp {millis} for {}",
                    row.account_key
                )))
            })
        };

        let failure_count = u32::try_from(row.failure_count).map_err(|_| {
            Error::Storage(StorageError::Database(format!(
                "Invalid failure count {} for {}",
                row.failure_count, row.account_key
            )))
        })?;

        Ok(FailureRecord {
            first_failure_at: timestamp(row.first_failure_at)?,
            last_failure_at: timestamp(row.last_failure_at)?,
            failure_count,
            account_key: row.account_key,
        })
    }
}

#[async_trait]
impl FailureRepository for SqliteFailureRepository {
    async fn get(&self, account_key: &str) -> Result<Option<FailureRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteFailureRecord>(
            r#"
            SELECT account_key, failure_count, first_failure_at, last_failure_at
            FROM failure_records
            WHERE account_key = ?
            "#,
        )
        .bind(account_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get failure record");
            StorageError::Database("Failed to get failure record".to_string())
        })?;

        row.map(FailureRecord::try_from).transpose()
    }

    async fn increment(
        &self,
        account_key: &str,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<FailureRecord, Error> {
        // SET expressions all read the pre-update row.
        let row = sqlx::query_as::<_, SqliteFailureRecord>(
            r#"
            INSERT INTO failure_records (account_key, failure_count, first_failure_at, last_failure_at)
            VALUES (?1, 1, ?2, ?2)
            ON CONFLICT(account_key) DO UPDATE SET
                failure_count = CASE
                    WHEN last_failure_at <= ?3 THEN 1
                    ELSE failure_count + 1
                END,
                first_failure_at = CASE
                    WHEN last_failure_at <= ?3 THEN ?2
                    ELSE first_failure_at
                END,
                last_failure_at = MAX(last_failure_at, ?2)
            RETURNING account_key, failure_count, first_failure_at, last_failure_at
            "#,
        )
        .bind(account_key)
        .bind(now.timestamp_millis())
        .bind(cutoff.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record login failure");
            StorageError::Database("Failed to record login failure".to_string())
        })?;

        row.try_into()
    }

    async fn clear(&self, account_key: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM failure_records WHERE account_key = ?")
            .bind(account_key)
            .execute(&self.pool)
            .await
            .map_db_err_with_context("Failed to clear failure record")?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_if_expired(
        &self,
        account_key: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "DELETE FROM failure_records WHERE account_key = ? AND last_failure_at <= ?",
        )
        .bind(account_key)
        .bind(cutoff.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_db_err_with_context("Failed to clear expired failure record")?;

        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM failure_records WHERE last_failure_at < ?")
            .bind(before.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_db_err_with_context("Failed to clean up failure records")?;

        Ok(result.rows_affected())
    }
}
