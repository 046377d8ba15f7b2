//! Schema migrations for the SQLite backend.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Migration: Send + Sync {
    /// Execute the migration
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Rollback the migration
    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64,
}

/// Every migration of this backend, in application order.
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![Box::new(CreateFailureRecordsTable), Box::new(CreateFailureRecordsIndexes)]
}

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    const TABLE: &'static str = "_bastion_migrations";

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the migration tracking table.
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            );"#,
            Self::TABLE
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply pending migrations, each in its own transaction.
    pub async fn up(&self, migrations: &[Box<dyn Migration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applying migration"
            );

            migration.up(&mut *tx).await?;

            sqlx::query(&format!(
                "INSERT INTO {} (version, name, applied_at) VALUES (?, ?, ?)",
                Self::TABLE
            ))
            .bind(migration.version())
            .bind(migration.name())
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    /// Roll back applied migrations in reverse order.
    pub async fn down(&self, migrations: &[Box<dyn Migration>]) -> Result<(), MigrationError> {
        for migration in migrations.iter().rev() {
            if !self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Rolling back migration"
            );

            migration.down(&mut *tx).await?;

            sqlx::query(&format!("DELETE FROM {} WHERE version = ?", Self::TABLE))
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let records = sqlx::query_as::<_, MigrationRecord>(&format!(
            "SELECT version, name, applied_at FROM {} ORDER BY version",
            Self::TABLE
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?)",
            Self::TABLE
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}

/// One row per account key. Timestamps are unix milliseconds.
pub struct CreateFailureRecordsTable;

#[async_trait]
impl Migration for CreateFailureRecordsTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateFailureRecordsTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS failure_records (
                account_key TEXT PRIMARY KEY NOT NULL,
                failure_count INTEGER NOT NULL CHECK (failure_count >= 0),
                first_failure_at INTEGER NOT NULL,
                last_failure_at INTEGER NOT NULL
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS failure_records")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateFailureRecordsIndexes;

#[async_trait]
impl Migration for CreateFailureRecordsIndexes {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateFailureRecordsIndexes"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_failure_records_last_failure_at ON failure_records(last_failure_at)",
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP INDEX IF EXISTS idx_failure_records_last_failure_at")
            .execute(conn)
            .await?;
        Ok(())
    }
}
