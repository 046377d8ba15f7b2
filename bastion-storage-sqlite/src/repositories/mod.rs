//! Repository implementations for SQLite storage

pub mod failure;

pub use failure::SqliteFailureRepository;

use std::sync::Arc;

use async_trait::async_trait;
use bastion_core::{
    Error,
    error::StorageError,
    repositories::{FailureRepositoryProvider, RepositoryProvider},
};
use sqlx::SqlitePool;

use crate::migrations::{self, SqliteMigrationManager};

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    failures: Arc<SqliteFailureRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let failures = Arc::new(SqliteFailureRepository::new(pool.clone()));
        Self { pool, failures }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl FailureRepositoryProvider for SqliteRepositoryProvider {
    type FailureRepo = SqliteFailureRepository;

    fn failures(&self) -> Arc<Self::FailureRepo> {
        self.failures.clone()
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
