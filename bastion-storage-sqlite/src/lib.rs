//! SQLite storage backend for bastion
//!
//! Stores one row per account key in a `failure_records` table and implements
//! [`FailureRepository`](bastion_core::repositories::FailureRepository) on top of it.
//!
//! # Example
//!
//! ```rust,no_run
//! use bastion_storage_sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), bastion_core::Error> {
//! let storage = SqliteStorage::connect("sqlite::memory:").await?;
//! storage.migrate().await?;
//! let repositories = storage.into_repository_provider();
//! # Ok(())
//! # }
//! ```

pub mod migrations;
pub mod repositories;

pub use repositories::{SqliteFailureRepository, SqliteRepositoryProvider};

use bastion_core::{Error, error::StorageError, repositories::RepositoryProvider};
use sqlx::SqlitePool;

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database at `url`, e.g. `sqlite::memory:` or `sqlite://bastion.db?mode=rwc`.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url).await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to connect to SQLite");
            StorageError::Connection(e.to_string())
        })?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        SqliteRepositoryProvider::new(self.pool.clone()).migrate().await
    }

    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }
}
