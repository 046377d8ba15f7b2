//! Builder pattern for constructing Bastion instances
//!
//! This module provides a type-safe builder for creating [`Bastion`] instances with
//! compile-time validation of storage configuration. Everything the builder is given
//! is validated in [`BastionBuilder::build`], so a misconfigured policy or lockout
//! setting stops the application at startup rather than on the first request.
//!
//! # Example
//!
//! ```rust,no_run
//! use bastion::{BastionBuilder, LockoutPolicy};
//! use chrono::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bastion = BastionBuilder::new()
//!         .with_memory_storage()
//!         .with_site_admin("Admin")
//!         .with_lockout_policy(LockoutPolicy::new(3, Duration::minutes(15)))
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use bastion_core::{
    ClaimsPolicyEvaluator, Clock, LockoutPolicy, LoginAttemptGuard, RepositoryProvider,
    SystemClock, repositories::InMemoryRepositoryProvider,
};

use crate::{Bastion, REQUIRED_POLICIES, Settings};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Bastion instance.
#[derive(Debug, thiserror::Error)]
pub enum BastionBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Bastion`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build
pub struct BastionBuilder<Storage> {
    storage: Storage,
    lockout_policy: LockoutPolicy,
    site_admin: Option<String>,
    required_policies: Vec<String>,
    clock: Arc<dyn Clock>,
    apply_migrations: bool,
}

impl Default for BastionBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl BastionBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: enabled, 5 failures, 15 minute window, 7 day retention
    /// - Site admin: none, must be supplied
    /// - Required policies: `Users`, `Administrators`
    /// - Clock: system clock
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            lockout_policy: LockoutPolicy::default(),
            site_admin: None,
            required_policies: REQUIRED_POLICIES.iter().map(|p| p.to_string()).collect(),
            clock: Arc::new(SystemClock),
            apply_migrations: false,
        }
    }

    /// Use an already constructed repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> BastionBuilder<WithStorage<R>> {
        self.with_storage(WithStorage { repositories })
    }

    /// Keep failure records in process memory.
    pub fn with_memory_storage(self) -> BastionBuilder<WithStorage<InMemoryRepositoryProvider>> {
        self.with_repositories(Arc::new(InMemoryRepositoryProvider::new()))
    }

    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://bastion.db?mode=rwc")
    #[cfg(feature = "sqlite")]
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<BastionBuilder<WithStorage<crate::SqliteRepositoryProvider>>, BastionBuilderError>
    {
        let storage = crate::SqliteStorage::connect(url)
            .await
            .map_err(|e| BastionBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    fn with_storage<S>(self, storage: S) -> BastionBuilder<S> {
        BastionBuilder {
            storage,
            lockout_policy: self.lockout_policy,
            site_admin: self.site_admin,
            required_policies: self.required_policies,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
        }
    }
}

// ============================================================================
// Configuration Methods (available in any state)
// ============================================================================

impl<Storage> BastionBuilder<Storage> {
    /// Take the site admin and lockout policy from loaded settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.lockout_policy = settings.lockout_policy();
        self.site_admin = settings.site_admin;
        self
    }

    pub fn with_site_admin(mut self, site_admin: &str) -> Self {
        self.site_admin = Some(site_admin.to_string());
        self
    }

    pub fn with_lockout_policy(mut self, policy: LockoutPolicy) -> Self {
        self.lockout_policy = policy;
        self
    }

    /// Replace the system clock, typically with a [`ManualClock`](bastion_core::ManualClock) in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add policy names the application refers to; `build` fails if one is undefined.
    pub fn require_policies(mut self, names: &[&str]) -> Self {
        self.required_policies
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    /// Whether `build` should run storage migrations.
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

impl<R: RepositoryProvider> BastionBuilder<WithStorage<R>> {
    /// Validate the configuration and build the [`Bastion`] instance.
    pub async fn build(self) -> Result<Bastion<R>, BastionBuilderError> {
        self.lockout_policy
            .validate()
            .map_err(|e| BastionBuilderError::InvalidConfiguration(e.to_string()))?;

        let site_admin = self
            .site_admin
            .as_deref()
            .filter(|admin| !admin.trim().is_empty())
            .ok_or_else(|| {
                BastionBuilderError::InvalidConfiguration("site_admin is required".to_string())
            })?;

        let policies = ClaimsPolicyEvaluator::standard(site_admin)
            .map_err(|e| BastionBuilderError::InvalidConfiguration(e.to_string()))?;

        let required: Vec<&str> = self.required_policies.iter().map(String::as_str).collect();
        policies
            .validate_policies(&required)
            .map_err(|e| BastionBuilderError::InvalidConfiguration(e.to_string()))?;

        let repositories = self.storage.repositories;

        if self.apply_migrations {
            repositories
                .migrate()
                .await
                .map_err(|e| BastionBuilderError::Migration(e.to_string()))?;
        }

        if !self.lockout_policy.enabled {
            tracing::warn!("Login lockout is disabled");
        }

        let guard =
            LoginAttemptGuard::with_clock(repositories.failures(), self.lockout_policy, self.clock);

        tracing::info!(
            policies = required.len(),
            "Bastion initialized"
        );

        Ok(Bastion::from_parts(repositories, guard, policies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_build_with_memory_storage() {
        let bastion = BastionBuilder::new()
            .with_memory_storage()
            .with_site_admin("Admin")
            .build()
            .await
            .unwrap();

        assert_eq!(bastion.guard().policy(), &LockoutPolicy::default());
        assert!(bastion.policies().rule("Administrators").is_some());
    }

    #[tokio::test]
    async fn test_build_requires_site_admin() {
        let result = BastionBuilder::new().with_memory_storage().build().await;
        assert!(matches!(
            result,
            Err(BastionBuilderError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_lockout_policy() {
        let result = BastionBuilder::new()
            .with_site_admin("Admin")
            .with_lockout_policy(LockoutPolicy::new(0, Duration::minutes(15)))
            .with_memory_storage()
            .build()
            .await;
        assert!(matches!(
            result,
            Err(BastionBuilderError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_build_rejects_oversized_lockout_window() {
        let settings = Settings::from_json_str(
            r#"{ "site_admin": "Admin", "lockout": { "lockout_window_secs": 10000000000000 } }"#,
        )
        .unwrap();

        let result = BastionBuilder::new()
            .with_settings(settings)
            .with_memory_storage()
            .build()
            .await;
        assert!(matches!(
            result,
            Err(BastionBuilderError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_build_rejects_unknown_required_policy() {
        let result = BastionBuilder::new()
            .with_memory_storage()
            .with_site_admin("Admin")
            .require_policies(&["Editors"])
            .build()
            .await;

        match result {
            Err(BastionBuilderError::InvalidConfiguration(msg)) => {
                assert!(msg.contains("Editors"));
            }
            _ => panic!("expected an invalid configuration error"),
        }
    }

    #[tokio::test]
    async fn test_settings_flow_into_build() {
        let settings = Settings::from_json_str(
            r#"{ "site_admin": "root", "lockout": { "max_failures": 2, "lockout_window_secs": 120 } }"#,
        )
        .unwrap();

        let bastion = BastionBuilder::new()
            .with_settings(settings)
            .with_memory_storage()
            .build()
            .await
            .unwrap();

        assert_eq!(bastion.guard().policy().max_failures, 2);
        assert_eq!(bastion.guard().policy().lockout_window, Duration::minutes(2));
    }
}
