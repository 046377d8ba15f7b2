//! # Bastion
//!
//! Bastion holds the two security decisions a server-rendered application makes on
//! every sign-in and every protected request:
//!
//! - **May this account try to log in right now?** Failed logins are counted per
//!   account key. Reaching the configured number of failures locks the account
//!   until a sliding window, anchored at the most recent failure, has passed.
//! - **Does this principal satisfy this policy?** The `Users` policy requires the
//!   `Users` role; the `Administrators` policy additionally requires the `UserId`
//!   claim to equal the configured site administrator, compared case-sensitively.
//!
//! ## Storage Support
//!
//! - In-memory (for single-process deployments and tests)
//! - SQLite
//!
//! ## Example
//!
//! ```rust,no_run
//! use bastion::{BastionBuilder, Principal, Settings, ADMINISTRATORS_POLICY};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bastion = BastionBuilder::new()
//!         .with_settings(Settings::from_file("appsettings.json")?)
//!         .with_sqlite("sqlite://bastion.db?mode=rwc")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let principal = Principal::new("Admin").with_role("Users");
//!     let decision = bastion.authorize(ADMINISTRATORS_POLICY, &principal)?;
//!     assert!(decision.is_granted());
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use bastion_core::{
    ClaimsPolicyEvaluator, CredentialVerifier, Error, LockoutStatus, LoginAttemptGuard,
    PolicyDecision, RepositoryProvider, SignInService,
};
pub use bastion_core::Principal;

pub mod builder;
pub mod settings;

pub use builder::{BastionBuilder, BastionBuilderError, NoStorage, WithStorage};
pub use settings::{LockoutSettings, Settings};

/// Re-export core types from bastion_core
pub use bastion_core::{
    ADMINISTRATORS_POLICY, Clock, DenialReason, FailureRecord, LockoutPolicy, LoginDecision,
    ManualClock, PolicyRule, SystemClock, USER_ID_CLAIM, USERS_POLICY, USERS_ROLE,
    repositories::{InMemoryFailureRepository, InMemoryRepositoryProvider},
};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use bastion_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

/// Policies every application built on bastion refers to.
pub const REQUIRED_POLICIES: [&str; 2] = [USERS_POLICY, ADMINISTRATORS_POLICY];

/// The coordinator that owns the login guard and the policy evaluator.
///
/// Built once at startup, usually through [`BastionBuilder`], and shared across
/// requests. Cloning is cheap.
pub struct Bastion<R: RepositoryProvider> {
    repositories: Arc<R>,
    guard: Arc<LoginAttemptGuard<R::FailureRepo>>,
    policies: Arc<ClaimsPolicyEvaluator>,
}

impl<R: RepositoryProvider> Clone for Bastion<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: self.repositories.clone(),
            guard: self.guard.clone(),
            policies: self.policies.clone(),
        }
    }
}

impl<R: RepositoryProvider> Bastion<R> {
    pub fn from_parts(
        repositories: Arc<R>,
        guard: LoginAttemptGuard<R::FailureRepo>,
        policies: ClaimsPolicyEvaluator,
    ) -> Self {
        Self {
            repositories,
            guard: Arc::new(guard),
            policies: Arc::new(policies),
        }
    }

    pub fn repositories(&self) -> Arc<R> {
        self.repositories.clone()
    }

    pub fn guard(&self) -> Arc<LoginAttemptGuard<R::FailureRepo>> {
        self.guard.clone()
    }

    pub fn policies(&self) -> &ClaimsPolicyEvaluator {
        &self.policies
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Evaluate `principal` against `policy_name`.
    pub fn authorize(&self, policy_name: &str, principal: &Principal) -> Result<PolicyDecision, Error> {
        self.policies.evaluate(policy_name, principal)
    }

    pub async fn check_allowed(&self, account_key: &str) -> Result<LoginDecision, Error> {
        self.guard.check_allowed(account_key).await
    }

    pub async fn lockout_status(&self, account_key: &str) -> Result<LockoutStatus, Error> {
        self.guard.lockout_status(account_key).await
    }

    pub async fn unlock_account(&self, account_key: &str) -> Result<bool, Error> {
        self.guard.unlock_account(account_key).await
    }

    /// A sign-in service that checks credentials with `verifier`.
    pub fn sign_in_service<V: CredentialVerifier>(
        &self,
        verifier: Arc<V>,
    ) -> SignInService<R::FailureRepo, V> {
        SignInService::new(self.guard.clone(), verifier)
    }
}
