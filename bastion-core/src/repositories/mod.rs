//! Repository traits for the data access layer
//!
//! Services talk to storage only through these traits. A storage backend implements
//! [`FailureRepository`], exposes it through [`FailureRepositoryProvider`], and adds the
//! lifecycle methods of [`RepositoryProvider`].

pub mod failure;
pub mod memory;

pub use failure::FailureRepository;
pub use memory::{InMemoryFailureRepository, InMemoryRepositoryProvider};

use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for failure repository access.
pub trait FailureRepositoryProvider: Send + Sync + 'static {
    /// The failure repository implementation type
    type FailureRepo: FailureRepository;

    /// Get a shared handle to the failure repository
    fn failures(&self) -> Arc<Self::FailureRepo>;
}

/// Provider trait that storage implementations must implement.
///
/// # Example
///
/// ```rust,ignore
/// use bastion_core::repositories::*;
///
/// struct MyStorage { failures: Arc<MyFailureRepository> }
///
/// impl FailureRepositoryProvider for MyStorage {
///     type FailureRepo = MyFailureRepository;
///     fn failures(&self) -> Arc<Self::FailureRepo> { self.failures.clone() }
/// }
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: FailureRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
