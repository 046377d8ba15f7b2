//! Repository trait for login failure tracking.
//!
//! This module defines the storage interface behind the login attempt guard. One
//! [`FailureRecord`] exists per account key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, lockout::FailureRecord};

/// Repository for login failure records.
///
/// # Concurrency
///
/// Every method is a single indivisible operation on one account key.
/// `increment` in particular must be an atomic read-modify-write: two concurrent
/// calls for the same key must produce two distinct counts. Calls for different keys
/// must not block each other behind a global lock.
///
/// # Expiry
///
/// A record is expired when `last_failure_at <= cutoff`, where callers compute the
/// cutoff as `now - lockout_window`.
#[async_trait]
pub trait FailureRepository: Send + Sync + 'static {
    /// Get the failure record for an account key, if any.
    async fn get(&self, account_key: &str) -> Result<Option<FailureRecord>, Error>;

    /// Add one failure to the record for `account_key` and return the updated record.
    ///
    /// Creates the record when absent. An existing record that is already expired
    /// relative to `cutoff` restarts at a count of 1 with `first_failure_at = now`.
    async fn increment(
        &self,
        account_key: &str,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<FailureRecord, Error>;

    /// Delete the record for an account key.
    ///
    /// Returns whether a record existed.
    async fn clear(&self, account_key: &str) -> Result<bool, Error>;

    /// Delete the record only if it is still expired at the time of deletion.
    ///
    /// A failure recorded concurrently refreshes `last_failure_at`, in which case the
    /// record survives and `false` is returned.
    async fn clear_if_expired(&self, account_key: &str, cutoff: DateTime<Utc>)
    -> Result<bool, Error>;

    /// Delete every record whose last failure is before `before`.
    ///
    /// Returns the number of records deleted.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, Error>;
}
