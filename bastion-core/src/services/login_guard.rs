//! Login attempt guard for per-account lockout.
//!
//! The guard answers whether a login attempt may proceed and keeps the per-account
//! failure counter up to date once credentials have been checked.
//!
//! # Features
//!
//! - Per-account failure tracking with a sliding lockout window
//! - Lockout at exactly `max_failures` failures
//! - Fail-safe behaviour when the failure store is unavailable
//! - Administrative unlock
//! - Background cleanup of stale records
//!
//! # Example
//!
//! ```rust,ignore
//! use bastion_core::services::LoginAttemptGuard;
//! use bastion_core::lockout::LockoutPolicy;
//!
//! let guard = LoginAttemptGuard::new(repository, LockoutPolicy::default());
//!
//! // Before verifying credentials
//! if let LoginDecision::Locked { retry_after } = guard.check_allowed("alice").await? {
//!     // Refuse the attempt
//! }
//!
//! // After verification fails
//! let failures = guard.record_failure("alice").await?;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    error::{AuthError, ValidationError},
    lockout::{FailureRecord, LockoutPolicy, LockoutStatus, LoginDecision},
    repositories::FailureRepository,
    time::{Clock, SystemClock},
};

/// Service deciding whether login attempts are permitted.
///
/// # Consistency
///
/// Each repository call is atomic for its account key, and the lock decision is
/// computed from the record returned by a single read. A check that races with a
/// failure recorded in parallel may observe the count from just before that failure;
/// this staleness of at most the in-flight failures is tolerated. The failures
/// themselves are never lost, so the next check sees them.
pub struct LoginAttemptGuard<R: FailureRepository> {
    repository: Arc<R>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl<R: FailureRepository> LoginAttemptGuard<R> {
    /// Create a new guard using the system clock.
    pub fn new(repository: Arc<R>, policy: LockoutPolicy) -> Self {
        Self::with_clock(repository, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<R>, policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.enabled
    }

    /// Decide whether a login attempt for `account_key` may proceed.
    ///
    /// An absent record, a count below `max_failures`, or an elapsed window all allow
    /// the attempt. An elapsed window also removes the record.
    ///
    /// If the failure store cannot be read the attempt is refused with
    /// [`AuthError::StoreUnavailable`]; this method never returns `Allowed` without
    /// having seen the stored state.
    pub async fn check_allowed(&self, account_key: &str) -> Result<LoginDecision, Error> {
        validate_account_key(account_key)?;

        if !self.policy.enabled {
            return Ok(LoginDecision::Allowed);
        }

        let now = self.clock.now();
        let record = self
            .repository
            .get(account_key)
            .await
            .map_err(|e| store_unavailable(account_key, e))?;

        let Some(record) = record else {
            return Ok(LoginDecision::Allowed);
        };

        if record.is_expired(self.policy.lockout_window, now) {
            // Conditional delete, a failure landing meanwhile keeps the record.
            if let Err(e) = self
                .repository
                .clear_if_expired(account_key, self.cutoff(now))
                .await
            {
                tracing::warn!(
                    account_key = %account_key,
                    error = %e,
                    "Failed to clear expired failure record"
                );
            }
            return Ok(LoginDecision::Allowed);
        }

        Ok(self.decide(&record, now))
    }

    /// Record a failed login attempt and return the new failure count.
    ///
    /// Returns 0 without touching the store when lockout is disabled.
    pub async fn record_failure(&self, account_key: &str) -> Result<u32, Error> {
        validate_account_key(account_key)?;

        if !self.policy.enabled {
            return Ok(0);
        }

        let now = self.clock.now();
        let record = self
            .repository
            .increment(account_key, now, self.cutoff(now))
            .await?;

        if record.failure_count == self.policy.max_failures {
            tracing::info!(
                account_key = %account_key,
                failures = record.failure_count,
                "Account locked after repeated login failures"
            );
        } else {
            tracing::debug!(
                account_key = %account_key,
                failures = record.failure_count,
                "Recorded login failure"
            );
        }

        Ok(record.failure_count)
    }

    /// Clear the failure record after a successful login.
    pub async fn record_success(&self, account_key: &str) -> Result<(), Error> {
        validate_account_key(account_key)?;
        self.repository.clear(account_key).await?;
        Ok(())
    }

    /// Current lockout state for an account, without side effects.
    pub async fn lockout_status(&self, account_key: &str) -> Result<LockoutStatus, Error> {
        validate_account_key(account_key)?;

        if !self.policy.enabled {
            return Ok(LockoutStatus::unlocked(account_key));
        }

        let now = self.clock.now();
        let status = match self.repository.get(account_key).await? {
            Some(record) if !record.is_expired(self.policy.lockout_window, now) => {
                let locked_until = match self.decide(&record, now) {
                    LoginDecision::Locked { retry_after } => Some(now + retry_after),
                    LoginDecision::Allowed => None,
                };
                LockoutStatus {
                    account_key: account_key.to_string(),
                    failure_count: record.failure_count,
                    is_locked: locked_until.is_some(),
                    locked_until,
                }
            }
            _ => LockoutStatus::unlocked(account_key),
        };

        Ok(status)
    }

    /// Unlock an account regardless of its state.
    ///
    /// Returns `true` if the account was locked.
    pub async fn unlock_account(&self, account_key: &str) -> Result<bool, Error> {
        let was_locked = self.lockout_status(account_key).await?.is_locked;
        self.repository.clear(account_key).await?;

        if was_locked {
            tracing::info!(account_key = %account_key, "Account unlocked");
        }

        Ok(was_locked)
    }

    /// Start the background cleanup task.
    ///
    /// Every `interval` the task deletes records whose last failure is older than the
    /// retention period. It stops when `shutdown` changes.
    pub fn start_cleanup_task(
        &self,
        interval: std::time::Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let repository = Arc::clone(&self.repository);
        let clock = Arc::clone(&self.clock);
        let retention = self.policy.retention_period;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = saturating_sub(clock.now(), retention);
                        match repository.cleanup_expired(before).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(
                                    count = count,
                                    "Cleaned up stale login failure records"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    "Failed to clean up login failure records"
                                );
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down login failure cleanup task");
                        break;
                    }
                }
            }
        })
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        saturating_sub(now, self.policy.lockout_window)
    }

    /// Lock decision for an unexpired record.
    fn decide(&self, record: &FailureRecord, now: DateTime<Utc>) -> LoginDecision {
        if record.failure_count < self.policy.max_failures {
            return LoginDecision::Allowed;
        }

        LoginDecision::Locked {
            retry_after: record.window_end(self.policy.lockout_window) - now,
        }
    }
}

fn saturating_sub(time: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    time.checked_sub_signed(period)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn validate_account_key(account_key: &str) -> Result<(), Error> {
    if account_key.trim().is_empty() {
        return Err(ValidationError::EmptyAccountKey.into());
    }
    Ok(())
}

fn store_unavailable(account_key: &str, error: Error) -> Error {
    tracing::warn!(
        account_key = %account_key,
        error = %error,
        "Failure store unavailable, refusing login attempt"
    );
    AuthError::StoreUnavailable(error.to_string()).into()
}
