//! Login failure tracking types
//!
//! | Field              | Type       | Description                                       |
//! | ------------------ | ---------- | ------------------------------------------------- |
//! | `account_key`      | `String`   | The identifier failures are tracked under.        |
//! | `failure_count`    | `u32`      | Failures since the record was created.            |
//! | `first_failure_at` | `DateTime` | When the current run of failures started.         |
//! | `last_failure_at`  | `DateTime` | The most recent failure; anchors the lockout.     |
//!
//! The lockout is a sliding window: every failure inside the window pushes the
//! unlock time out to `last_failure_at + lockout_window`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The stored failure state for one account key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub account_key: String,
    pub failure_count: u32,
    pub first_failure_at: DateTime<Utc>,
    pub last_failure_at: DateTime<Utc>,
}

impl FailureRecord {
    /// A fresh record holding a single failure at `now`.
    pub fn first(account_key: &str, now: DateTime<Utc>) -> Self {
        Self {
            account_key: account_key.to_string(),
            failure_count: 1,
            first_failure_at: now,
            last_failure_at: now,
        }
    }

    /// When the window anchored at the last failure closes.
    pub fn window_end(&self, lockout_window: Duration) -> DateTime<Utc> {
        self.last_failure_at
            .checked_add_signed(lockout_window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, lockout_window: Duration, now: DateTime<Utc>) -> bool {
        self.window_end(lockout_window) <= now
    }
}

/// Longest accepted lockout window or retention period, in days.
pub const MAX_LOCKOUT_DAYS: i64 = 365;

/// Configuration for lockout behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// When false the guard allows every attempt and records nothing
    pub enabled: bool,
    /// Failures that lock an account; reaching the value locks (`>=`)
    pub max_failures: u32,
    /// Sliding window measured from the most recent failure
    pub lockout_window: Duration,
    /// How long stale records are kept before background cleanup removes them
    pub retention_period: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failures: 5,
            lockout_window: Duration::minutes(15),
            retention_period: Duration::days(7),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_failures: u32, lockout_window: Duration) -> Self {
        Self {
            max_failures,
            lockout_window,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_retention_period(mut self, retention_period: Duration) -> Self {
        self.retention_period = retention_period;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_failures == 0 {
            return Err(ConfigError::InvalidLockoutPolicy(
                "max_failures must be at least 1".to_string(),
            ));
        }
        if self.lockout_window <= Duration::zero() {
            return Err(ConfigError::InvalidLockoutPolicy(
                "lockout_window must be positive".to_string(),
            ));
        }
        let max_period = Duration::days(MAX_LOCKOUT_DAYS);
        if self.lockout_window > max_period {
            return Err(ConfigError::InvalidLockoutPolicy(format!(
                "lockout_window must not exceed {MAX_LOCKOUT_DAYS} days"
            )));
        }
        if self.retention_period > max_period {
            return Err(ConfigError::InvalidLockoutPolicy(format!(
                "retention_period must not exceed {MAX_LOCKOUT_DAYS} days"
            )));
        }
        if self.retention_period < self.lockout_window {
            return Err(ConfigError::InvalidLockoutPolicy(
                "retention_period must not be shorter than lockout_window".to_string(),
            ));
        }
        Ok(())
    }
}

/// The answer to "may this account try to log in right now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDecision {
    Allowed,
    Locked { retry_after: Duration },
}

impl LoginDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LoginDecision::Allowed)
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LoginDecision::Allowed => None,
            LoginDecision::Locked { retry_after } => Some(*retry_after),
        }
    }
}

/// Reporting view of an account's lockout state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub account_key: String,
    pub failure_count: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    pub fn unlocked(account_key: &str) -> Self {
        Self {
            account_key: account_key.to_string(),
            failure_count: 0,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Seconds until the lock lifts, relative to `now`.
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.locked_until
            .map(|until| (until - now).num_seconds().max(0))
    }
}
