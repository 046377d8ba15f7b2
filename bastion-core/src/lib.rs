//! Core functionality for the bastion project
//!
//! This crate contains the two decision cores of bastion:
//!
//! - [`LoginAttemptGuard`], which tracks failed logins per account key and locks an
//!   account once it reaches the configured number of failures inside a sliding window.
//! - [`ClaimsPolicyEvaluator`], which checks a [`Principal`] against named policies
//!   such as `Users` and `Administrators`.
//!
//! Storage is reached only through the [`repositories`] traits. An in-memory
//! implementation is included; the SQLite backend lives in `bastion-storage-sqlite`.
//!
pub mod error;
pub mod lockout;
pub mod policy;
pub mod principal;
pub mod repositories;
pub mod services;
pub mod time;

pub use error::Error;
pub use lockout::{FailureRecord, LockoutPolicy, LockoutStatus, LoginDecision, MAX_LOCKOUT_DAYS};
pub use policy::{
    ADMINISTRATORS_POLICY, ClaimRequirement, DenialReason, PolicyDecision, PolicyRule,
    USERS_POLICY, USERS_ROLE,
};
pub use principal::{Principal, USER_ID_CLAIM};
pub use repositories::{FailureRepository, FailureRepositoryProvider, RepositoryProvider};
pub use services::{ClaimsPolicyEvaluator, CredentialVerifier, LoginAttemptGuard, SignInService};
pub use time::{Clock, ManualClock, SystemClock};
