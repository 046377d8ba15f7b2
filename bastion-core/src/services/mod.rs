//! Service layer for business logic
//!
//! This module contains the concrete services that encapsulate the lockout and
//! authorization decisions.

pub mod login_guard;
pub mod policy;
pub mod sign_in;

pub use login_guard::LoginAttemptGuard;
pub use policy::ClaimsPolicyEvaluator;
pub use sign_in::{CredentialVerifier, SignInService};
