//! Sign-in flow combining the login guard with credential verification.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error,
    error::AuthError,
    lockout::LoginDecision,
    principal::Principal,
    repositories::FailureRepository,
    services::LoginAttemptGuard,
};

/// Checks an account's credentials.
///
/// Implemented by the application's user store. Wrong credentials are `Ok(None)`;
/// `Err` is reserved for the verifier itself failing.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(&self, account_key: &str, secret: &str) -> Result<Option<Principal>, Error>;
}

pub struct SignInService<R: FailureRepository, V: CredentialVerifier> {
    guard: Arc<LoginAttemptGuard<R>>,
    verifier: Arc<V>,
}

impl<R: FailureRepository, V: CredentialVerifier> SignInService<R, V> {
    pub fn new(guard: Arc<LoginAttemptGuard<R>>, verifier: Arc<V>) -> Self {
        Self { guard, verifier }
    }

    /// Sign in `account_key` with `secret`.
    ///
    /// A locked account is refused before the verifier runs. Wrong credentials count
    /// as a failure; a successful sign-in clears the account's failure record.
    pub async fn sign_in(&self, account_key: &str, secret: &str) -> Result<Principal, Error> {
        if let LoginDecision::Locked { retry_after } = self.guard.check_allowed(account_key).await? {
            return Err(AuthError::AccountLocked {
                retry_after_seconds: retry_after.num_seconds().max(0),
            }
            .into());
        }

        match self.verifier.verify(account_key, secret).await? {
            Some(principal) => {
                self.guard.record_success(account_key).await?;
                tracing::info!(account_key = %account_key, "Sign-in succeeded");
                Ok(principal)
            }
            None => {
                let failures = self.guard.record_failure(account_key).await?;
                tracing::info!(
                    account_key = %account_key,
                    failures = failures,
                    "Sign-in failed"
                );
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }
}
