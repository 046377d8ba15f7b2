use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bastion::{ADMINISTRATORS_POLICY, BastionBuilder, LockoutPolicy, ManualClock, Principal};
use bastion_core::{CredentialVerifier, Error, error::AuthError};
use chrono::Duration;

/// Plaintext credential table standing in for the application's user store.
struct UserTable {
    passwords: HashMap<String, String>,
}

impl UserTable {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            passwords: entries
                .iter()
                .map(|(user, password)| (user.to_string(), password.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl CredentialVerifier for UserTable {
    async fn verify(&self, account_key: &str, secret: &str) -> Result<Option<Principal>, Error> {
        Ok(self
            .passwords
            .get(account_key)
            .filter(|password| password.as_str() == secret)
            .map(|_| Principal::new(account_key).with_role("Users")))
    }
}

#[tokio::test]
async fn test_sign_in_then_authorize() -> Result<(), Box<dyn std::error::Error>> {
    let bastion = BastionBuilder::new()
        .with_memory_storage()
        .with_site_admin("Admin")
        .build()
        .await?;
    let sign_in = bastion.sign_in_service(Arc::new(UserTable::new(&[
        ("Admin", "hunter2"),
        ("alice", "wonderland"),
    ])));

    let admin = sign_in.sign_in("Admin", "hunter2").await?;
    assert!(bastion.authorize(ADMINISTRATORS_POLICY, &admin)?.is_granted());

    let alice = sign_in.sign_in("alice", "wonderland").await?;
    assert!(!bastion.authorize(ADMINISTRATORS_POLICY, &alice)?.is_granted());

    Ok(())
}

#[tokio::test]
async fn test_lockout_blocks_correct_password_until_window_passes()
-> Result<(), Box<dyn std::error::Error>> {
    let clock = Arc::new(ManualClock::default());
    let bastion = BastionBuilder::new()
        .with_memory_storage()
        .with_site_admin("Admin")
        .with_lockout_policy(LockoutPolicy::new(3, Duration::minutes(15)))
        .with_clock(clock.clone())
        .build()
        .await?;
    let sign_in = bastion.sign_in_service(Arc::new(UserTable::new(&[("alice", "wonderland")])));

    for _ in 0..3 {
        let err = sign_in.sign_in("alice", "guess").await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
    }

    let err = sign_in.sign_in("alice", "wonderland").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(AuthError::AccountLocked {
            retry_after_seconds: 900
        })
    ));

    clock.advance(Duration::minutes(16));
    let principal = sign_in.sign_in("alice", "wonderland").await?;
    assert_eq!(principal.user_id, "alice");
    assert_eq!(bastion.lockout_status("alice").await?.failure_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_accounts_are_tracked_too() -> Result<(), Box<dyn std::error::Error>> {
    let bastion = BastionBuilder::new()
        .with_memory_storage()
        .with_site_admin("Admin")
        .with_lockout_policy(LockoutPolicy::new(2, Duration::minutes(15)))
        .build()
        .await?;
    let sign_in = bastion.sign_in_service(Arc::new(UserTable::new(&[])));

    for _ in 0..2 {
        sign_in.sign_in("ghost", "x").await.unwrap_err();
    }
    let err = sign_in.sign_in("ghost", "x").await.unwrap_err();
    assert!(err.is_lockout_error());

    Ok(())
}
