#![cfg(feature = "sqlite")]

use std::sync::Arc;

use bastion::{
    Bastion, BastionBuilder, LockoutPolicy, LoginDecision, ManualClock, SqliteRepositoryProvider,
};
use bastion_core::repositories::{FailureRepository, FailureRepositoryProvider};
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn sqlite_bastion(
    policy: LockoutPolicy,
    clock: Arc<ManualClock>,
) -> Result<Bastion<SqliteRepositoryProvider>, Box<dyn std::error::Error>> {
    init_tracing();

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let repositories = Arc::new(SqliteRepositoryProvider::new(pool));

    let bastion = BastionBuilder::new()
        .with_repositories(repositories)
        .with_site_admin("Admin")
        .with_lockout_policy(policy)
        .with_clock(clock)
        .apply_migrations(true)
        .build()
        .await?;

    Ok(bastion)
}

#[tokio::test]
async fn test_sqlite_health_check_after_migration() -> Result<(), Box<dyn std::error::Error>> {
    let bastion = sqlite_bastion(LockoutPolicy::default(), Arc::new(ManualClock::default())).await?;
    bastion.health_check().await?;
    // Migrations are idempotent.
    bastion.migrate().await?;
    Ok(())
}

#[tokio::test]
async fn test_sqlite_lockout_and_reset() -> Result<(), Box<dyn std::error::Error>> {
    let policy = LockoutPolicy::new(3, Duration::minutes(15));
    let bastion = sqlite_bastion(policy, Arc::new(ManualClock::default())).await?;
    let guard = bastion.guard();

    for expected in 1..=3 {
        assert_eq!(guard.record_failure("alice").await?, expected);
    }
    assert!(!guard.check_allowed("alice").await?.is_allowed());

    guard.record_success("alice").await?;
    assert!(guard.check_allowed("alice").await?.is_allowed());
    assert_eq!(bastion.lockout_status("alice").await?.failure_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_sqlite_window_expiry_clears_record() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let policy = LockoutPolicy::new(3, Duration::minutes(15));
    let bastion = sqlite_bastion(policy, clock.clone()).await?;
    let guard = bastion.guard();

    for _ in 0..3 {
        guard.record_failure("alice").await?;
    }
    assert!(matches!(
        guard.check_allowed("alice").await?,
        LoginDecision::Locked { .. }
    ));

    clock.advance(Duration::minutes(16));

    assert_eq!(guard.check_allowed("alice").await?, LoginDecision::Allowed);
    let failures = bastion.repositories().failures();
    assert!(failures.get("alice").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_sqlite_concurrent_failures_not_lost() -> Result<(), Box<dyn std::error::Error>> {
    let policy = LockoutPolicy::new(50, Duration::minutes(15));
    let bastion = sqlite_bastion(policy, Arc::new(ManualClock::default())).await?;

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let guard = bastion.guard();
            tokio::spawn(async move { guard.record_failure("alice").await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let record = bastion
        .repositories()
        .failures()
        .get("alice")
        .await?
        .expect("record should exist");
    assert_eq!(record.failure_count, 100);
    assert!(!bastion.check_allowed("alice").await?.is_allowed());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_sqlite_file_concurrent_failures_across_connections()
-> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::temp_dir().join(format!(
        "bastion-concurrency-{}-{}.db",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let bastion = BastionBuilder::new()
        .with_sqlite(&url)
        .await?
        .with_site_admin("Admin")
        .with_lockout_policy(LockoutPolicy::new(50, Duration::minutes(15)))
        .apply_migrations(true)
        .build()
        .await?;

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let guard = bastion.guard();
            tokio::spawn(async move { guard.record_failure("alice").await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let record = bastion.repositories().failures().get("alice").await?;
    assert_eq!(record.map(|r| r.failure_count), Some(100));
    assert!(!bastion.check_allowed("alice").await?.is_allowed());

    drop(bastion);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }

    Ok(())
}

#[tokio::test]
async fn test_sqlite_unlock_account() -> Result<(), Box<dyn std::error::Error>> {
    let policy = LockoutPolicy::new(2, Duration::minutes(15));
    let bastion = sqlite_bastion(policy, Arc::new(ManualClock::default())).await?;

    bastion.guard().record_failure("bob").await?;
    bastion.guard().record_failure("bob").await?;
    assert!(bastion.lockout_status("bob").await?.is_locked);

    assert!(bastion.unlock_account("bob").await?);
    assert!(!bastion.lockout_status("bob").await?.is_locked);

    Ok(())
}
