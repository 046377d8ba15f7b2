//! In-process failure store.
//!
//! Records live in a [`DashMap`]; each operation holds the shard lock for its key
//! only, so failures for different accounts proceed in parallel while failures for
//! the same account are serialized.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{
    Error,
    lockout::FailureRecord,
    repositories::{FailureRepository, FailureRepositoryProvider, RepositoryProvider},
};

#[derive(Debug, Default)]
pub struct InMemoryFailureRepository {
    records: DashMap<String, FailureRecord>,
}

impl InMemoryFailureRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FailureRepository for InMemoryFailureRepository {
    async fn get(&self, account_key: &str) -> Result<Option<FailureRecord>, Error> {
        Ok(self.records.get(account_key).map(|r| r.value().clone()))
    }

    async fn increment(
        &self,
        account_key: &str,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<FailureRecord, Error> {
        let record = self
            .records
            .entry(account_key.to_string())
            .and_modify(|record| {
                if record.last_failure_at <= cutoff {
                    *record = FailureRecord::first(account_key, now);
                } else {
                    record.failure_count = record.failure_count.saturating_add(1);
                    record.last_failure_at = record.last_failure_at.max(now);
                }
            })
            .or_insert_with(|| FailureRecord::first(account_key, now));

        Ok(record.value().clone())
    }

    async fn clear(&self, account_key: &str) -> Result<bool, Error> {
        Ok(self.records.remove(account_key).is_some())
    }

    async fn clear_if_expired(
        &self,
        account_key: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, Error> {
        Ok(self
            .records
            .remove_if(account_key, |_, record| record.last_failure_at <= cutoff)
            .is_some())
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let mut removed = 0u64;
        self.records.retain(|_, record| {
            let keep = record.last_failure_at >= before;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

/// Repository provider backed entirely by process memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepositoryProvider {
    failures: Arc<InMemoryFailureRepository>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FailureRepositoryProvider for InMemoryRepositoryProvider {
    type FailureRepo = InMemoryFailureRepository;

    fn failures(&self) -> Arc<Self::FailureRepo> {
        self.failures.clone()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
