//! Storage for idempotency records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::IdempotencyResult;
use crate::record::{IdempotencyRecord, Lease, RecordStatus};

/// Backing store for idempotency records.
///
/// Every mutation is conditional so that concurrent callers agree on a single
/// lease holder; the boolean results report whether the condition held.
#[async_trait]
pub trait IdempotencySink: Send + Sync {
    async fn get(&self, scope: &str, key: &str) -> IdempotencyResult<Option<IdempotencyRecord>>;

    /// Insert `record` unless a row for its `(scope, key)` exists.
    async fn put_pending(&self, record: IdempotencyRecord) -> IdempotencyResult<bool>;

    /// Take over a pending row whose lease is still stamped `expected_locked_at`.
    async fn reclaim(
        &self,
        scope: &str,
        key: &str,
        expected_locked_at: DateTime<Utc>,
        lease: Lease,
    ) -> IdempotencyResult<bool>;

    /// Refresh `locked_at` on a row held by `token`.
    async fn renew(&self, scope: &str, key: &str, token: &Uuid, now: DateTime<Utc>)
        -> IdempotencyResult<bool>;

    /// Store the response on a row held by `token`.
    async fn commit(
        &self,
        scope: &str,
        key: &str,
        token: &Uuid,
        response: serde_json::Value,
    ) -> IdempotencyResult<bool>;

    /// Delete a pending row held by `token`.
    async fn release(&self, scope: &str, key: &str, token: &Uuid) -> IdempotencyResult<bool>;
}

/// In-process sink over a [`DashMap`].
#[derive(Default)]
pub struct MemorySink {
    records: DashMap<(String, String), IdempotencyRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn id(scope: &str, key: &str) -> (String, String) {
        (scope.to_string(), key.to_string())
    }
}

#[async_trait]
impl IdempotencySink for MemorySink {
    async fn get(&self, scope: &str, key: &str) -> IdempotencyResult<Option<IdempotencyRecord>> {
        Ok(self.records.get(&Self::id(scope, key)).map(|r| r.clone()))
    }

    async fn put_pending(&self, record: IdempotencyRecord) -> IdempotencyResult<bool> {
        match self.records.entry(Self::id(&record.scope, &record.key)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                debug!(scope = %record.scope, key = %record.key, "Lease acquired");
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn reclaim(
        &self,
        scope: &str,
        key: &str,
        expected_locked_at: DateTime<Utc>,
        lease: Lease,
    ) -> IdempotencyResult<bool> {
        match self.records.entry(Self::id(scope, key)) {
            Entry::Occupied(mut row)
                if row.get().status == RecordStatus::Pending
                    && row.get().lease.locked_at == expected_locked_at =>
            {
                row.get_mut().lease = lease;
                debug!(scope = %scope, key = %key, "Stale lease reclaimed");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn renew(
        &self,
        scope: &str,
        key: &str,
        token: &Uuid,
        now: DateTime<Utc>,
    ) -> IdempotencyResult<bool> {
        match self.records.get_mut(&Self::id(scope, key)) {
            Some(mut row) if row.is_held_by(token) => {
                row.lease.locked_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(
        &self,
        scope: &str,
        key: &str,
        token: &Uuid,
        response: serde_json::Value,
    ) -> IdempotencyResult<bool> {
        match self.records.get_mut(&Self::id(scope, key)) {
            Some(mut row) if row.is_held_by(token) => {
                row.status = RecordStatus::Committed;
                row.response = Some(response);
                row.committed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, scope: &str, key: &str, token: &Uuid) -> IdempotencyResult<bool> {
        match self.records.entry(Self::id(scope, key)) {
            Entry::Occupied(row) if row.get().is_held_by(token) => {
                row.remove();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending(lease: Lease) -> IdempotencyRecord {
        IdempotencyRecord::pending("quotes", "k1", "hash", lease)
    }

    #[tokio::test]
    async fn test_put_pending_is_exclusive() {
        let sink = MemorySink::new();
        assert!(sink.put_pending(pending(Lease::new(Utc::now()))).await.unwrap());
        assert!(!sink.put_pending(pending(Lease::new(Utc::now()))).await.unwrap());
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_only_holder_commits() {
        let sink = MemorySink::new();
        let lease = Lease::new(Utc::now());
        sink.put_pending(pending(lease)).await.unwrap();

        let stranger = Uuid::new_v4();
        assert!(!sink.commit("quotes", "k1", &stranger, json!(1)).await.unwrap());
        assert!(sink.commit("quotes", "k1", &lease.token, json!(1)).await.unwrap());

        let row = sink.get("quotes", "k1").await.unwrap().unwrap();
        assert!(row.is_committed());
        assert_eq!(row.response, Some(json!(1)));

        // committed rows can no longer be released or renewed
        assert!(!sink.release("quotes", "k1", &lease.token).await.unwrap());
        assert!(!sink.renew("quotes", "k1", &lease.token, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_reclaim_compares_locked_at() {
        let sink = MemorySink::new();
        let old = Lease::new(Utc::now() - chrono::Duration::minutes(5));
        sink.put_pending(pending(old)).await.unwrap();

        let first = Lease::new(Utc::now());
        let second = Lease::new(Utc::now());
        assert!(sink.reclaim("quotes", "k1", old.locked_at, first).await.unwrap());
        assert!(!sink.reclaim("quotes", "k1", old.locked_at, second).await.unwrap());

        let row = sink.get("quotes", "k1").await.unwrap().unwrap();
        assert_eq!(row.lease.token, first.token);
    }

    #[tokio::test]
    async fn test_release_frees_the_key() {
        let sink = MemorySink::new();
        let lease = Lease::new(Utc::now());
        sink.put_pending(pending(lease)).await.unwrap();

        assert!(sink.release("quotes", "k1", &lease.token).await.unwrap());
        assert!(sink.get("quotes", "k1").await.unwrap().is_none());
        assert!(sink.put_pending(pending(Lease::new(Utc::now()))).await.unwrap());
    }
}
