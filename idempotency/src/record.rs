//! Stored idempotency rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// A caller holds the lease and is computing the response.
    Pending,
    /// The response is stored and replayed.
    Committed,
}

/// The holder of a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub token: Uuid,
    /// Last acquisition or renewal.
    pub locked_at: DateTime<Utc>,
}

impl Lease {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4(),
            locked_at: now,
        }
    }

    /// Whether the lease has outlived `ttl` at `now`.
    pub fn is_stale(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.locked_at > ttl
    }
}

/// One `(scope, key)` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub scope: String,
    pub key: String,
    /// SHA-256 of the canonical request body.
    pub request_hash: String,
    pub status: RecordStatus,
    pub lease: Lease,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

impl IdempotencyRecord {
    /// A new pending row held by `lease`.
    pub fn pending(scope: &str, key: &str, request_hash: &str, lease: Lease) -> Self {
        Self {
            scope: scope.to_string(),
            key: key.to_string(),
            request_hash: request_hash.to_string(),
            status: RecordStatus::Pending,
            lease,
            response: None,
            created_at: lease.locked_at,
            committed_at: None,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.status == RecordStatus::Committed
    }

    /// Pending and held by `token`.
    pub fn is_held_by(&self, token: &Uuid) -> bool {
        self.status == RecordStatus::Pending && self.lease.token == *token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_staleness() {
        let now = Utc::now();
        let lease = Lease::new(now - chrono::Duration::seconds(31));
        assert!(lease.is_stale(chrono::Duration::seconds(30), now));
        assert!(!lease.is_stale(chrono::Duration::seconds(60), now));
    }

    #[test]
    fn test_pending_record() {
        let lease = Lease::new(Utc::now());
        let record = IdempotencyRecord::pending("quotes", "k1", "abc", lease);

        assert!(!record.is_committed());
        assert!(record.is_held_by(&lease.token));
        assert!(!record.is_held_by(&Uuid::new_v4()));
        assert_eq!(record.created_at, lease.locked_at);
    }
}
