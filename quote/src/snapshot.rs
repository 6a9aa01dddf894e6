//! Persisted pricing snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{QuoteError, QuoteResult};

/// What a snapshot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Quote,
    Pool,
}

/// An immutable record of a priced result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Time-ordered identifier.
    pub id: Uuid,
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl Snapshot {
    /// Serialize `value` into a new snapshot.
    pub fn capture<T: Serialize>(kind: SnapshotKind, value: &T) -> QuoteResult<Self> {
        let payload =
            serde_json::to_value(value).map_err(|e| QuoteError::Snapshot(e.to_string()))?;
        Ok(Self {
            id: Uuid::now_v7(),
            kind,
            created_at: Utc::now(),
            payload,
        })
    }
}

/// Destination for snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Store a snapshot and return its id.
    async fn save(&self, snapshot: Snapshot) -> QuoteResult<Uuid>;

    /// Fetch a snapshot by id.
    async fn get(&self, id: &Uuid) -> QuoteResult<Option<Snapshot>>;
}

/// In-process snapshot sink.
#[derive(Default)]
pub struct MemorySnapshotSink {
    snapshots: DashMap<Uuid, Snapshot>,
}

impl MemorySnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotSink for MemorySnapshotSink {
    async fn save(&self, snapshot: Snapshot) -> QuoteResult<Uuid> {
        let id = snapshot.id;
        match self.snapshots.entry(id) {
            Entry::Occupied(_) => Err(QuoteError::Snapshot(format!("duplicate snapshot id {}", id))),
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
                Ok(id)
            }
        }
    }

    async fn get(&self, id: &Uuid) -> QuoteResult<Option<Snapshot>> {
        Ok(self.snapshots.get(id).map(|s| s.clone()))
    }
}
