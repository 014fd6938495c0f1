// Durable snapshot storage shared by every context on the device.
//
// A store only knows how to read, write and clear one JSON text record.
// Decoding, defaulting and read-modify-write merging are provided on top of
// those three primitives so every backend behaves the same way.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::error::StoreError;
use crate::model::{Snapshot, SnapshotPatch};

/// Key under which the snapshot record is stored.
pub const SNAPSHOT_KEY: &str = "raffle_snapshot_v1";

/// A durable home for the raffle snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Read the raw JSON record, or `None` if nothing has been saved.
    fn read_raw(&self) -> Result<Option<String>, StoreError>;

    /// Replace the raw JSON record.
    fn write_raw(&self, json: &str) -> Result<(), StoreError>;

    /// Delete the record entirely.
    fn clear(&self) -> Result<(), StoreError>;

    /// Load the snapshot. A missing or unreadable record yields defaults.
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(match self.read_raw()? {
            Some(text) => decode_snapshot(&text),
            None => Snapshot::default(),
        })
    }

    /// Write `snapshot` as the full record.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        self.write_raw(&json)
    }

    /// Re-read the latest record, overlay `patch`, and write the result
    /// back. Returns the merged snapshot that was written.
    ///
    /// This is a plain read-modify-write: a concurrent writer in another
    /// context can still be overwritten between the read and the write.
    fn merge(&self, patch: SnapshotPatch) -> Result<Snapshot, StoreError> {
        let mut current = self.load()?;
        patch.apply_to(&mut current);
        self.save(&current)?;
        Ok(current)
    }
}

/// Decode a stored record, falling back to defaults if it is corrupt.
pub fn decode_snapshot(text: &str) -> Snapshot {
    match serde_json::from_str(text) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Ignoring unreadable snapshot record: {}", e);
            Snapshot::default()
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    record: Option<String>,
    unavailable: bool,
}

/// A process-local store. Clones share the same record, so several
/// contexts in one process (or one test) can point at it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Simulate the backing storage disappearing (quota, permissions).
    /// While set, every operation fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner().unavailable = unavailable;
    }

    fn check(inner: &MemoryInner) -> Result<(), StoreError> {
        if inner.unavailable {
            Err(StoreError::Unavailable("memory store disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn read_raw(&self) -> Result<Option<String>, StoreError> {
        let inner = self.inner();
        Self::check(&inner)?;
        Ok(inner.record.clone())
    }

    fn write_raw(&self, json: &str) -> Result<(), StoreError> {
        let mut inner = self.inner();
        Self::check(&inner)?;
        inner.record = Some(json.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner();
        Self::check(&inner)?;
        inner.record = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Participant, PrizeTier};

    #[test]
    fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), Snapshot::default());
    }

    #[test]
    fn corrupt_record_loads_defaults() {
        let store = MemoryStore::new();
        store.write_raw("{not json").unwrap();
        assert_eq!(store.load().unwrap(), Snapshot::default());
    }

    #[test]
    fn save_then_load_returns_same_snapshot() {
        let store = MemoryStore::new();
        let snap = Snapshot {
            participants: vec![Participant::new("Alice")],
            prizes: vec![PrizeTier::new("Gold", 2)],
            active_tier_name: Some("Gold".into()),
            ..Snapshot::default()
        };
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), snap);
    }

    #[test]
    fn merge_keeps_fields_written_by_others() {
        let store = MemoryStore::new();
        let other_context = store.clone();
        other_context
            .merge(SnapshotPatch {
                prizes: Some(vec![PrizeTier::new("Gold", 1)]),
                ..SnapshotPatch::default()
            })
            .unwrap();

        let merged = store
            .merge(SnapshotPatch {
                participants: Some(vec![Participant::new("Bob")]),
                ..SnapshotPatch::default()
            })
            .unwrap();

        assert_eq!(merged.prizes.len(), 1);
        assert_eq!(merged.participants.len(), 1);
        assert_eq!(store.load().unwrap(), merged);
    }

    #[test]
    fn clear_removes_record() {
        let store = MemoryStore::new();
        store.save(&Snapshot { active_tier_name: Some("X".into()), ..Snapshot::default() }).unwrap();
        store.clear().unwrap();
        assert!(store.read_raw().unwrap().is_none());
    }

    #[test]
    fn unavailable_store_fails_every_operation() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.load(), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.save(&Snapshot::default()), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.clear(), Err(StoreError::Unavailable(_))));

        store.set_unavailable(false);
        assert!(store.load().is_ok());
    }
}
