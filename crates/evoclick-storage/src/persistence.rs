//! Load and save with graceful degradation.
//!
//! [`Persistence`] never fails outward. A store that cannot be read or written
//! is logged and replaced by a [`MemoryStore`] for the rest of the session, so
//! the game keeps running with progress held in memory only. A record that
//! cannot be decoded is logged and treated as no record at all.

use crate::codec::{decode_versioned, encode};
use crate::migration::MigrationRegistry;
use crate::store::{MemoryStore, SaveStore};
use evoclick_core::state::{SAVE_VERSION, SaveState};

/// Where a loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOrigin {
    /// No record existed, or the store could not be read.
    Fresh,
    /// A record was decoded. `from_version` is below the current version when
    /// the record was migrated.
    Restored { from_version: u32 },
    /// A record existed but could not be decoded. A fresh state was used.
    Corrupt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSave {
    pub state: SaveState,
    pub origin: SaveOrigin,
}

impl LoadedSave {
    pub fn was_migrated(&self) -> bool {
        matches!(self.origin, SaveOrigin::Restored { from_version } if from_version < SAVE_VERSION)
    }
}

/// Save-state persistence over a [`SaveStore`].
pub struct Persistence<S> {
    store: S,
    /// Set once the primary store has failed.
    fallback: Option<MemoryStore>,
    migrations: MigrationRegistry,
}

impl<S: SaveStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            fallback: None,
            migrations: MigrationRegistry::standard(),
        }
    }

    /// Replace the migration registry used when loading.
    pub fn with_migrations(mut self, migrations: MigrationRegistry) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the session has fallen back to memory-only storage.
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }

    /// Read and decode the stored record, or start fresh.
    pub fn load(&mut self, now_ms: u64) -> LoadedSave {
        let read = match &self.fallback {
            Some(memory) => memory.read(),
            None => self.store.read(),
        };

        let text = match read {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!("no save record found, starting fresh");
                return fresh(now_ms, SaveOrigin::Fresh);
            }
            Err(e) => {
                tracing::warn!(error = %e, "save store unreadable, continuing in memory");
                self.degrade();
                return fresh(now_ms, SaveOrigin::Fresh);
            }
        };

        match decode_versioned(&text, now_ms, &self.migrations) {
            Ok((state, from_version)) => {
                tracing::info!(
                    from_version,
                    balance = state.balance(),
                    "save record loaded"
                );
                LoadedSave {
                    state,
                    origin: SaveOrigin::Restored { from_version },
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "save record unreadable, starting fresh");
                fresh(now_ms, SaveOrigin::Corrupt)
            }
        }
    }

    /// Encode and write the full record. Returns `true` when it reached the
    /// primary store.
    pub fn save(&mut self, state: &SaveState) -> bool {
        let text = match encode(state) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode save record");
                return false;
            }
        };

        if let Some(memory) = &mut self.fallback {
            // Memory writes cannot fail.
            let _ = memory.write(&text);
            return false;
        }

        match self.store.write(&text) {
            Ok(()) => {
                tracing::debug!(bytes = text.len(), "save record written");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "save store unwritable, continuing in memory");
                let memory = self.degrade();
                let _ = memory.write(&text);
                false
            }
        }
    }

    /// Remove the stored record.
    pub fn clear(&mut self) {
        if let Some(memory) = &mut self.fallback {
            let _ = memory.clear();
            return;
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear save store, continuing in memory");
            self.degrade();
        }
    }

    fn degrade(&mut self) -> &mut MemoryStore {
        self.fallback.get_or_insert_with(MemoryStore::new)
    }
}

fn fresh(now_ms: u64, origin: SaveOrigin) -> LoadedSave {
    LoadedSave {
        state: SaveState::new(now_ms),
        origin,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::store::StorageError;
    use evoclick_core::id::NodeId;
    use evoclick_core::test_utils::*;

    /// A store whose reads and writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: bool,
        fail_writes: bool,
        writes: usize,
    }

    impl SaveStore for FlakyStore {
        fn read(&self) -> Result<Option<String>, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Unavailable("read disabled".into()));
            }
            self.inner.read()
        }

        fn write(&mut self, record: &str) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Unavailable("quota exceeded".into()));
            }
            self.writes += 1;
            self.inner.write(record)
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            self.inner.clear()
        }
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    #[test]
    fn empty_store_loads_fresh() {
        let mut p = Persistence::new(MemoryStore::new());
        let loaded = p.load(T0);
        assert_eq!(loaded.origin, SaveOrigin::Fresh);
        assert_eq!(loaded.state, SaveState::new(T0));
        assert!(!p.is_degraded());
    }

    #[test]
    fn save_then_load_restores() {
        let mut p = Persistence::new(MemoryStore::new());
        let state = state_with_balance(77.5);
        assert!(p.save(&state));

        let loaded = p.load(T0 + 1);
        assert_eq!(
            loaded.origin,
            SaveOrigin::Restored {
                from_version: SAVE_VERSION
            }
        );
        assert!(!loaded.was_migrated());
        assert_eq!(loaded.state, state);
    }

    #[test]
    fn legacy_record_reports_migration() {
        let store = MemoryStore::with_record(r#"{"points": 3, "clickMultiplier": 1.5}"#);
        let loaded = Persistence::new(store).load(T0);
        assert!(loaded.was_migrated());
        assert_eq!(loaded.state.click_multiplier_bonus(), 0.5);
    }

    #[test]
    fn corrupt_record_loads_fresh_without_degrading() {
        let mut p = Persistence::new(MemoryStore::with_record("{oops"));
        let loaded = p.load(T0);
        assert_eq!(loaded.origin, SaveOrigin::Corrupt);
        assert_eq!(loaded.state.balance(), 0.0);
        assert!(!p.is_degraded());
    }

    #[test]
    fn damaged_field_keeps_the_rest_of_the_record() {
        let record = r#"{"saveVersion": 1, "points": 5000, "totalClicks": 900,
            "research": {"bigbang": 7}, "options": {"theme": "blue"}}"#;
        let mut p = Persistence::new(MemoryStore::with_record(record));
        let loaded = p.load(T0);
        assert_eq!(loaded.origin, SaveOrigin::Restored { from_version: 1 });
        assert_eq!(loaded.state.balance(), 5000.0);

        assert!(p.save(&loaded.state));
        let stored = decode(p.store().record().unwrap(), T0).unwrap();
        assert_eq!(stored.total_clicks(), 900);
        assert_eq!(stored.level(&NodeId::from("bigbang")), 7);
    }

    // -----------------------------------------------------------------------
    // Degradation
    // -----------------------------------------------------------------------

    #[test]
    fn unreadable_store_degrades_to_memory() {
        let store = FlakyStore {
            fail_reads: true,
            ..Default::default()
        };
        let mut p = Persistence::new(store);
        assert_eq!(p.load(T0).origin, SaveOrigin::Fresh);
        assert!(p.is_degraded());

        // Later saves stay in memory and are visible to a reload.
        let state = state_with_balance(5.0);
        assert!(!p.save(&state));
        assert_eq!(p.store().writes, 0);
        assert_eq!(p.load(T0).state, state);
    }

    #[test]
    fn failed_write_keeps_record_in_memory() {
        let store = FlakyStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut p = Persistence::new(store);
        let state = state_with_balance(12.0);
        assert!(!p.save(&state));
        assert!(p.is_degraded());
        assert_eq!(p.load(T0).state, state);
    }

    #[test]
    fn clear_removes_record() {
        let mut p = Persistence::new(MemoryStore::new());
        p.save(&state_with_balance(1.0));
        p.clear();
        assert_eq!(p.load(T0).origin, SaveOrigin::Fresh);
        assert_eq!(p.store().record(), None);
    }
}
