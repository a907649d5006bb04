//! Load/save of the single tab-state blob.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use scratchpad_types::TabState;

use crate::blob::{BlobShape, PersistedBlob};
use crate::error::StoreResult;
use crate::kv::KvStore;

/// Key the state lives under unless the host picks another one.
pub const DEFAULT_STATE_KEY: &str = "scratchpad.state";

/// Where a loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing stored yet; default state.
    Missing,
    /// Canonical object.
    Canonical,
    /// Upgraded from a bare string.
    LegacyText,
    /// Upgraded from a bare tab array.
    LegacyTabs,
    /// Stored value was unusable; default state. The raw value was copied
    /// to `<key>.malformed` when possible.
    Malformed,
    /// The backend failed to read; default state.
    Unavailable,
}

/// Result of [`TabStore::load_with_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub state: TabState,
    pub source: LoadSource,
}

/// Persistence adapter: one [`TabState`] under one key of a [`KvStore`].
#[derive(Clone)]
pub struct TabStore {
    kv: Arc<dyn KvStore>,
    key: String,
}

impl TabStore {
    /// Adapter over `kv` using [`DEFAULT_STATE_KEY`].
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_key(kv, DEFAULT_STATE_KEY)
    }

    pub fn with_key(kv: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn malformed_key(&self) -> String {
        format!("{}.malformed", self.key)
    }

    /// Load the stored state. Never fails: anything unusable yields
    /// [`TabState::default`].
    pub fn load(&self) -> TabState {
        self.load_with_source().state
    }

    /// Load the stored state and report which shape it was recovered from.
    pub fn load_with_source(&self) -> Loaded {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no stored tab state, using default");
                return Loaded {
                    state: TabState::default(),
                    source: LoadSource::Missing,
                };
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read tab state, using default");
                return Loaded {
                    state: TabState::default(),
                    source: LoadSource::Unavailable,
                };
            }
        };

        let parsed = PersistedBlob::parse(&raw)
            .map_err(|e| e.to_string())
            .and_then(|blob| {
                let shape = blob.shape();
                blob.into_state()
                    .map(|state| (shape, state))
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok((shape, state)) => {
                let source = match shape {
                    BlobShape::Current => LoadSource::Canonical,
                    BlobShape::TabList => LoadSource::LegacyTabs,
                    BlobShape::Text => LoadSource::LegacyText,
                };
                if source != LoadSource::Canonical {
                    info!(key = %self.key, ?source, tabs = state.len(), "upgraded legacy tab state");
                }
                Loaded { state, source }
            }
            Err(reason) => {
                warn!(key = %self.key, %reason, "stored tab state is malformed, using default");
                if let Err(e) = self.kv.set(&self.malformed_key(), &raw) {
                    warn!(error = %e, "failed to back up malformed tab state");
                }
                Loaded {
                    state: TabState::default(),
                    source: LoadSource::Malformed,
                }
            }
        }
    }

    /// Serialize and write `state` in a single key update.
    pub fn save(&self, state: &TabState) -> StoreResult<()> {
        let json = serde_json::to_string(state)?;
        self.kv.set(&self.key, &json)?;
        debug!(key = %self.key, tabs = state.len(), bytes = json.len(), "saved tab state");
        Ok(())
    }

    /// Import a pre-tabs scratchpad text file.
    ///
    /// Only acts when nothing is stored under the key yet. Returns whether an
    /// import happened.
    pub fn import_legacy_file(&self, path: &Path) -> StoreResult<bool> {
        if self.kv.get(&self.key)?.is_some() {
            return Ok(false);
        }
        if !path.exists() {
            return Ok(false);
        }
        let text = std::fs::read_to_string(path)?;
        self.save(&TabState::from_text(text))?;
        info!(path = %path.display(), "imported legacy scratchpad file");
        Ok(true)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::kv::MemoryStore;
    use crate::sqlite::SqliteStore;
    use scratchpad_types::Tab;

    fn memory_store() -> (Arc<MemoryStore>, TabStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = TabStore::new(kv.clone());
        (kv, store)
    }

    fn seeded(raw: &str) -> (Arc<MemoryStore>, TabStore) {
        let kv = Arc::new(MemoryStore::new().with_entry(DEFAULT_STATE_KEY, raw));
        let store = TabStore::new(kv.clone());
        (kv, store)
    }

    #[test]
    fn test_missing_key_loads_default() {
        let (_, store) = memory_store();
        let loaded = store.load_with_source();
        assert_eq!(loaded.source, LoadSource::Missing);
        assert_eq!(loaded.state, TabState::default());
    }

    #[test]
    fn test_round_trip() {
        let (_, store) = memory_store();
        let state = TabState::new(vec![Tab::new("a", "x\ny"), Tab::new("b", "")], 1).unwrap();
        store.save(&state).unwrap();

        let loaded = store.load_with_source();
        assert_eq!(loaded.source, LoadSource::Canonical);
        assert_eq!(loaded.state, state);
    }

    #[test]
    fn test_round_trip_sqlite() {
        let store = TabStore::new(Arc::new(SqliteStore::in_memory().unwrap()));
        let state = TabState::default().add_tab().set_active_content("ünïcødé ✓");
        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_legacy_text_upgrade() {
        let (kv, store) = seeded(r#""hello""#);
        let loaded = store.load_with_source();
        assert_eq!(loaded.source, LoadSource::LegacyText);
        assert_eq!(loaded.state, TabState::from_text("hello"));
        // Loading never rewrites storage.
        assert_eq!(kv.raw(DEFAULT_STATE_KEY).as_deref(), Some(r#""hello""#));
    }

    #[test]
    fn test_legacy_tabs_upgrade() {
        let (_, store) = seeded(r#"[{"title":"a","content":"1"},{"title":"b","content":"2"}]"#);
        let loaded = store.load_with_source();
        assert_eq!(loaded.source, LoadSource::LegacyTabs);
        assert_eq!(loaded.state.current_tab_index(), 0);
        assert_eq!(loaded.state.len(), 2);
    }

    #[test]
    fn test_save_after_upgrade_writes_canonical() {
        let (kv, store) = seeded(r#""hello""#);
        let state = store.load();
        store.save(&state).unwrap();
        let raw = kv.raw(DEFAULT_STATE_KEY).unwrap();
        assert!(raw.starts_with('{'), "expected canonical object, got {raw}");
        assert_eq!(store.load_with_source().source, LoadSource::Canonical);
    }

    #[test]
    fn test_malformed_falls_back_and_backs_up() {
        let (kv, store) = seeded(r#"{"tabs":[],"currentTabIndex":0}"#);
        let loaded = store.load_with_source();
        assert_eq!(loaded.source, LoadSource::Malformed);
        assert_eq!(loaded.state, TabState::default());
        assert_eq!(
            kv.raw("scratchpad.state.malformed").as_deref(),
            Some(r#"{"tabs":[],"currentTabIndex":0}"#)
        );
    }

    #[test]
    fn test_garbage_falls_back() {
        let (_, store) = seeded("not json at all");
        assert_eq!(store.load(), TabState::default());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let (kv, store) = memory_store();
        kv.set_read_only(true);
        let err = store.save(&TabState::default()).unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly));
    }

    #[test]
    fn test_custom_key() {
        let kv = Arc::new(MemoryStore::new());
        let store = TabStore::with_key(kv.clone(), "panel.left");
        store.save(&TabState::from_text("x")).unwrap();
        assert!(kv.raw("panel.left").is_some());
        assert!(kv.raw(DEFAULT_STATE_KEY).is_none());
    }

    #[test]
    fn test_import_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratchpad.txt");
        std::fs::write(&path, "old notes").unwrap();

        let (_, store) = memory_store();
        assert!(store.import_legacy_file(&path).unwrap());
        assert_eq!(store.load(), TabState::from_text("old notes"));

        // Second import is a no-op because state now exists.
        std::fs::write(&path, "newer notes").unwrap();
        assert!(!store.import_legacy_file(&path).unwrap());
        assert_eq!(store.load().active_content(), "old notes");
    }

    #[test]
    fn test_import_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let (kv, store) = memory_store();
        assert!(!store.import_legacy_file(&dir.path().join("absent.txt")).unwrap());
        assert_eq!(kv.write_count(), 0);
    }
}
