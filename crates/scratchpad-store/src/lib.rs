//! Persistence adapter for scratchpad tab state.
//!
//! The host hands us a plain string key/value store scoped to the current
//! user. We keep exactly one JSON value in it, under one stable key:
//!
//! ```text
//! "scratchpad.state" → {"tabs":[{"title":"New Tab","content":"..."}],"currentTabIndex":0}
//! ```
//!
//! Older builds stored a bare string (one scratchpad) or a bare array of tabs.
//! [`PersistedBlob`] recognises all three shapes and [`TabStore::load`]
//! upgrades them to a canonical [`TabState`](scratchpad_types::TabState).
//! Legacy shapes are never written back.
//!
//! Backends implement [`KvStore`]:
//! - [`SqliteStore`]: a `kv` table in a SQLite database file
//! - [`MemoryStore`]: process-local map, for tests and ephemeral panels

pub mod blob;
pub mod error;
pub mod kv;
pub mod sqlite;
pub mod tab_store;

pub use blob::{BlobShape, PersistedBlob};
pub use error::{StoreError, StoreResult};
pub use kv::{KvStore, MemoryStore};
pub use sqlite::SqliteStore;
pub use tab_store::{DEFAULT_STATE_KEY, LoadSource, Loaded, TabStore};
