//! Shared tab model and wire protocol for scratchpad.
//!
//! This crate is the leaf of the workspace: the [`TabState`] value that every
//! other crate persists, reconciles, or renders, plus the messages exchanged
//! between a panel view and its state owner. It has **no internal scratchpad
//! dependencies**.
//!
//! # Ownership
//!
//! ```text
//! TabState (tabs + currentTabIndex) ← owned by the engine, one per panel
//!     └── Tab { title, content }    ← never aliased; copies cross the view boundary
//!
//! ViewMessage  view → engine   (ready, update, addTab, switchTab, confirmCloseTab, renameTab, error)
//! HostMessage  engine → view   (init, closeTabConfirmed, tabRenamed, tabAdded, tabSwitched, setContent)
//! ```
//!
//! # Key Types
//!
//! |------------------|-----------------------------------------------|
//! | Type             | Purpose                                       |
//! |------------------|-----------------------------------------------|
//! | [`Tab`]          | A named text buffer                           |
//! | [`TabState`]     | Ordered tabs + active index (never empty)     |
//! | [`TabError`]     | Rejected model mutation (state unchanged)     |
//! | [`ViewMessage`]  | Inbound panel message                         |
//! | [`HostMessage`]  | Outbound engine message                       |
//! |------------------|-----------------------------------------------|

pub mod protocol;
pub mod tab;

pub use protocol::{HostMessage, UpdatePayload, ViewMessage};
pub use tab::{DEFAULT_TAB_TITLE, Tab, TabError, TabState};
