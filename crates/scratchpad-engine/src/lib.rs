//! Tab-state synchronization engine for scratchpad.
//!
//! Reconciles one authoritative [`TabState`](scratchpad_types::TabState)
//! against one live, possibly stale panel view.
//!
//! ```text
//!   PanelHandle (Send+Sync)     mpsc      PanelActor (one task per panel)
//!   ┌─────────────────────┐  ────────▶  ┌──────────────────────────────┐
//!   │ .created()/.shown() │             │ Lifecycle   (view phase)     │
//!   │ .view(msg)          │             │ Reconciler  (model + mirror) │
//!   │ .shutdown()         │  ◀────────  │ debounce timer               │
//!   └─────────────────────┘   oneshot   └──────┬───────────────┬───────┘
//!                                              │ HostMessage   │ WriteJob
//!                                              ▼               ▼
//!                                         panel view     serial writer → TabStore
//! ```
//!
//! The [`Reconciler`] is a plain state machine returning [`Effect`]s, so all
//! ordering rules are unit-testable without a runtime. The actor executes
//! those effects: sends messages, hands states to the writer, opens host
//! dialogs, and feeds their results back in as follow-up events.

pub mod actor;
pub mod config;
pub mod debounce;
pub mod dialogs;
pub mod error;
pub mod lifecycle;
pub mod reconciler;

pub use actor::{PanelEvent, PanelHandle, spawn_panel};
pub use config::EngineConfig;
pub use debounce::Debouncer;
pub use dialogs::{HostDialogs, PolicyDialogs};
pub use error::EngineError;
pub use lifecycle::{Lifecycle, ViewPhase};
pub use reconciler::{Effect, PersistReason, Reconciler, TabId};
