//! Panel ↔ engine wire protocol.
//!
//! Every message is a JSON object `{ "type": ..., "value": ... }`. Unit
//! variants omit `value`.
//!
//! # Sequence
//!
//! ```text
//!   view                                   engine
//!    │ ── ready ──────────────────────────▶ │
//!    │ ◀───────────────────────────── init  │  full state push
//!    │ ── update "text" ──────────────────▶ │  debounced persist
//!    │ ── confirmCloseTab {index,title} ──▶ │  host dialog
//!    │ ◀──────────────── closeTabConfirmed  │  on approval
//!    │ ◀──────────────────────── setContent │  skipped if unchanged
//! ```

use serde::{Deserialize, Serialize};

use crate::tab::TabState;

/// Payload of an `update` message.
///
/// Current views send the whole state; the single-buffer view sent bare text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatePayload {
    State(TabState),
    Text(String),
}

/// Messages sent by the panel view to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ViewMessage {
    /// The editor widget finished initialising and can receive content.
    Ready,
    /// Content (or full state) changed in the view.
    Update(UpdatePayload),
    /// User asked for a new tab.
    AddTab,
    /// User selected another tab.
    SwitchTab { index: usize },
    /// User asked to close a tab; the engine confirms before mutating.
    ConfirmCloseTab { index: usize, title: String },
    /// User asked to rename a tab. `new_title` is set when the view collected
    /// the title inline, otherwise the engine prompts for one.
    #[serde(rename_all = "camelCase")]
    RenameTab {
        index: usize,
        current_title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_title: Option<String>,
    },
    /// Something failed inside the view.
    Error(String),
}

/// Messages sent by the engine to the panel view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HostMessage {
    /// Full state push on materialization.
    Init(TabState),
    /// Close approved; the view drops the tab at this index.
    CloseTabConfirmed(usize),
    /// Title changed through a host dialog.
    #[serde(rename_all = "camelCase")]
    TabRenamed { index: usize, new_title: String },
    /// A new tab exists and is active.
    TabAdded { index: usize, title: String },
    /// The active tab changed.
    TabSwitched { index: usize },
    /// Replace the editor's full text.
    SetContent(String),
}

impl HostMessage {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::Init(_) => "init",
            HostMessage::CloseTabConfirmed(_) => "closeTabConfirmed",
            HostMessage::TabRenamed { .. } => "tabRenamed",
            HostMessage::TabAdded { .. } => "tabAdded",
            HostMessage::TabSwitched { .. } => "tabSwitched",
            HostMessage::SetContent(_) => "setContent",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
