//! Tab state model.
//!
//! [`TabState`] is an ordered, never-empty list of [`Tab`]s plus the index of
//! the active one. Every mutation is a pure transformation: it takes `&self`
//! and returns the next state, or a [`TabError`] leaving the original intact.
//!
//! # Invariants
//!
//! - `tabs.len() >= 1`: the last remaining tab cannot be closed
//! - `current_tab_index < tabs.len()`
//! - every title is non-blank
//!
//! The fields are private and deserialization goes through the same
//! validation as [`TabState::new`], so no reachable value breaks them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title given to freshly added tabs and to upgraded legacy content.
pub const DEFAULT_TAB_TITLE: &str = "New Tab";

/// A named text buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Display name. Non-blank, not required to be unique.
    pub title: String,
    /// Arbitrary text, may be empty.
    #[serde(default)]
    pub content: String,
}

impl Tab {
    /// Create a tab with the given title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// An empty tab carrying [`DEFAULT_TAB_TITLE`].
    pub fn untitled() -> Self {
        Self::new(DEFAULT_TAB_TITLE, "")
    }
}

/// Rejected tab mutation. The state the operation was applied to is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    /// Index does not address a live tab.
    #[error("tab index {index} out of range ({len} tabs)")]
    InvalidIndex { index: usize, len: usize },

    /// Title is empty after trimming.
    #[error("tab title must not be empty")]
    InvalidTitle,

    /// Closing would leave no tabs.
    #[error("the last remaining tab cannot be closed")]
    LastTabProtected,

    /// A state was constructed from an empty tab list.
    #[error("tab state must contain at least one tab")]
    NoTabs,
}

/// Ordered tabs plus the active selection. The unit of persistence and of
/// reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTabState", rename_all = "camelCase")]
pub struct TabState {
    tabs: Vec<Tab>,
    current_tab_index: usize,
}

/// Unvalidated wire shape, converted through [`TabState::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTabState {
    tabs: Vec<Tab>,
    current_tab_index: usize,
}

impl TryFrom<RawTabState> for TabState {
    type Error = TabError;

    fn try_from(raw: RawTabState) -> Result<Self, Self::Error> {
        TabState::new(raw.tabs, raw.current_tab_index)
    }
}

impl Default for TabState {
    /// A single empty "New Tab".
    fn default() -> Self {
        Self {
            tabs: vec![Tab::untitled()],
            current_tab_index: 0,
        }
    }
}

impl TabState {
    /// Build a state, checking every invariant.
    pub fn new(tabs: Vec<Tab>, current_tab_index: usize) -> Result<Self, TabError> {
        if tabs.is_empty() {
            return Err(TabError::NoTabs);
        }
        if current_tab_index >= tabs.len() {
            return Err(TabError::InvalidIndex {
                index: current_tab_index,
                len: tabs.len(),
            });
        }
        if tabs.iter().any(|tab| tab.title.trim().is_empty()) {
            return Err(TabError::InvalidTitle);
        }
        Ok(Self {
            tabs,
            current_tab_index,
        })
    }

    /// Single tab holding `text`, as produced by the pre-tabs scratchpad.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            tabs: vec![Tab::new(DEFAULT_TAB_TITLE, text)],
            current_tab_index: 0,
        }
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Always false; present for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn current_tab_index(&self) -> usize {
        self.current_tab_index
    }

    pub fn get(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    /// The tab addressed by `current_tab_index`.
    pub fn active_tab(&self) -> &Tab {
        &self.tabs[self.current_tab_index]
    }

    pub fn active_content(&self) -> &str {
        &self.active_tab().content
    }

    /// True when both states have the same tab count, titles and active index,
    /// i.e. they differ at most in tab contents.
    pub fn same_layout(&self, other: &TabState) -> bool {
        self.current_tab_index == other.current_tab_index
            && self.tabs.len() == other.tabs.len()
            && self
                .tabs
                .iter()
                .zip(&other.tabs)
                .all(|(a, b)| a.title == b.title)
    }

    fn check_index(&self, index: usize) -> Result<(), TabError> {
        if index < self.tabs.len() {
            Ok(())
        } else {
            Err(TabError::InvalidIndex {
                index,
                len: self.tabs.len(),
            })
        }
    }

    // =========================================================================
    // Mutations (pure)
    // =========================================================================

    /// Append an empty [`DEFAULT_TAB_TITLE`] tab and make it active.
    pub fn add_tab(&self) -> Self {
        let mut tabs = self.tabs.clone();
        tabs.push(Tab::untitled());
        let current_tab_index = tabs.len() - 1;
        Self {
            tabs,
            current_tab_index,
        }
    }

    /// Replace the title at `index` with `new_title` (trimmed).
    pub fn rename_tab(&self, index: usize, new_title: &str) -> Result<Self, TabError> {
        self.check_index(index)?;
        let title = new_title.trim();
        if title.is_empty() {
            return Err(TabError::InvalidTitle);
        }
        let mut next = self.clone();
        next.tabs[index].title = title.to_string();
        Ok(next)
    }

    /// Remove the tab at `index`, clamping the active index to the new bounds.
    pub fn close_tab(&self, index: usize) -> Result<Self, TabError> {
        if self.tabs.len() == 1 {
            return Err(TabError::LastTabProtected);
        }
        self.check_index(index)?;
        let mut tabs = self.tabs.clone();
        tabs.remove(index);
        let current_tab_index = self.current_tab_index.min(tabs.len() - 1);
        Ok(Self {
            tabs,
            current_tab_index,
        })
    }

    /// Make the tab at `index` active.
    ///
    /// The caller must already have committed the outgoing tab's content.
    pub fn switch_tab(&self, index: usize) -> Result<Self, TabError> {
        self.check_index(index)?;
        Ok(Self {
            tabs: self.tabs.clone(),
            current_tab_index: index,
        })
    }

    /// Overwrite the active tab's content.
    pub fn set_active_content(&self, text: &str) -> Self {
        let mut next = self.clone();
        next.tabs[self.current_tab_index].content = text.to_string();
        next
    }

    /// Overwrite the content of the tab at `index` without changing the
    /// active selection.
    pub fn set_tab_content(&self, index: usize, text: &str) -> Result<Self, TabError> {
        self.check_index(index)?;
        let mut next = self.clone();
        next.tabs[index].content = text.to_string();
        Ok(next)
    }
}

// ============================================================================
// Tests
// ============================================================================
