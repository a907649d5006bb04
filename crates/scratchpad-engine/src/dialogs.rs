//! Host-owned user interaction.
//!
//! Close confirmation and title input are modal in most hosts, so they are
//! async and may take arbitrarily long. The panel keeps processing view
//! messages meanwhile; results are re-validated when they come back.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

#[async_trait]
pub trait HostDialogs: Send + Sync + 'static {
    /// Ask whether the tab titled `title` should be closed.
    async fn confirm_close(&self, title: &str) -> bool;

    /// Ask for a new tab title. `None` when the user cancels.
    async fn prompt_title(&self, current: &str) -> Option<String>;

    /// Non-blocking warning.
    fn warn(&self, message: &str);
}

/// Dialogs answered by a fixed policy.
///
/// Used for headless hosts and tests: closes are approved or rejected
/// wholesale, titles are taken from a script in order, warnings are kept.
#[derive(Debug, Default)]
pub struct PolicyDialogs {
    approve_close: bool,
    titles: Mutex<VecDeque<String>>,
    warnings: Mutex<Vec<String>>,
}

impl PolicyDialogs {
    pub fn approve_all() -> Self {
        Self {
            approve_close: true,
            ..Self::default()
        }
    }

    /// Reject every close and cancel every rename.
    pub fn reject_all() -> Self {
        Self::default()
    }

    /// Answer title prompts with `titles`, one per prompt.
    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.titles = Mutex::new(titles.into_iter().map(Into::into).collect());
        self
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

#[async_trait]
impl HostDialogs for PolicyDialogs {
    async fn confirm_close(&self, title: &str) -> bool {
        info!(title, approved = self.approve_close, "close confirmation");
        self.approve_close
    }

    async fn prompt_title(&self, current: &str) -> Option<String> {
        let title = self.titles.lock().pop_front();
        info!(current, ?title, "title prompt");
        title
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}
