//! Engine tuning.

use std::time::Duration;

/// Quiescence required before a content edit is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Per-panel engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Debounce window for content-only edits. Structural changes ignore it.
    pub debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl EngineConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}
