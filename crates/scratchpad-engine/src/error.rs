//! Engine errors.

/// Errors surfaced through [`PanelHandle`](crate::PanelHandle).
///
/// Model validation failures never show up here: they are reported to the
/// user as warnings and the panel carries on.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The writer could not store the state.
    #[error("persistence failure: {0}")]
    Persistence(String),
    /// The panel actor is gone.
    #[error("panel actor shut down")]
    Shutdown,
}
