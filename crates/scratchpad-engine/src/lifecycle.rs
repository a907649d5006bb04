//! Panel view lifecycle.
//!
//! The host creates, shows, hides and disposes the panel independently of
//! the model. [`Lifecycle`] tracks which phase the view is in and tells the
//! actor where the state for a new view should come from.
//!
//! ```text
//!            created / shown                ready
//!  Absent ───────────────────▶ Pending ─────────────▶ Ready
//!    ▲                           ▲                      │
//!    │ disposed                  │ shown                │ hidden
//!    │                           │                      ▼
//!    └───────────────────────── (any) ◀─────────────  Hidden
//! ```

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    /// No view exists.
    #[default]
    Absent,
    /// View created; not yet able to take content.
    Pending,
    /// View reported ready.
    Ready,
    /// View exists but is not visible. Its contents are stale on return.
    Hidden,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    phase: ViewPhase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// A new view was created. It always needs the model attached.
    pub fn created(&mut self) {
        debug!(previous = ?self.phase, "panel view created");
        self.phase = ViewPhase::Pending;
    }

    /// The view became visible. Returns whether a fresh view now waits for
    /// the model; false when the current view is still live.
    pub fn shown(&mut self) -> bool {
        match self.phase {
            ViewPhase::Absent => {
                self.created();
                true
            }
            ViewPhase::Hidden => {
                debug!("panel view shown again");
                self.phase = ViewPhase::Pending;
                true
            }
            ViewPhase::Pending | ViewPhase::Ready => false,
        }
    }

    /// The view reported it can take content. Returns false if no view is
    /// expected, in which case the signal is ignored.
    pub fn ready(&mut self) -> bool {
        match self.phase {
            ViewPhase::Pending | ViewPhase::Ready => {
                self.phase = ViewPhase::Ready;
                true
            }
            ViewPhase::Absent | ViewPhase::Hidden => {
                debug!(phase = ?self.phase, "ignoring ready from inactive view");
                false
            }
        }
    }

    /// The view was hidden. Returns whether a live view was released.
    pub fn hidden(&mut self) -> bool {
        match self.phase {
            ViewPhase::Pending | ViewPhase::Ready => {
                self.phase = ViewPhase::Hidden;
                true
            }
            ViewPhase::Absent | ViewPhase::Hidden => false,
        }
    }

    /// The view was destroyed. Returns whether a view existed.
    pub fn disposed(&mut self) -> bool {
        let existed = self.phase != ViewPhase::Absent;
        self.phase = ViewPhase::Absent;
        existed
    }
}
