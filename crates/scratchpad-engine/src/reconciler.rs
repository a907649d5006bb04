//! Model ↔ view reconciliation.
//!
//! [`Reconciler`] owns the authoritative [`TabState`] and a mirror of what the
//! live view is believed to display. Every input (a view message, a timer
//! tick, a dialog decision, a write failure) returns the [`Effect`]s the
//! caller must carry out, in order.
//!
//! # Rules
//!
//! - Content edits restart the debounce window; only the state after
//!   quiescence is written.
//! - Structural changes (add, switch, rename, close, a relayout from the view)
//!   cancel the window and write immediately, so a pending edit rides along
//!   with them instead of racing them.
//! - A `setContent` push is dropped when the mirror already holds that text.
//! - Nothing is pushed before the view reports ready; the `init` sent at
//!   readiness carries whatever changed in between.
//! - A write of a state equal to the last one handed to the writer is
//!   skipped.
//!
//! # Late view updates
//!
//! The view may post a full state built on a layout the engine has already
//! replaced (it sent the update before `tabRenamed` or `closeTabConfirmed`
//! reached it). Layouts replaced by the engine are remembered until the view
//! catches up. An update matching one of them only contributes its active
//! tab's content, routed by [`TabId`] to wherever that tab lives now.
//!
//! Dialog results are also addressed by [`TabId`], so closes and renames
//! resolved out of order still hit the tab the user was asked about.
//!
//! # State Machine (view mirror)
//!
//! ```text
//! +-----------+  attach_view   +-----------+  view_ready (init)  +-----------+
//! | Detached  | ─────────────▶ |  Pending  | ──────────────────▶ |   Ready   |
//! +-----------+                +-----------+                     +-----+-----+
//!       ▲                                                              │
//!       └──────────────── detach_view (flush) ─────────────────────────┘
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace, warn};

use scratchpad_types::{
    DEFAULT_TAB_TITLE, HostMessage, TabError, TabState, UpdatePayload, ViewMessage,
};

use crate::debounce::Debouncer;

/// Replaced layouts kept for matching late view updates.
const MAX_SUPERSEDED: usize = 16;

/// Runtime identity of a tab. Stable across index shifts, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

/// Why a write was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistReason {
    /// Debounce window elapsed after content edits.
    Debounced,
    /// Add, switch, rename, close or relayout.
    Structural,
    /// Explicit flush (view released, shutdown).
    Flush,
}

/// Work the caller must perform on behalf of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver a message to the view.
    Send(HostMessage),
    /// Hand this state to the writer.
    Persist { state: TabState, reason: PersistReason },
    /// Show a non-fatal warning to the user.
    Warn(String),
    /// Open the close confirmation flow, then call [`Reconciler::resolve_close`].
    ConfirmClose { tab: TabId, title: String },
    /// Open the title input flow, then call [`Reconciler::resolve_rename`].
    PromptTitle { tab: TabId, current_title: String },
}

/// What the engine believes the view currently shows.
#[derive(Debug, Default)]
struct ViewMirror {
    ready: bool,
    text: Option<String>,
}

/// A layout the engine replaced that the view may still be showing.
#[derive(Debug)]
struct Superseded {
    state: TabState,
    ids: Vec<TabId>,
}

/// Reconciles one [`TabState`] against one panel view.
#[derive(Debug)]
pub struct Reconciler {
    state: TabState,
    /// Parallel to `state.tabs()`.
    ids: Vec<TabId>,
    next_id: u64,
    superseded: Vec<Superseded>,
    view: ViewMirror,
    debounce: Debouncer,
    /// Last state handed to the writer (or loaded from it). `None` forces the
    /// next persist through.
    persisted: Option<TabState>,
}

impl Reconciler {
    /// Start from a state that is already stored.
    pub fn new(state: TabState, debounce: Duration) -> Self {
        let len = state.len() as u64;
        Self {
            persisted: Some(state.clone()),
            ids: (0..len).map(TabId).collect(),
            next_id: len,
            superseded: Vec::new(),
            state,
            view: ViewMirror::default(),
            debounce: Debouncer::new(debounce),
        }
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    pub fn state(&self) -> &TabState {
        &self.state
    }

    pub fn tab_id(&self, index: usize) -> Option<TabId> {
        self.ids.get(index).copied()
    }

    /// Current index of `tab`, if it still exists.
    pub fn index_of(&self, tab: TabId) -> Option<usize> {
        self.ids.iter().position(|id| *id == tab)
    }

    pub fn is_view_ready(&self) -> bool {
        self.view.ready
    }

    /// Text the view is believed to display, if known.
    pub fn view_text(&self) -> Option<&str> {
        self.view.text.as_deref()
    }

    pub fn has_pending_persist(&self) -> bool {
        self.debounce.is_pending()
    }

    /// When the pending content write becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    // =========================================================================
    // View attachment
    // =========================================================================

    /// A view was created; it cannot take content until it reports ready.
    pub fn attach_view(&mut self) {
        self.view = ViewMirror::default();
    }

    /// The view can take content: push the full state.
    pub fn view_ready(&mut self) -> Vec<Effect> {
        let mut out = Vec::new();
        self.view.ready = true;
        self.superseded.clear();
        self.push(HostMessage::Init(self.state.clone()), &mut out);
        out
    }

    /// The view is going away: write any pending edit and forget the mirror.
    pub fn detach_view(&mut self) -> Vec<Effect> {
        let out = self.flush();
        self.view = ViewMirror::default();
        out
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Apply one message from the view.
    pub fn handle(&mut self, msg: ViewMessage, now: Instant) -> Vec<Effect> {
        let mut out = Vec::new();
        match msg {
            ViewMessage::Ready => return self.view_ready(),
            ViewMessage::Update(UpdatePayload::Text(text)) => self.edit_content(text, now),
            ViewMessage::Update(UpdatePayload::State(incoming)) => {
                self.reconcile_incoming(incoming, now, &mut out)
            }
            ViewMessage::AddTab => {
                let next = self.state.add_tab();
                let index = next.current_tab_index();
                let mut ids = self.ids.clone();
                ids.push(self.fresh_id());
                self.commit(next, ids, &mut out);
                self.push(
                    HostMessage::TabAdded {
                        index,
                        title: DEFAULT_TAB_TITLE.to_string(),
                    },
                    &mut out,
                );
                self.push(HostMessage::SetContent(String::new()), &mut out);
            }
            ViewMessage::SwitchTab { index } => match self.state.switch_tab(index) {
                Ok(next) => {
                    self.commit(next, self.ids.clone(), &mut out);
                    self.push(HostMessage::TabSwitched { index }, &mut out);
                    let content = self.state.active_content().to_string();
                    self.push(HostMessage::SetContent(content), &mut out);
                }
                Err(e) => self.reject("switch tab", e, &mut out),
            },
            ViewMessage::ConfirmCloseTab { index, title } => {
                if let Err(e) = self.state.close_tab(index) {
                    self.reject("close tab", e, &mut out);
                } else {
                    match self.tab_at(index, &title) {
                        Some(tab) => out.push(Effect::ConfirmClose { tab, title }),
                        None => self.stale(&title, &mut out),
                    }
                }
            }
            ViewMessage::RenameTab {
                index,
                current_title,
                new_title,
            } => match self.tab_id(index) {
                None => {
                    let e = TabError::InvalidIndex {
                        index,
                        len: self.state.len(),
                    };
                    self.reject("rename tab", e, &mut out);
                }
                // Inline input: the view already collected the title.
                Some(tab) if new_title.is_some() => {
                    out.extend(self.resolve_rename(tab, &current_title, new_title));
                }
                Some(tab) => out.push(Effect::PromptTitle { tab, current_title }),
            },
            ViewMessage::Error(message) => {
                warn!(%message, "panel view reported an error");
                out.push(Effect::Warn(message));
            }
        }
        out
    }

    /// Timer tick: write if the debounce window has elapsed.
    pub fn poll_debounce(&mut self, now: Instant) -> Vec<Effect> {
        let mut out = Vec::new();
        if self.debounce.take_due(now) {
            self.persist_now(PersistReason::Debounced, &mut out);
        }
        out
    }

    /// Write the current state now if it differs from the stored one.
    pub fn flush(&mut self) -> Vec<Effect> {
        let mut out = Vec::new();
        self.persist_now(PersistReason::Flush, &mut out);
        out
    }

    /// Outcome of the close confirmation for `tab`, wherever it sits now.
    pub fn resolve_close(&mut self, tab: TabId, title: &str, approved: bool) -> Vec<Effect> {
        let mut out = Vec::new();
        if !approved {
            debug!(?tab, title, "close cancelled");
            return out;
        }
        let Some(index) = self.index_of(tab) else {
            self.stale(title, &mut out);
            return out;
        };
        match self.state.close_tab(index) {
            Ok(next) => {
                let mut ids = self.ids.clone();
                ids.remove(index);
                self.commit(next, ids, &mut out);
                self.push(HostMessage::CloseTabConfirmed(index), &mut out);
                let content = self.state.active_content().to_string();
                self.push(HostMessage::SetContent(content), &mut out);
            }
            Err(e) => self.reject("close tab", e, &mut out),
        }
        out
    }

    /// Outcome of the title input for `tab`. `None` means the user cancelled.
    ///
    /// Rejected when the tab is gone or no longer titled `current_title`.
    pub fn resolve_rename(
        &mut self,
        tab: TabId,
        current_title: &str,
        new_title: Option<String>,
    ) -> Vec<Effect> {
        let mut out = Vec::new();
        let Some(new_title) = new_title else {
            debug!(?tab, "rename cancelled");
            return out;
        };
        let index = self
            .index_of(tab)
            .filter(|&i| self.state.tabs()[i].title == current_title);
        let Some(index) = index else {
            self.stale(current_title, &mut out);
            return out;
        };
        match self.state.rename_tab(index, &new_title) {
            Ok(next) => {
                let new_title = next.tabs()[index].title.clone();
                self.commit(next, self.ids.clone(), &mut out);
                self.push(HostMessage::TabRenamed { index, new_title }, &mut out);
            }
            Err(e) => self.reject("rename tab", e, &mut out),
        }
        out
    }

    /// A write failed. The next persist goes through even if unchanged.
    pub fn persist_failed(&mut self, error: &str) -> Vec<Effect> {
        warn!(%error, "failed to save tab state");
        self.persisted = None;
        vec![Effect::Warn(format!("Failed to save scratchpad: {error}"))]
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn fresh_id(&mut self) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Id of the tab at `index` if it carries `title`.
    fn tab_at(&self, index: usize, title: &str) -> Option<TabId> {
        self.state
            .get(index)
            .filter(|tab| tab.title == title)
            .and(self.tab_id(index))
    }

    fn edit_content(&mut self, text: String, now: Instant) {
        if self.state.active_content() != text {
            self.state = self.state.set_active_content(&text);
            self.debounce.touch(now);
        }
        self.view.text = Some(text);
    }

    fn reconcile_incoming(&mut self, incoming: TabState, now: Instant, out: &mut Vec<Effect>) {
        if incoming.same_layout(&self.state) {
            self.superseded.clear();
            self.view.text = Some(incoming.active_content().to_string());
            if incoming == self.state {
                trace!("view update matches model");
            } else {
                self.state = incoming;
                self.debounce.touch(now);
            }
            return;
        }

        if let Some(pos) = self
            .superseded
            .iter()
            .rposition(|old| incoming.same_layout(&old.state))
        {
            let tab = self.superseded[pos].ids[incoming.current_tab_index()];
            // The view moves forward; older layouts cannot come back.
            self.superseded = self.superseded.split_off(pos);
            debug!(?tab, "late update from a replaced layout");
            self.apply_late_content(tab, incoming.active_content(), now);
            return;
        }

        debug!(
            tabs = incoming.len(),
            active = incoming.current_tab_index(),
            "view relayout"
        );
        let same_tabs = incoming.len() == self.state.len()
            && incoming
                .tabs()
                .iter()
                .map(|t| &t.title)
                .eq(self.state.tabs().iter().map(|t| &t.title));
        self.ids = if same_tabs {
            self.ids.clone()
        } else {
            (0..incoming.len()).map(|_| self.fresh_id()).collect()
        };
        self.superseded.clear();
        self.view.text = Some(incoming.active_content().to_string());
        self.state = incoming;
        self.persist_now(PersistReason::Structural, out);
    }

    fn apply_late_content(&mut self, tab: TabId, text: &str, now: Instant) {
        let Some(index) = self.index_of(tab) else {
            debug!(?tab, "dropping late content for a closed tab");
            return;
        };
        if self.state.tabs()[index].content == text {
            return;
        }
        match self.state.set_tab_content(index, text) {
            Ok(next) => {
                self.state = next;
                self.debounce.touch(now);
                if index == self.state.current_tab_index() {
                    self.view.text = Some(text.to_string());
                }
            }
            Err(e) => debug!(%e, "late content rejected"),
        }
    }

    /// Apply an engine-confirmed structural change and write it.
    fn commit(&mut self, next: TabState, ids: Vec<TabId>, out: &mut Vec<Effect>) {
        let replaced = std::mem::replace(&mut self.ids, ids);
        if !next.same_layout(&self.state) {
            if self.superseded.len() == MAX_SUPERSEDED {
                self.superseded.remove(0);
            }
            self.superseded.push(Superseded {
                state: self.state.clone(),
                ids: replaced,
            });
        }
        self.state = next;
        self.persist_now(PersistReason::Structural, out);
    }

    fn persist_now(&mut self, reason: PersistReason, out: &mut Vec<Effect>) {
        self.debounce.cancel();
        if self.persisted.as_ref() == Some(&self.state) {
            trace!(?reason, "state unchanged since last write, skipping");
            return;
        }
        self.persisted = Some(self.state.clone());
        out.push(Effect::Persist {
            state: self.state.clone(),
            reason,
        });
    }

    fn push(&mut self, msg: HostMessage, out: &mut Vec<Effect>) {
        if !self.view.ready {
            trace!(kind = msg.kind(), "view not ready, deferring to init");
            return;
        }
        match &msg {
            HostMessage::SetContent(text) => {
                if self.view.text.as_deref() == Some(text.as_str()) {
                    trace!("view already shows this content");
                    return;
                }
                self.view.text = Some(text.clone());
            }
            HostMessage::Init(state) => {
                self.view.text = Some(state.active_content().to_string());
            }
            _ => {}
        }
        out.push(Effect::Send(msg));
    }

    fn stale(&self, title: &str, out: &mut Vec<Effect>) {
        warn!(title, "tab changed while the request was pending");
        out.push(Effect::Warn(format!(
            "Tab \"{title}\" changed before the request could be applied"
        )));
    }

    fn reject(&self, action: &str, error: TabError, out: &mut Vec<Effect>) {
        debug!(action, %error, "rejected tab mutation");
        out.push(Effect::Warn(format!("Cannot {action}: {error}")));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use scratchpad_types::Tab;

    const WINDOW: Duration = Duration::from_secs(1);

    fn ready(state: TabState) -> Reconciler {
        let mut r = Reconciler::new(state, WINDOW);
        r.attach_view();
        r.view_ready();
        r
    }

    fn text(s: &str) -> ViewMessage {
        ViewMessage::Update(UpdatePayload::Text(s.to_string()))
    }

    fn full(state: TabState) -> ViewMessage {
        ViewMessage::Update(UpdatePayload::State(state))
    }

    fn persists(effects: &[Effect]) -> Vec<&TabState> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Persist { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }

    fn sends(effects: &[Effect]) -> Vec<&HostMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn warned(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::Warn(_)))
    }

    fn contents(r: &Reconciler) -> Vec<&str> {
        r.state().tabs().iter().map(|t| t.content.as_str()).collect()
    }

    /// Ask to close `index` and return the tab the dialog is about.
    fn request_close(r: &mut Reconciler, index: usize, title: &str) -> TabId {
        let effects = r.handle(
            ViewMessage::ConfirmCloseTab { index, title: title.into() },
            Instant::now(),
        );
        match effects.as_slice() {
            [Effect::ConfirmClose { tab, .. }] => *tab,
            other => panic!("expected close confirmation, got {other:?}"),
        }
    }

    fn two_tabs() -> TabState {
        TabState::new(vec![Tab::new("a", "one"), Tab::new("b", "two")], 0).unwrap()
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    #[test]
    fn test_nothing_sent_before_ready() {
        let mut r = Reconciler::new(TabState::default(), WINDOW);
        r.attach_view();
        let effects = r.handle(ViewMessage::AddTab, Instant::now());
        assert!(sends(&effects).is_empty());
        assert_eq!(persists(&effects).len(), 1);

        let effects = r.view_ready();
        assert_eq!(sends(&effects), vec![&HostMessage::Init(r.state().clone())]);
        assert_eq!(r.state().len(), 2);
    }

    #[test]
    fn test_ready_message_pushes_init() {
        let mut r = Reconciler::new(two_tabs(), WINDOW);
        r.attach_view();
        let effects = r.handle(ViewMessage::Ready, Instant::now());
        assert_eq!(effects, vec![Effect::Send(HostMessage::Init(two_tabs()))]);
        assert_eq!(r.view_text(), Some("one"));
    }

    // =========================================================================
    // Content edits and debounce
    // =========================================================================

    #[test]
    fn test_rapid_edits_write_once_with_final_content() {
        let mut r = ready(TabState::default());
        let t0 = Instant::now();
        let mut all = Vec::new();
        for i in 0..10u64 {
            let at = t0 + Duration::from_millis(i * 90);
            all.extend(r.handle(text(&format!("draft {i}")), at));
            all.extend(r.poll_debounce(at));
        }
        assert!(persists(&all).is_empty());

        let last = t0 + Duration::from_millis(9 * 90);
        assert!(r.poll_debounce(last + Duration::from_millis(999)).is_empty());

        let effects = r.poll_debounce(last + WINDOW);
        let written = persists(&effects);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].active_content(), "draft 9");
        assert!(!r.has_pending_persist());
    }

    #[test]
    fn test_edit_back_to_stored_content_skips_write() {
        let mut r = ready(two_tabs());
        let t0 = Instant::now();
        r.handle(text("changed"), t0);
        r.handle(text("one"), t0 + Duration::from_millis(10));
        assert!(persists(&r.poll_debounce(t0 + WINDOW * 2)).is_empty());
    }

    #[test]
    fn test_identical_edit_does_not_arm_timer() {
        let mut r = ready(two_tabs());
        r.handle(text("one"), Instant::now());
        assert!(!r.has_pending_persist());
    }

    #[test]
    fn test_content_only_state_update_is_debounced() {
        let mut r = ready(two_tabs());
        let incoming = two_tabs().set_active_content("edited");
        let effects = r.handle(full(incoming.clone()), Instant::now());
        assert!(effects.is_empty());
        assert!(r.has_pending_persist());
        assert_eq!(r.state(), &incoming);
    }

    #[test]
    fn test_structural_state_update_writes_immediately() {
        let mut r = ready(two_tabs());
        r.handle(text("pending edit"), Instant::now());
        let incoming = r.state().switch_tab(1).unwrap();
        let effects = r.handle(full(incoming.clone()), Instant::now());
        assert_eq!(persists(&effects), vec![&incoming]);
        assert_eq!(incoming.tabs()[0].content, "pending edit");
        assert!(!r.has_pending_persist());
        assert!(sends(&effects).is_empty(), "no echo back to the view");
    }

    // =========================================================================
    // Structural actions
    // =========================================================================

    #[test]
    fn test_add_cancels_timer_and_carries_pending_edit() {
        let mut r = ready(TabState::default());
        r.handle(text("typed"), Instant::now());
        assert!(r.has_pending_persist());

        let effects = r.handle(ViewMessage::AddTab, Instant::now());
        let written = persists(&effects);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].tabs()[0].content, "typed");
        assert_eq!(written[0].current_tab_index(), 1);
        assert!(!r.has_pending_persist());
        assert_eq!(
            sends(&effects),
            vec![
                &HostMessage::TabAdded { index: 1, title: "New Tab".into() },
                &HostMessage::SetContent(String::new()),
            ]
        );
    }

    #[test]
    fn test_add_from_empty_view_skips_set_content() {
        let mut r = ready(TabState::default());
        let effects = r.handle(ViewMessage::AddTab, Instant::now());
        assert_eq!(
            sends(&effects),
            vec![&HostMessage::TabAdded { index: 1, title: "New Tab".into() }]
        );
    }

    #[test]
    fn test_switch_sets_view_content() {
        let mut r = ready(two_tabs());
        let effects = r.handle(ViewMessage::SwitchTab { index: 1 }, Instant::now());
        assert_eq!(persists(&effects).len(), 1);
        assert_eq!(
            sends(&effects),
            vec![
                &HostMessage::TabSwitched { index: 1 },
                &HostMessage::SetContent("two".into()),
            ]
        );
        assert_eq!(r.view_text(), Some("two"));
    }

    #[test]
    fn test_switch_out_of_range_warns() {
        let mut r = ready(two_tabs());
        let effects = r.handle(ViewMessage::SwitchTab { index: 9 }, Instant::now());
        assert!(warned(&effects));
        assert!(persists(&effects).is_empty());
        assert_eq!(r.state(), &two_tabs());
    }

    #[test]
    fn test_close_requires_confirmation() {
        let mut r = ready(two_tabs());
        let tab = request_close(&mut r, 0, "a");
        assert_eq!(Some(tab), r.tab_id(0));
        assert_eq!(r.state().len(), 2);

        let effects = r.resolve_close(tab, "a", true);
        assert_eq!(r.state().tabs(), &[Tab::new("b", "two")]);
        assert_eq!(persists(&effects).len(), 1);
        assert_eq!(
            sends(&effects),
            vec![
                &HostMessage::CloseTabConfirmed(0),
                &HostMessage::SetContent("two".into()),
            ]
        );
    }

    #[test]
    fn test_close_declined_changes_nothing() {
        let mut r = ready(two_tabs());
        let tab = request_close(&mut r, 1, "b");
        assert!(r.resolve_close(tab, "b", false).is_empty());
        assert_eq!(r.state(), &two_tabs());
    }

    #[test]
    fn test_close_last_tab_warns_without_dialog() {
        let mut r = ready(TabState::default());
        let effects = r.handle(
            ViewMessage::ConfirmCloseTab { index: 0, title: "New Tab".into() },
            Instant::now(),
        );
        assert_eq!(effects.len(), 1);
        let Effect::Warn(message) = &effects[0] else {
            panic!("expected warning, got {effects:?}");
        };
        assert!(message.contains("last remaining tab"));
    }

    #[test]
    fn test_close_request_with_wrong_title_warns() {
        let mut r = ready(two_tabs());
        let effects = r.handle(
            ViewMessage::ConfirmCloseTab { index: 1, title: "a".into() },
            Instant::now(),
        );
        assert!(warned(&effects));
        assert!(!effects.iter().any(|e| matches!(e, Effect::ConfirmClose { .. })));
    }

    #[test]
    fn test_out_of_order_closes_hit_the_confirmed_tabs() {
        let tabs = ["A", "B", "C", "D"]
            .into_iter()
            .map(|content| Tab::new("New Tab", content))
            .collect();
        let mut r = ready(TabState::new(tabs, 0).unwrap());

        let close_b = request_close(&mut r, 1, "New Tab");
        let close_a = request_close(&mut r, 0, "New Tab");
        r.resolve_close(close_a, "New Tab", true);
        let effects = r.resolve_close(close_b, "New Tab", true);

        assert_eq!(contents(&r), ["C", "D"]);
        assert_eq!(sends(&effects)[0], &HostMessage::CloseTabConfirmed(0));
    }

    #[test]
    fn test_close_of_already_closed_tab_warns() {
        let mut r = ready(TabState::new(
            vec![Tab::new("a", "1"), Tab::new("b", "2"), Tab::new("c", "3")],
            0,
        )
        .unwrap());
        let first = request_close(&mut r, 1, "b");
        let second = request_close(&mut r, 1, "b");
        r.resolve_close(first, "b", true);
        let effects = r.resolve_close(second, "b", true);
        assert!(warned(&effects));
        assert_eq!(contents(&r), ["1", "3"]);
    }

    #[test]
    fn test_close_follows_tab_after_rename() {
        let mut r = ready(two_tabs());
        let tab = request_close(&mut r, 1, "b");
        r.resolve_rename(r.tab_id(1).unwrap(), "b", Some("renamed".into()));
        r.resolve_close(tab, "b", true);
        assert_eq!(r.state().tabs(), &[Tab::new("a", "one")]);
    }

    #[test]
    fn test_rename_prompts_then_applies() {
        let mut r = ready(two_tabs());
        let effects = r.handle(
            ViewMessage::RenameTab {
                index: 1,
                current_title: "b".into(),
                new_title: None,
            },
            Instant::now(),
        );
        let tab = r.tab_id(1).unwrap();
        assert_eq!(
            effects,
            vec![Effect::PromptTitle { tab, current_title: "b".into() }]
        );

        let effects = r.resolve_rename(tab, "b", Some("  Ideas ".into()));
        assert_eq!(r.state().tabs()[1].title, "Ideas");
        assert_eq!(persists(&effects).len(), 1);
        assert_eq!(
            sends(&effects),
            vec![&HostMessage::TabRenamed { index: 1, new_title: "Ideas".into() }]
        );
    }

    #[test]
    fn test_rename_follows_tab_after_index_shift() {
        let mut r = ready(TabState::new(
            vec![Tab::new("a", "1"), Tab::new("b", "2"), Tab::new("c", "3")],
            0,
        )
        .unwrap());
        let rename_c = r.tab_id(2).unwrap();
        let close_a = request_close(&mut r, 0, "a");
        r.resolve_close(close_a, "a", true);

        let effects = r.resolve_rename(rename_c, "c", Some("last".into()));
        assert_eq!(r.state().tabs()[1].title, "last");
        assert_eq!(
            sends(&effects),
            vec![&HostMessage::TabRenamed { index: 1, new_title: "last".into() }]
        );
    }

    #[test]
    fn test_rename_of_retitled_tab_warns() {
        let mut r = ready(two_tabs());
        let tab = r.tab_id(0).unwrap();
        r.resolve_rename(tab, "a", Some("first".into()));
        let effects = r.resolve_rename(tab, "a", Some("second".into()));
        assert!(warned(&effects));
        assert_eq!(r.state().tabs()[0].title, "first");
    }

    #[test]
    fn test_inline_rename_skips_prompt() {
        let mut r = ready(two_tabs());
        let effects = r.handle(
            ViewMessage::RenameTab {
                index: 0,
                current_title: "a".into(),
                new_title: Some("first".into()),
            },
            Instant::now(),
        );
        assert!(!effects.iter().any(|e| matches!(e, Effect::PromptTitle { .. })));
        assert_eq!(r.state().tabs()[0].title, "first");
    }

    #[test]
    fn test_rename_blank_title_rejected() {
        let mut r = ready(two_tabs());
        let effects = r.resolve_rename(r.tab_id(0).unwrap(), "a", Some("   ".into()));
        assert!(warned(&effects));
        assert_eq!(r.state(), &two_tabs());
    }

    #[test]
    fn test_rename_cancelled() {
        let mut r = ready(two_tabs());
        assert!(r.resolve_rename(r.tab_id(0).unwrap(), "a", None).is_empty());
    }

    // =========================================================================
    // Late updates from replaced layouts
    // =========================================================================

    #[test]
    fn test_late_update_does_not_undo_rename() {
        let mut r = ready(two_tabs());
        r.resolve_rename(r.tab_id(1).unwrap(), "b", Some("Ideas".into()));

        let effects = r.handle(full(two_tabs().set_active_content("one!")), Instant::now());
        assert!(persists(&effects).is_empty());
        assert_eq!(r.state().tabs()[1].title, "Ideas");
        assert_eq!(r.state().tabs()[0].content, "one!");
        assert!(r.has_pending_persist());
    }

    #[test]
    fn test_late_update_does_not_resurrect_closed_tab() {
        let mut r = ready(two_tabs());
        let tab = request_close(&mut r, 0, "a");
        r.resolve_close(tab, "a", true);

        let effects = r.handle(full(two_tabs().set_active_content("one!")), Instant::now());
        assert!(persists(&effects).is_empty());
        assert_eq!(r.state().tabs(), &[Tab::new("b", "two")]);
        assert!(!r.has_pending_persist());
    }

    #[test]
    fn test_late_update_routes_content_to_moved_tab() {
        let three = TabState::new(
            vec![Tab::new("a", "1"), Tab::new("b", "2"), Tab::new("c", "3")],
            2,
        )
        .unwrap();
        let mut r = ready(three.clone());
        let tab = request_close(&mut r, 0, "a");
        r.resolve_close(tab, "a", true);

        r.handle(full(three.set_active_content("3!")), Instant::now());
        assert_eq!(contents(&r), ["2", "3!"]);
        assert_eq!(r.state().tabs()[1].title, "c");
    }

    #[test]
    fn test_late_update_after_switch_keeps_selection() {
        let mut r = ready(two_tabs());
        r.handle(ViewMessage::SwitchTab { index: 1 }, Instant::now());

        r.handle(full(two_tabs().set_active_content("one!")), Instant::now());
        assert_eq!(r.state().current_tab_index(), 1);
        assert_eq!(contents(&r), ["one!", "two"]);
        assert_eq!(r.view_text(), Some("two"));
    }

    #[test]
    fn test_caught_up_view_relayout_applies() {
        let mut r = ready(two_tabs());
        r.resolve_rename(r.tab_id(1).unwrap(), "b", Some("Ideas".into()));
        // The view reports the current layout, then relayouts on its own.
        r.handle(full(r.state().clone()), Instant::now());
        let effects = r.handle(full(two_tabs()), Instant::now());
        assert_eq!(persists(&effects), vec![&two_tabs()]);
        assert_eq!(r.state(), &two_tabs());
    }

    // =========================================================================
    // Idempotence and persistence bookkeeping
    // =========================================================================

    #[test]
    fn test_set_content_skipped_when_view_matches() {
        let state = TabState::new(vec![Tab::new("a", "same"), Tab::new("b", "same")], 0).unwrap();
        let mut r = ready(state);
        let effects = r.handle(ViewMessage::SwitchTab { index: 1 }, Instant::now());
        assert_eq!(sends(&effects), vec![&HostMessage::TabSwitched { index: 1 }]);
    }

    #[test]
    fn test_detach_flushes_pending_edit() {
        let mut r = ready(TabState::default());
        r.handle(text("unsaved"), Instant::now());
        let effects = r.detach_view();
        let written = persists(&effects);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].active_content(), "unsaved");
        assert!(!r.is_view_ready());
        assert_eq!(r.view_text(), None);
    }

    #[test]
    fn test_flush_without_changes_is_noop() {
        let mut r = ready(two_tabs());
        assert!(r.flush().is_empty());
    }

    #[test]
    fn test_failed_write_forces_next_persist() {
        let mut r = ready(two_tabs());
        r.handle(ViewMessage::SwitchTab { index: 1 }, Instant::now());
        assert!(r.flush().is_empty());

        let effects = r.persist_failed("disk full");
        assert!(warned(&effects));
        assert_eq!(persists(&r.flush()).len(), 1);
    }

    #[test]
    fn test_view_error_is_surfaced() {
        let mut r = ready(two_tabs());
        let effects = r.handle(ViewMessage::Error("editor crashed".into()), Instant::now());
        assert_eq!(effects, vec![Effect::Warn("editor crashed".into())]);
    }

    #[test]
    fn test_scenario_through_messages() {
        let mut r = ready(TabState::default());
        let now = Instant::now();
        r.handle(ViewMessage::AddTab, now);
        r.handle(ViewMessage::SwitchTab { index: 1 }, now);
        r.handle(text("abc"), now);
        let tab = request_close(&mut r, 0, "New Tab");
        let effects = r.resolve_close(tab, "New Tab", true);
        let expected = TabState::new(vec![Tab::new("New Tab", "abc")], 0).unwrap();
        assert_eq!(r.state(), &expected);
        assert_eq!(persists(&effects), vec![&expected]);
    }
}
