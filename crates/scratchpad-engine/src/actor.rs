//! Panel actor: one task per panel owning the model, the view mirror and
//! the debounce timer.
//!
//! Callers hold a `Send+Sync` [`PanelHandle`]. Events go through an mpsc
//! channel and are applied strictly in order. Messages for the view come out
//! of the receiver returned by [`spawn_panel`].
//!
//! Writes go to a separate serial writer task so a slow store never stalls
//! the view, while still landing in the order they were issued. Dialog
//! results and write failures come back to the actor as follow-up events.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use scratchpad_store::TabStore;
use scratchpad_types::{HostMessage, TabState, ViewMessage};

use crate::config::EngineConfig;
use crate::dialogs::HostDialogs;
use crate::error::EngineError;
use crate::lifecycle::Lifecycle;
use crate::reconciler::{Effect, Reconciler, TabId};

// ============================================================================
// Events and commands
// ============================================================================

/// Everything the host can tell a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// A view was constructed.
    Created,
    /// The view became visible.
    Shown,
    /// The view was hidden; its contents may go stale.
    Hidden,
    /// The view was destroyed.
    Disposed,
    /// A message posted by the view.
    View(ViewMessage),
}

enum PanelCommand {
    Event(PanelEvent),
    Snapshot {
        reply: oneshot::Sender<TabState>,
    },
    Flush {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
}

/// Results of work the actor started earlier.
enum Followup {
    CloseDecided {
        tab: TabId,
        title: String,
        approved: bool,
    },
    RenameDecided {
        tab: TabId,
        current_title: String,
        new_title: Option<String>,
    },
    WriteFailed(String),
}

// ============================================================================
// PanelHandle (Send + Sync public API)
// ============================================================================

/// Cloneable handle to a running panel actor.
#[derive(Clone)]
pub struct PanelHandle {
    tx: mpsc::UnboundedSender<PanelCommand>,
}

impl PanelHandle {
    /// Queue an event. Does not wait for it to be applied.
    pub fn send(&self, event: PanelEvent) -> Result<(), EngineError> {
        self.tx
            .send(PanelCommand::Event(event))
            .map_err(|_| EngineError::Shutdown)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn created(&self) -> Result<(), EngineError> {
        self.send(PanelEvent::Created)
    }

    pub fn shown(&self) -> Result<(), EngineError> {
        self.send(PanelEvent::Shown)
    }

    pub fn hidden(&self) -> Result<(), EngineError> {
        self.send(PanelEvent::Hidden)
    }

    pub fn disposed(&self) -> Result<(), EngineError> {
        self.send(PanelEvent::Disposed)
    }

    // ── View ─────────────────────────────────────────────────────────────

    pub fn view(&self, msg: ViewMessage) -> Result<(), EngineError> {
        self.send(PanelEvent::View(msg))
    }

    // ── Queries and control ──────────────────────────────────────────────

    /// Current authoritative state, after every event queued before this call.
    pub async fn snapshot(&self) -> Result<TabState, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PanelCommand::Snapshot { reply })
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Write any pending edit and wait until every queued write has landed.
    pub async fn flush(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PanelCommand::Flush { reply })
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)?
    }

    /// Flush, then stop the actor.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PanelCommand::Shutdown { reply })
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)?
    }
}

// ============================================================================
// Writer
// ============================================================================

enum WriteJob {
    Save {
        state: TabState,
        ack: Option<oneshot::Sender<Result<(), String>>>,
    },
    /// Completes once every earlier job is done.
    Barrier(oneshot::Sender<()>),
}

async fn run_writer(
    store: TabStore,
    mut jobs: mpsc::UnboundedReceiver<WriteJob>,
    followups: mpsc::UnboundedSender<Followup>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            WriteJob::Save { state, ack } => {
                let store = store.clone();
                let result = tokio::task::spawn_blocking(move || store.save(&state))
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|r| r.map_err(|e| e.to_string()));
                match ack {
                    Some(ack) => {
                        let _ = ack.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            let _ = followups.send(Followup::WriteFailed(e));
                        }
                    }
                }
            }
            WriteJob::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    trace!("writer stopped");
}

// ============================================================================
// PanelActor (internal)
// ============================================================================

/// Whether persist effects are fire-and-forget or awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    No,
    ForWrites,
}

struct PanelActor {
    store: TabStore,
    config: EngineConfig,
    dialogs: Arc<dyn HostDialogs>,
    lifecycle: Lifecycle,
    /// Loaded on first use.
    model: Option<Reconciler>,
    outbound: mpsc::UnboundedSender<HostMessage>,
    writer: mpsc::UnboundedSender<WriteJob>,
    followups: mpsc::UnboundedSender<Followup>,
}

impl PanelActor {
    fn model(&mut self) -> &mut Reconciler {
        let store = &self.store;
        let debounce = self.config.debounce;
        self.model.get_or_insert_with(|| {
            let loaded = store.load_with_source();
            info!(
                key = store.key(),
                source = ?loaded.source,
                tabs = loaded.state.len(),
                "loaded tab state"
            );
            Reconciler::new(loaded.state, debounce)
        })
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PanelCommand>,
        mut followups: mpsc::UnboundedReceiver<Followup>,
    ) {
        loop {
            let deadline = self.model.as_ref().and_then(Reconciler::next_deadline);
            // Follow-ups first: a dialog result or write failure is always
            // applied before later commands observe the state.
            tokio::select! {
                biased;

                Some(followup) = followups.recv() => self.handle_followup(followup).await,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let effects = self.model().poll_debounce(Instant::now());
                    self.dispatch(effects).await;
                }
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        debug!("all panel handles dropped");
                        if let Err(e) = self.flush().await {
                            error!(error = %e, "final flush failed");
                        }
                        break;
                    }
                },
            }
        }
        debug!("panel actor stopped");
    }

    async fn handle_command(&mut self, cmd: PanelCommand) -> ControlFlow<()> {
        match cmd {
            PanelCommand::Event(event) => self.handle_event(event).await,
            PanelCommand::Snapshot { reply } => {
                let _ = reply.send(self.model().state().clone());
            }
            PanelCommand::Flush { reply } => {
                let _ = reply.send(self.flush().await);
            }
            PanelCommand::Shutdown { reply } => {
                info!("panel shutting down");
                let _ = reply.send(self.flush().await);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Created => {
                self.lifecycle.created();
                self.model().attach_view();
            }
            PanelEvent::Shown => {
                if self.lifecycle.shown() {
                    self.model().attach_view();
                }
            }
            PanelEvent::Hidden => {
                if self.lifecycle.hidden() {
                    self.release_view().await;
                }
            }
            PanelEvent::Disposed => {
                if self.lifecycle.disposed() {
                    self.release_view().await;
                }
            }
            PanelEvent::View(ViewMessage::Ready) => {
                if self.lifecycle.ready() {
                    let effects = self.model().view_ready();
                    self.dispatch(effects).await;
                }
            }
            PanelEvent::View(msg) => {
                let effects = self.model().handle(msg, Instant::now());
                self.dispatch(effects).await;
            }
        }
    }

    async fn handle_followup(&mut self, followup: Followup) {
        let effects = match followup {
            Followup::CloseDecided {
                tab,
                title,
                approved,
            } => self.model().resolve_close(tab, &title, approved),
            Followup::RenameDecided {
                tab,
                current_title,
                new_title,
            } => self.model().resolve_rename(tab, &current_title, new_title),
            Followup::WriteFailed(e) => self.model().persist_failed(&e),
        };
        self.dispatch(effects).await;
    }

    async fn release_view(&mut self) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let effects = model.detach_view();
        if let Err(e) = self.apply(effects, Wait::ForWrites).await {
            warn!(error = %e, "write on view release failed");
        }
    }

    /// Persist pending edits and drain the writer.
    async fn flush(&mut self) -> Result<(), EngineError> {
        let effects = match self.model.as_mut() {
            Some(model) => model.flush(),
            None => Vec::new(),
        };
        self.apply(effects, Wait::ForWrites).await?;

        let (done, rx) = oneshot::channel();
        self.writer
            .send(WriteJob::Barrier(done))
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Apply effects without waiting for writes.
    async fn dispatch(&mut self, effects: Vec<Effect>) {
        if let Err(e) = self.apply(effects, Wait::No).await {
            error!(error = %e, "failed to apply panel effects");
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>, wait: Wait) -> Result<(), EngineError> {
        let mut result = Ok(());
        for effect in effects {
            match effect {
                Effect::Send(msg) => {
                    trace!(kind = msg.kind(), "to view");
                    if self.outbound.send(msg).is_err() {
                        debug!("view receiver dropped");
                    }
                }
                Effect::Persist { state, reason } => {
                    debug!(?reason, tabs = state.len(), "queueing write");
                    if let Err(e) = self.persist(state, wait).await {
                        result = Err(e);
                    }
                }
                Effect::Warn(message) => self.dialogs.warn(&message),
                Effect::ConfirmClose { tab, title } => {
                    let dialogs = Arc::clone(&self.dialogs);
                    let followups = self.followups.clone();
                    tokio::spawn(async move {
                        let approved = dialogs.confirm_close(&title).await;
                        let _ = followups.send(Followup::CloseDecided {
                            tab,
                            title,
                            approved,
                        });
                    });
                }
                Effect::PromptTitle {
                    tab,
                    current_title,
                } => {
                    let dialogs = Arc::clone(&self.dialogs);
                    let followups = self.followups.clone();
                    tokio::spawn(async move {
                        let new_title = dialogs.prompt_title(&current_title).await;
                        let _ = followups.send(Followup::RenameDecided {
                            tab,
                            current_title,
                            new_title,
                        });
                    });
                }
            }
        }
        result
    }

    async fn persist(&mut self, state: TabState, wait: Wait) -> Result<(), EngineError> {
        if wait == Wait::No {
            return self
                .writer
                .send(WriteJob::Save { state, ack: None })
                .map_err(|_| EngineError::Shutdown);
        }

        let (ack, rx) = oneshot::channel();
        self.writer
            .send(WriteJob::Save {
                state,
                ack: Some(ack),
            })
            .map_err(|_| EngineError::Shutdown)?;
        match rx.await.map_err(|_| EngineError::Shutdown)? {
            Ok(()) => Ok(()),
            Err(e) => {
                for effect in self.model().persist_failed(&e) {
                    if let Effect::Warn(message) = effect {
                        self.dialogs.warn(&message);
                    }
                }
                Err(EngineError::Persistence(e))
            }
        }
    }
}

// ============================================================================
// Public spawn function
// ============================================================================

/// Spawn a panel actor and its writer on the current runtime.
///
/// The state is loaded from `store` the first time it is needed. Returns the
/// handle and the stream of messages destined for the view.
pub fn spawn_panel(
    store: TabStore,
    dialogs: Arc<dyn HostDialogs>,
    config: EngineConfig,
) -> (PanelHandle, mpsc::UnboundedReceiver<HostMessage>) {
    let (tx, commands) = mpsc::unbounded_channel();
    let (outbound, view_rx) = mpsc::unbounded_channel();
    let (writer, jobs) = mpsc::unbounded_channel();
    let (followups_tx, followups_rx) = mpsc::unbounded_channel();

    tokio::spawn(run_writer(store.clone(), jobs, followups_tx.clone()));

    let actor = PanelActor {
        store,
        config,
        dialogs,
        lifecycle: Lifecycle::new(),
        model: None,
        outbound,
        writer,
        followups: followups_tx,
    };
    tokio::spawn(actor.run(commands, followups_rx));

    (PanelHandle { tx }, view_rx)
}

// ============================================================================
// Tests
// ============================================================================
