//! JSON-lines transport between a panel view and the panel actor.
//!
//! Every inbound line is one JSON object: either a view message
//! (`{"type":"update","value":"..."}`) or a lifecycle notice from the host
//! shell (`{"type":"panelShown"}`). Every outbound line is one engine→view
//! message.

use std::future::Future;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use scratchpad_engine::{EngineError, PanelEvent, PanelHandle};
use scratchpad_types::{HostMessage, ViewMessage};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum LifecycleLine {
    PanelCreated,
    PanelShown,
    PanelHidden,
    PanelDisposed,
}

impl From<LifecycleLine> for PanelEvent {
    fn from(line: LifecycleLine) -> Self {
        match line {
            LifecycleLine::PanelCreated => PanelEvent::Created,
            LifecycleLine::PanelShown => PanelEvent::Shown,
            LifecycleLine::PanelHidden => PanelEvent::Hidden,
            LifecycleLine::PanelDisposed => PanelEvent::Disposed,
        }
    }
}

/// Decode one inbound line.
pub fn parse_line(line: &str) -> Result<PanelEvent, serde_json::Error> {
    if let Ok(lifecycle) = serde_json::from_str::<LifecycleLine>(line) {
        return Ok(lifecycle.into());
    }
    serde_json::from_str::<ViewMessage>(line).map(PanelEvent::View)
}

async fn write_message<W: AsyncWrite + Unpin>(
    output: &mut W,
    msg: &HostMessage,
) -> Result<(), BridgeError> {
    let mut line = serde_json::to_vec(msg)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}

/// Pump lines until EOF, the view channel closes, or `shutdown` resolves.
/// The panel is flushed and stopped before returning.
pub async fn run_bridge<R, W, S>(
    input: R,
    mut output: W,
    handle: PanelHandle,
    mut view: UnboundedReceiver<HostMessage>,
    shutdown: S,
) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_line(&line) {
                    Ok(event) => handle.send(event)?,
                    Err(e) => warn!(error = %e, "ignoring malformed inbound line"),
                },
                None => {
                    debug!("input closed");
                    break;
                }
            },
            msg = view.recv() => match msg {
                Some(msg) => write_message(&mut output, &msg).await?,
                None => break,
            },
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await?;
    while let Some(msg) = view.recv().await {
        write_message(&mut output, &msg).await?;
    }
    Ok(())
}
