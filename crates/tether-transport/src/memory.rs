//! In-memory transport.
//!
//! A loopback [`GatewayLink`] with no socket behind it, for tests and
//! embedded harnesses that drive a session by hand. The remote end plays
//! the gateway: it pushes inbound frames and observes what the session
//! sends or when it closes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::link::{GatewayLink, LinkCommand, LinkConfig, LinkHandle};

/// What the session did, as seen from the gateway side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// The session sent a frame.
    Frame(String),
    /// The session closed the link.
    Closed,
}

/// The gateway side of an in-memory link.
pub struct MemoryRemote {
    inbound_tx: mpsc::Sender<String>,
    cmd_rx: mpsc::Receiver<LinkCommand>,
    open: Arc<AtomicBool>,
}

impl MemoryRemote {
    /// Deliver an inbound frame to the session.
    ///
    /// Returns `false` if the session has dropped its end of the link.
    pub async fn push(&self, text: impl Into<String>) -> bool {
        self.inbound_tx.send(text.into()).await.is_ok()
    }

    /// Observe the session's next outbound action.
    ///
    /// Returns `None` when every session-side handle is gone.
    pub async fn next_outbound(&mut self) -> Option<RemoteEvent> {
        match self.cmd_rx.recv().await {
            Some(LinkCommand::Send(text)) => Some(RemoteEvent::Frame(text)),
            Some(LinkCommand::Close) => {
                self.open.store(false, Ordering::SeqCst);
                Some(RemoteEvent::Closed)
            }
            None => None,
        }
    }

    /// Whether the session still considers the link open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Create a connected in-memory link.
#[must_use]
pub fn pair(config: &LinkConfig) -> (GatewayLink, MemoryRemote) {
    let (inbound_tx, frames) = mpsc::channel(config.inbound_buffer);
    let (cmd_tx, cmd_rx) = mpsc::channel(config.outbound_buffer);
    let open = Arc::new(AtomicBool::new(true));

    let link = GatewayLink::new(frames, LinkHandle::new(cmd_tx, Arc::clone(&open)));
    let remote = MemoryRemote {
        inbound_tx,
        cmd_rx,
        open,
    };

    (link, remote)
}
