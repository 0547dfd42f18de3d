//! The link between a session and its transport.
//!
//! A [`GatewayLink`] is what every transport hands back on connect: an
//! inbound frame stream consumed by exactly one reader, plus a cloneable
//! [`LinkHandle`] for sending and shutdown that is safe to use from any
//! task while the reader is running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use tether_protocol::{codec, OutboundFrame, RawFrame};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The gateway URL could not be parsed.
    #[error("Invalid gateway url: {0}")]
    InvalidUrl(String),

    /// The transport could not be established.
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// The connection is no longer open.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failed to send a frame.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to encode an outbound frame.
    #[error("Protocol error: {0}")]
    Protocol(#[from] tether_protocol::ProtocolError),
}

/// Link tuning knobs.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Maximum accepted inbound frame size in bytes.
    pub max_message_size: usize,
    /// Capacity of the inbound frame buffer.
    pub inbound_buffer: usize,
    /// Capacity of the outbound command buffer.
    pub outbound_buffer: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024, // 64 KB
            inbound_buffer: 256,
            outbound_buffer: 32,
        }
    }
}

/// Commands sent from a [`LinkHandle`] to the transport's I/O task.
#[derive(Debug)]
pub(crate) enum LinkCommand {
    Send(String),
    Close,
}

/// An established gateway connection.
///
/// Inbound frames arrive strictly in the order the transport received them.
/// Malformed frames are logged and skipped here so the session only ever
/// sees well-formed envelopes.
pub struct GatewayLink {
    frames: mpsc::Receiver<String>,
    handle: LinkHandle,
}

impl GatewayLink {
    pub(crate) fn new(frames: mpsc::Receiver<String>, handle: LinkHandle) -> Self {
        Self { frames, handle }
    }

    /// Receive the next well-formed inbound frame.
    ///
    /// Returns `None` once the transport has shut down and the buffer is
    /// drained.
    pub async fn next_frame(&mut self) -> Option<RawFrame> {
        loop {
            let text = self.frames.recv().await?;
            match codec::decode_frame(&text) {
                Ok(frame) => return Some(frame),
                Err(error) => warn!(%error, "Dropping malformed inbound frame"),
            }
        }
    }

    /// A handle for sending and lifecycle control.
    #[must_use]
    pub fn handle(&self) -> LinkHandle {
        self.handle.clone()
    }
}

/// Cloneable sending/lifecycle handle for a [`GatewayLink`].
#[derive(Clone)]
pub struct LinkHandle {
    cmd_tx: mpsc::Sender<LinkCommand>,
    open: Arc<AtomicBool>,
}

impl LinkHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<LinkCommand>, open: Arc<AtomicBool>) -> Self {
        Self { cmd_tx, open }
    }

    /// Send an outbound protocol frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be encoded or the connection is
    /// closed.
    pub async fn send_frame(&self, frame: &OutboundFrame) -> Result<(), TransportError> {
        let text = codec::encode_frame(frame)?;
        self.send_text(text).await
    }

    /// Send raw frame text.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed.
    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed);
        }
        self.cmd_tx
            .send(LinkCommand::Send(text))
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Close the connection.
    ///
    /// Unconditional and immediate: the link reports closed as soon as this
    /// is called. The underlying transport shutdown is best-effort and any
    /// failure during it is swallowed; calling close on an already-closed
    /// link is a no-op.
    pub async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self.cmd_tx.send(LinkCommand::Close).await;
    }

    /// Whether the transport still reports itself running.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_config_default() {
        let config = LinkConfig::default();
        assert_eq!(config.max_message_size, 64 * 1024);
        assert!(config.inbound_buffer > 0);
        assert!(config.outbound_buffer > 0);
    }

    #[tokio::test]
    async fn test_send_on_closed_link_fails() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        let handle = LinkHandle::new(cmd_tx, Arc::new(AtomicBool::new(true)));

        handle.close().await;
        assert!(!handle.is_open());
        assert!(matches!(
            handle.send_text("{}".into()).await,
            Err(TransportError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_next_frame_skips_malformed_text() {
        let (tx, rx) = mpsc::channel(4);
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        let mut link =
            GatewayLink::new(rx, LinkHandle::new(cmd_tx, Arc::new(AtomicBool::new(true))));

        tx.send("{broken".into()).await.unwrap();
        tx.send(r#"{"type": "hello"}"#.into()).await.unwrap();
        drop(tx);

        let frame = link.next_frame().await.unwrap();
        assert_eq!(frame.kind, "hello");
        assert!(link.next_frame().await.is_none());
    }
}
