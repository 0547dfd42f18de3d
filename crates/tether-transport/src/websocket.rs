//! WebSocket transport implementation.
//!
//! This module provides the client-side WebSocket transport using
//! tokio-tungstenite. The socket is owned by a dedicated I/O task; the
//! caller interacts with it only through the returned [`GatewayLink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, trace, warn};

use crate::link::{GatewayLink, LinkCommand, LinkConfig, LinkHandle, TransportError};

/// Client-side WebSocket transport.
pub struct WebSocketGateway;

impl WebSocketGateway {
    /// Establish a connection to the gateway endpoint.
    ///
    /// The URL comes verbatim from the bootstrap payload. Establishment
    /// failures surface here, synchronously; once this returns the socket
    /// is running and feeding the link.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is structurally invalid or the socket
    /// cannot be established.
    pub async fn connect(url: &str, config: &LinkConfig) -> Result<GatewayLink, TransportError> {
        let (socket, _response) = connect_async(url).await.map_err(|e| match e {
            WsError::Url(err) => TransportError::InvalidUrl(err.to_string()),
            WsError::HttpFormat(err) => TransportError::InvalidUrl(err.to_string()),
            other => TransportError::ConnectFailed(other.to_string()),
        })?;

        debug!("Gateway socket connected");

        let (frame_tx, frames) = mpsc::channel(config.inbound_buffer);
        let (cmd_tx, cmd_rx) = mpsc::channel(config.outbound_buffer);
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(io_task(
            socket,
            frame_tx,
            cmd_rx,
            Arc::clone(&open),
            config.max_message_size,
        ));

        Ok(GatewayLink::new(frames, LinkHandle::new(cmd_tx, open)))
    }
}

/// Socket I/O loop.
///
/// Text frames are forwarded in arrival order; pings are answered in place;
/// binary frames are ignored (the gateway speaks text). Socket-level close
/// and error conditions only end this task and flip the open flag, they do
/// not reach the session as frames.
async fn io_task(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    frame_tx: mpsc::Sender<String>,
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
    open: Arc<AtomicBool>,
    max_message_size: usize,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(LinkCommand::Send(text)) => {
                    if let Err(error) = sink.send(Message::Text(text)).await {
                        warn!(%error, "Gateway send failed");
                        break;
                    }
                }
                Some(LinkCommand::Close) | None => {
                    // Best-effort goodbye; the link already reports closed.
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },

            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if text.len() > max_message_size {
                        warn!(
                            size = text.len(),
                            max = max_message_size,
                            "Dropping oversized inbound frame"
                        );
                        continue;
                    }
                    if frame_tx.send(text).await.is_err() {
                        // Session dropped its end of the link.
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Pong(_))) => {
                    // Ignore pongs
                }
                Some(Ok(Message::Binary(_))) => {
                    trace!("Ignoring binary frame");
                }
                Some(Ok(Message::Frame(_))) => {
                    // Raw frame, ignore
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("Gateway closed the connection");
                    break;
                }
                Some(Err(error)) => {
                    warn!(%error, "Gateway socket error");
                    break;
                }
                None => {
                    debug!("Gateway socket stream ended");
                    break;
                }
            }
        }
    }

    open.store(false, Ordering::SeqCst);
    debug!("Gateway socket task finished");
}
