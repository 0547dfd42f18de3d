//! Inbound frame decoding.
//!
//! The decoder turns post-handshake frames into domain events, resolving
//! actor references through the entity directory. It never fails: frames it
//! cannot use are logged and dropped.

use std::sync::Arc;

use tracing::{trace, warn};

use tether_protocol::{EventKind, MessagePayload, RawFrame};

use crate::directory::EntityDirectory;
use crate::events::{GatewayError, MessageEvent, SessionEvent};

/// Outcome of decoding one post-handshake frame.
#[derive(Debug, Clone)]
pub enum Decoded {
    /// A domain event to fan out to listeners.
    Event(SessionEvent),
    /// A gateway error report to fan out to listeners.
    Error(GatewayError),
}

/// Maps raw frames to typed domain events.
pub struct EventDecoder {
    directory: Arc<EntityDirectory>,
}

impl EventDecoder {
    /// Create a decoder resolving entities against the given directory.
    #[must_use]
    pub fn new(directory: Arc<EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Decode a frame received after the handshake completed.
    ///
    /// Returns `None` for frames that produce nothing to fan out: recognized
    /// notification types the core does not materialize yet, unrecognized
    /// types, and message payloads that fail to parse.
    #[must_use]
    pub fn decode(&self, frame: &RawFrame) -> Option<Decoded> {
        match frame.event_kind() {
            Some(EventKind::Message) => self.decode_message(frame).map(Decoded::Event),
            Some(EventKind::Error) => Some(Decoded::Error(GatewayError::from_frame(frame))),
            Some(kind) => {
                // Recognized but carries no materialized payload; the
                // directory is left untouched.
                trace!(kind = kind.as_str(), "Recognized event without payload");
                None
            }
            None => {
                trace!(kind = %frame.kind, "Ignoring unrecognized frame type");
                None
            }
        }
    }

    fn decode_message(&self, frame: &RawFrame) -> Option<SessionEvent> {
        let payload: MessagePayload = match serde_json::from_value(frame.data.clone()) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "Dropping undecodable message frame");
                return None;
            }
        };

        // Unknown authors are expected (bots, departed users); the event is
        // still surfaced, just without a user reference.
        let user = payload
            .acting_user_id()
            .and_then(|id| self.directory.user_by_id(id));

        Some(SessionEvent::Message(MessageEvent {
            user,
            subtype: payload.subtype,
            message: payload,
        }))
    }
}
