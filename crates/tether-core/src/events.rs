//! Domain events surfaced to session listeners.

use std::sync::Arc;

use thiserror::Error;

use tether_protocol::{MessagePayload, MessageSubtype, RawFrame};

use crate::entity::User;

/// An error reported by the gateway.
///
/// Raised either when the handshake is rejected or when an `error` frame
/// arrives on an established session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The frame carried a decodable `error` object.
    #[error("Gateway error {code}: {msg}")]
    ErrorFrame { code: i64, msg: String },

    /// The frame carried no usable error details.
    #[error("Gateway reported an error without details")]
    Unspecified,
}

impl GatewayError {
    /// Build an error from a frame, falling back to [`GatewayError::Unspecified`]
    /// when the frame has no well-formed `error` object.
    #[must_use]
    pub fn from_frame(frame: &RawFrame) -> Self {
        match frame.error() {
            Some(err) => GatewayError::ErrorFrame {
                code: err.code,
                msg: err.msg,
            },
            None => GatewayError::Unspecified,
        }
    }
}

/// A decoded domain event.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SessionEvent {
    /// A message was posted, edited, or otherwise changed.
    Message(MessageEvent),
}

/// A message event with its acting user resolved through the directory.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// The resolved acting user: the editor for edit subtypes, the author
    /// otherwise. `None` when the id is absent or unknown to the directory
    /// (bots, deleted users).
    pub user: Option<Arc<User>>,
    /// The raw message payload.
    pub message: MessagePayload,
    /// Subtype tag, duplicated out of the payload for convenience.
    pub subtype: Option<MessageSubtype>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_error_from_frame() {
        let frame = RawFrame {
            kind: "error".into(),
            data: json!({"type": "error", "error": {"code": 2, "msg": "invalid auth"}}),
        };
        assert_eq!(
            GatewayError::from_frame(&frame),
            GatewayError::ErrorFrame {
                code: 2,
                msg: "invalid auth".into()
            }
        );
    }

    #[test]
    fn test_gateway_error_fallback() {
        let frame = RawFrame {
            kind: "goodbye".into(),
            data: json!({"type": "goodbye"}),
        };
        assert_eq!(GatewayError::from_frame(&frame), GatewayError::Unspecified);
    }
}
