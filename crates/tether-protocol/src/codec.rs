//! Codec for gateway frames.
//!
//! The gateway uses JSON text frames with a `type` discriminator; there is
//! no length prefix, one WebSocket text message carries exactly one frame.

use thiserror::Error;

use crate::frames::{OutboundFrame, RawFrame};

/// Maximum accepted frame size (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// Frame is not a JSON object.
    #[error("Frame is not a JSON object")]
    NotAnObject,

    /// Frame object has no string `type` field.
    #[error("Frame is missing a string `type` field")]
    MissingType,

    /// JSON syntax or structure error.
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one inbound text frame into a [`RawFrame`].
///
/// # Errors
///
/// Returns an error if the text is oversized, not a JSON object, or has no
/// string `type` field.
pub fn decode_frame(text: &str) -> Result<RawFrame, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }

    let data: serde_json::Value = serde_json::from_str(text)?;
    let kind = data
        .as_object()
        .ok_or(ProtocolError::NotAnObject)?
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    Ok(RawFrame { kind, data })
}

/// Encode an outbound frame to its wire text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(frame)?)
}
