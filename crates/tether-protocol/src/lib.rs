//! # tether-protocol
//!
//! Wire protocol definitions for the Tether realtime gateway client.
//!
//! This crate defines the JSON frame envelope exchanged with the gateway,
//! the closed set of recognized event types, message payload records, and
//! the entity-id classifier.
//!
//! ## Frame shape
//!
//! Every inbound frame is a JSON object with a `type` field:
//!
//! - `hello` - handshake success, first frame on a healthy connection
//! - `error` - gateway error report, `{error: {code, msg}}`
//! - `message` and the workspace-mutation notifications - domain events
//!
//! ## Example
//!
//! ```rust
//! use tether_protocol::{codec, EventKind};
//!
//! let frame = codec::decode_frame(r#"{"type": "hello"}"#).unwrap();
//! assert_eq!(frame.event_kind(), Some(EventKind::Hello));
//! ```

pub mod codec;
pub mod entity_id;
pub mod frames;

pub use codec::{decode_frame, encode_frame, ProtocolError, MAX_FRAME_SIZE};
pub use entity_id::{classify, EntityKind, ParsedId};
pub use frames::{
    Edited, EventKind, MessagePayload, MessageSubtype, OutboundFrame, RawFrame, RtError,
};
