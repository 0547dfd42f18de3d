//! # tether-core
//!
//! Entity directory, listener fan-out, and event decoding for the Tether
//! gateway client.
//!
//! This crate provides the session's domain layer:
//!
//! - **EntityDirectory** - users, channels, and groups by id and name
//! - **ListenerRegistry** - concurrent observer registration and dispatch
//! - **EventDecoder** - raw frames to typed domain events
//! - **SessionEvent** / **GatewayError** - what observers receive
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │  RawFrame   │────▶│ EventDecoder │────▶│ ListenerRegistry │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//!                            │
//!                            ▼
//!                    ┌─────────────────┐
//!                    │ EntityDirectory │
//!                    └─────────────────┘
//! ```

pub mod decoder;
pub mod directory;
pub mod entity;
pub mod events;
pub mod listener;

pub use decoder::{Decoded, EventDecoder};
pub use directory::{DirectoryError, EntityDirectory};
pub use entity::{BootstrapPayload, Channel, Group, SelfInfo, User};
pub use events::{GatewayError, MessageEvent, SessionEvent};
pub use listener::{ListenerId, ListenerRegistry, RealTimeListener};
