//! # tether-client
//!
//! Realtime session client for the Tether messaging gateway.
//!
//! A [`RealTimeSession`] is built from a bootstrap snapshot: it loads the
//! entity directory, connects to the gateway's WebSocket endpoint, performs
//! the first-frame handshake, and fans decoded events out to registered
//! listeners.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_client::{RealTimeSession, SessionConfig};
//!
//! let session = RealTimeSession::connect(&bootstrap, &SessionConfig::default()).await?;
//! session.add_listener(Arc::new(MyListener));
//! ```

pub mod config;
pub mod metrics;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use session::{RealTimeSession, SessionError, SessionState};

// The listener surface and event types observers work with.
pub use tether_core::{
    Channel, GatewayError, Group, ListenerId, MessageEvent, RealTimeListener, SessionEvent, User,
};
