//! # tether-transport
//!
//! Connection layer for the Tether gateway client.
//!
//! Every transport hands back the same currency on connect: a
//! [`GatewayLink`] carrying inbound frames in arrival order, plus a
//! cloneable [`LinkHandle`] for sending and shutdown.
//!
//! - **websocket** - the real thing, built on tokio-tungstenite
//! - **memory** - a loopback link for tests and embedded harnesses
//!
//! ```rust,ignore
//! use tether_transport::{LinkConfig, WebSocketGateway};
//!
//! let mut link = WebSocketGateway::connect(url, &LinkConfig::default()).await?;
//! while let Some(frame) = link.next_frame().await {
//!     // Process frame
//! }
//! ```

pub mod link;
pub mod memory;
pub mod websocket;

pub use link::{GatewayLink, LinkConfig, LinkHandle, TransportError};
pub use memory::{MemoryRemote, RemoteEvent};
pub use websocket::WebSocketGateway;
