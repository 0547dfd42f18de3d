//! The realtime session façade.
//!
//! A session is built from a bootstrap snapshot: the entity directory loads
//! synchronously from it, then the connection is started against the
//! snapshot's transport URL. Inbound frames are processed strictly in
//! arrival order by a single pump task; everything else on the session can
//! be called concurrently from any task.
//!
//! There is no reconnection and no handshake timeout: a session that loses
//! its connection or is rejected at handshake must be rebuilt, and a
//! gateway that never sends its first frame leaves the session pending.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use tether_core::{
    BootstrapPayload, Channel, Decoded, DirectoryError, EntityDirectory, EventDecoder,
    GatewayError, Group, ListenerId, ListenerRegistry, RealTimeListener, User,
};
use tether_protocol::{EventKind, OutboundFrame};
use tether_transport::{GatewayLink, TransportError, WebSocketGateway};

use crate::config::SessionConfig;
use crate::metrics;

/// Session construction and I/O errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The bootstrap payload is malformed or incomplete.
    #[error("Malformed bootstrap payload: {0}")]
    Bootstrap(#[from] serde_json::Error),

    /// A snapshot entity record could not be decoded.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for the gateway's first frame.
    AwaitingHandshake,
    /// Handshake confirmed; frames decode to domain events.
    Operational,
    /// Handshake rejected; terminal.
    Failed,
}

const STATE_AWAITING: u8 = 0;
const STATE_OPERATIONAL: u8 = 1;
const STATE_FAILED: u8 = 2;

impl SessionState {
    fn from_repr(repr: u8) -> Self {
        match repr {
            STATE_OPERATIONAL => SessionState::Operational,
            STATE_FAILED => SessionState::Failed,
            _ => SessionState::AwaitingHandshake,
        }
    }

    fn repr(self) -> u8 {
        match self {
            SessionState::AwaitingHandshake => STATE_AWAITING,
            SessionState::Operational => STATE_OPERATIONAL,
            SessionState::Failed => STATE_FAILED,
        }
    }
}

/// State shared between the session handle and its pump task.
struct Shared {
    directory: Arc<EntityDirectory>,
    listeners: ListenerRegistry,
    state: AtomicU8,
    handle: tether_transport::LinkHandle,
    next_message_id: AtomicU64,
}

impl Shared {
    fn state(&self) -> SessionState {
        SessionState::from_repr(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state.repr(), Ordering::SeqCst);
    }
}

/// A live connection to the messaging gateway.
///
/// Composes the entity directory, the listener registry, the event decoder,
/// and the transport link behind one handle.
pub struct RealTimeSession {
    shared: Arc<Shared>,
}

impl RealTimeSession {
    /// Build a session from a bootstrap snapshot and connect to the
    /// transport URL it names.
    ///
    /// The directory is fully loaded before the connection is attempted, so
    /// no frame is ever decoded against a partial directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed or the transport
    /// cannot be established.
    pub async fn connect(
        bootstrap: &Value,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let (payload, directory) = Self::boot(bootstrap)?;
        let link = WebSocketGateway::connect(&payload.url, &config.link_config()).await?;
        Ok(Self::start(directory, link))
    }

    /// Build a session over an already-established link.
    ///
    /// This is how alternative transports (including the in-memory link)
    /// are wired in; the snapshot's `url` field is not used.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed.
    pub fn attach(bootstrap: &Value, link: GatewayLink) -> Result<Self, SessionError> {
        let (_payload, directory) = Self::boot(bootstrap)?;
        Ok(Self::start(directory, link))
    }

    fn boot(bootstrap: &Value) -> Result<(BootstrapPayload, Arc<EntityDirectory>), SessionError> {
        let payload: BootstrapPayload = serde_json::from_value(bootstrap.clone())?;
        let directory = Arc::new(EntityDirectory::new());
        directory.load(&payload)?;
        Ok((payload, directory))
    }

    fn start(directory: Arc<EntityDirectory>, link: GatewayLink) -> Self {
        let shared = Arc::new(Shared {
            directory,
            listeners: ListenerRegistry::new(),
            state: AtomicU8::new(STATE_AWAITING),
            handle: link.handle(),
            next_message_id: AtomicU64::new(1),
        });

        tokio::spawn(pump(link, Arc::clone(&shared)));

        Self { shared }
    }

    /// Register a session observer.
    pub fn add_listener(&self, listener: Arc<dyn RealTimeListener>) -> ListenerId {
        self.shared.listeners.add(listener)
    }

    /// Deregister a session observer. Removing an absent listener is a no-op.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Whether the transport still reports itself running.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.handle.is_open()
    }

    /// Close the connection. Best-effort and idempotent.
    pub async fn close(&self) {
        self.shared.handle.close().await;
    }

    /// Send a keepalive ping and return its sequence id.
    ///
    /// Ids start at 1 on a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed.
    pub async fn send_ping(&self) -> Result<u64, SessionError> {
        let id = self.shared.next_message_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .handle
            .send_frame(&OutboundFrame::ping(id))
            .await?;
        metrics::record_ping();
        Ok(id)
    }

    /// The user this session is connected as.
    #[must_use]
    pub fn self_user(&self) -> Option<Arc<User>> {
        self.shared.directory.self_user()
    }

    /// Look up a user by display name, case-insensitively.
    #[must_use]
    pub fn user(&self, name: &str) -> Option<Arc<User>> {
        self.shared.directory.user(name)
    }

    /// Look up a user by id.
    #[must_use]
    pub fn user_by_id(&self, id: &str) -> Option<Arc<User>> {
        self.shared.directory.user_by_id(id)
    }

    /// Snapshot of all known users.
    #[must_use]
    pub fn users(&self) -> Vec<Arc<User>> {
        self.shared.directory.users()
    }

    /// Look up a channel by display name, case-insensitively.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.shared.directory.channel(name)
    }

    /// Look up a channel by id.
    #[must_use]
    pub fn channel_by_id(&self, id: &str) -> Option<Arc<Channel>> {
        self.shared.directory.channel_by_id(id)
    }

    /// Snapshot of all known channels.
    #[must_use]
    pub fn channels(&self) -> Vec<Arc<Channel>> {
        self.shared.directory.channels()
    }

    /// Look up a group by display name, case-insensitively.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<Arc<Group>> {
        self.shared.directory.group(name)
    }

    /// Look up a group by id.
    #[must_use]
    pub fn group_by_id(&self, id: &str) -> Option<Arc<Group>> {
        self.shared.directory.group_by_id(id)
    }

    /// Snapshot of all known groups.
    #[must_use]
    pub fn groups(&self) -> Vec<Arc<Group>> {
        self.shared.directory.groups()
    }
}

/// Frame pump: the single consumer of the inbound stream.
///
/// The first frame settles the handshake; everything after it goes through
/// the decoder. Listener callbacks run on this task, so a slow listener
/// backpressures frame processing but can never reorder it.
async fn pump(mut link: GatewayLink, shared: Arc<Shared>) {
    let decoder = EventDecoder::new(Arc::clone(&shared.directory));

    while let Some(frame) = link.next_frame().await {
        metrics::record_frame();

        match shared.state() {
            SessionState::AwaitingHandshake => {
                if frame.event_kind() == Some(EventKind::Hello) {
                    shared.set_state(SessionState::Operational);
                    debug!("Handshake complete");
                    shared.listeners.dispatch_login();
                } else {
                    let error = GatewayError::from_frame(&frame);
                    warn!(%error, kind = %frame.kind, "Handshake rejected");
                    shared.set_state(SessionState::Failed);
                    metrics::record_error("handshake");
                    shared.listeners.dispatch_error(&error);
                    shared.handle.close().await;
                    return;
                }
            }

            SessionState::Operational => match decoder.decode(&frame) {
                Some(Decoded::Event(event)) => {
                    metrics::record_event();
                    shared.listeners.dispatch_event(&event);
                }
                Some(Decoded::Error(error)) => {
                    metrics::record_error("gateway");
                    shared.listeners.dispatch_error(&error);
                }
                None => {}
            },

            SessionState::Failed => return,
        }
    }

    debug!("Frame stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;
    use tether_core::SessionEvent;
    use tether_transport::{memory, LinkConfig, RemoteEvent};

    fn bootstrap() -> Value {
        json!({
            "url": "wss://gateway.example/socket",
            "self": {"id": "U2"},
            "users": [
                {"id": "U1", "name": "Alice"},
                {"id": "U2", "name": "bob"},
            ],
            "channels": [
                {"id": "C1", "name": "General", "is_member": true},
            ],
            "groups": [
                {"id": "G1", "name": "ops"},
            ],
        })
    }

    fn session() -> (RealTimeSession, memory::MemoryRemote) {
        let (link, remote) = memory::pair(&LinkConfig::default());
        let session = RealTimeSession::attach(&bootstrap(), link).unwrap();
        (session, remote)
    }

    #[derive(Default)]
    struct Recording {
        logins: AtomicUsize,
        errors: Mutex<Vec<GatewayError>>,
        events: Mutex<Vec<SessionEvent>>,
    }

    impl Recording {
        fn login_count(&self) -> usize {
            self.logins.load(Ordering::SeqCst)
        }

        fn error_count(&self) -> usize {
            self.errors.lock().unwrap().len()
        }

        fn event_count(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    impl RealTimeListener for Recording {
        fn on_login_complete(&self) {
            self.logins.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, error: &GatewayError) {
            self.errors.lock().unwrap().push(error.clone());
        }

        fn on_event(&self, event: &SessionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("Condition not reached in time");
    }

    #[tokio::test]
    async fn test_bootstrap_queries() {
        let (session, _remote) = session();

        assert_eq!(session.state(), SessionState::AwaitingHandshake);
        assert!(session.is_open());

        assert_eq!(session.self_user().unwrap().id, "U2");
        assert_eq!(session.user("alice").unwrap().id, "U1");
        assert_eq!(session.user("ALICE").unwrap().id, "U1");
        assert_eq!(session.user_by_id("U1").unwrap().name, "Alice");
        assert_eq!(session.channel("general").unwrap().id, "C1");
        assert_eq!(session.channel_by_id("C1").unwrap().name, "General");
        assert_eq!(session.group("OPS").unwrap().id, "G1");
        assert_eq!(session.group_by_id("G1").unwrap().name, "ops");
        assert_eq!(session.users().len(), 2);
        assert_eq!(session.channels().len(), 1);
        assert_eq!(session.groups().len(), 1);
        assert!(session.user("nobody").is_none());
    }

    #[tokio::test]
    async fn test_malformed_bootstrap_fails_construction() {
        let (link, _remote) = memory::pair(&LinkConfig::default());
        let missing_self = json!({
            "url": "wss://gateway.example/socket",
            "users": [], "channels": [], "groups": []
        });
        assert!(matches!(
            RealTimeSession::attach(&missing_self, link),
            Err(SessionError::Bootstrap(_))
        ));

        let (link, _remote) = memory::pair(&LinkConfig::default());
        let bad_record = json!({
            "url": "wss://gateway.example/socket",
            "self": {"id": "U1"},
            "users": [{"id": "U1"}],
            "channels": [], "groups": []
        });
        assert!(matches!(
            RealTimeSession::attach(&bad_record, link),
            Err(SessionError::Directory(_))
        ));
    }

    #[tokio::test]
    async fn test_hello_completes_handshake() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        wait_until(|| listener.login_count() == 1).await;

        assert_eq!(session.state(), SessionState::Operational);
        assert!(session.is_open());
        assert_eq!(listener.error_count(), 0);
    }

    #[tokio::test]
    async fn test_handshake_rejection_with_error_frame() {
        let (session, mut remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote
            .push(r#"{"type": "error", "error": {"code": 1, "msg": "not authed"}}"#)
            .await;

        wait_until(|| listener.error_count() == 1).await;
        assert_eq!(
            listener.errors.lock().unwrap()[0],
            GatewayError::ErrorFrame {
                code: 1,
                msg: "not authed".into()
            }
        );

        wait_until(|| !session.is_open()).await;
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(listener.login_count(), 0);
        assert_eq!(listener.event_count(), 0);
        assert_eq!(remote.next_outbound().await, Some(RemoteEvent::Closed));
    }

    #[tokio::test]
    async fn test_handshake_rejection_without_details() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "goodbye"}"#).await;

        wait_until(|| listener.error_count() == 1).await;
        assert_eq!(
            listener.errors.lock().unwrap()[0],
            GatewayError::Unspecified
        );
        wait_until(|| !session.is_open()).await;
    }

    #[tokio::test]
    async fn test_message_event_resolves_author() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        remote
            .push(r#"{"type": "message", "user": "U1", "channel": "C1", "text": "hi"}"#)
            .await;
        wait_until(|| listener.event_count() == 1).await;

        let events = listener.events.lock().unwrap();
        let SessionEvent::Message(event) = &events[0] else {
            panic!("Expected a message event");
        };
        assert_eq!(event.user.as_ref().unwrap().name, "Alice");
        assert_eq!(event.message.text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_message_event_unknown_author() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        remote
            .push(r#"{"type": "message", "user": "U404", "text": "??"}"#)
            .await;
        wait_until(|| listener.event_count() == 1).await;

        let events = listener.events.lock().unwrap();
        let SessionEvent::Message(event) = &events[0] else {
            panic!("Expected a message event");
        };
        assert!(event.user.is_none());
        assert_eq!(listener.error_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_event_resolves_editor() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        remote
            .push(
                r#"{"type": "message", "subtype": "message_changed",
                    "user": "U1", "edited": {"user": "U2"}}"#,
            )
            .await;
        wait_until(|| listener.event_count() == 1).await;

        let events = listener.events.lock().unwrap();
        let SessionEvent::Message(event) = &events[0] else {
            panic!("Expected a message event");
        };
        assert_eq!(event.user.as_ref().unwrap().id, "U2");
    }

    #[tokio::test]
    async fn test_post_handshake_error_keeps_session_open() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        remote
            .push(r#"{"type": "error", "error": {"code": 9, "msg": "slow down"}}"#)
            .await;
        wait_until(|| listener.error_count() == 1).await;

        assert_eq!(session.state(), SessionState::Operational);
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_removed_listener_gets_no_further_notifications() {
        let (session, remote) = session();
        let removed = Arc::new(Recording::default());
        let kept = Arc::new(Recording::default());
        let removed_id = session.add_listener(Arc::clone(&removed) as Arc<dyn RealTimeListener>);
        session.add_listener(Arc::clone(&kept) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        wait_until(|| removed.login_count() == 1 && kept.login_count() == 1).await;

        assert!(session.remove_listener(removed_id));
        remote
            .push(r#"{"type": "message", "user": "U1", "text": "hi"}"#)
            .await;
        wait_until(|| kept.event_count() == 1).await;

        assert_eq!(removed.event_count(), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_frames_are_ignored() {
        let (session, remote) = session();
        let listener = Arc::new(Recording::default());
        session.add_listener(Arc::clone(&listener) as Arc<dyn RealTimeListener>);

        remote.push(r#"{"type": "hello"}"#).await;
        remote.push(r#"{"type": "presence_change", "user": "U1"}"#).await;
        remote.push(r#"{"type": "channel_rename"}"#).await;
        remote
            .push(r#"{"type": "message", "user": "U1", "text": "marker"}"#)
            .await;
        wait_until(|| listener.event_count() == 1).await;

        assert_eq!(listener.error_count(), 0);
        assert_eq!(listener.event_count(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (session, _remote) = session();

        session.close().await;
        assert!(!session.is_open());
        session.close().await;
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_ping_ids_start_at_one_and_increment() {
        let (session, mut remote) = session();

        assert_eq!(session.send_ping().await.unwrap(), 1);
        assert_eq!(session.send_ping().await.unwrap(), 2);

        for expected in [1u64, 2] {
            let Some(RemoteEvent::Frame(text)) = remote.next_outbound().await else {
                panic!("Expected an outbound frame");
            };
            let value: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["type"], "ping");
            assert_eq!(value["id"], expected);
        }
    }

    #[tokio::test]
    async fn test_ping_after_close_fails() {
        let (session, _remote) = session();

        session.close().await;
        assert!(matches!(
            session.send_ping().await,
            Err(SessionError::Transport(TransportError::ConnectionClosed))
        ));
    }
}
