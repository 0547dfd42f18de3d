//! Frame types for the Tether gateway protocol.
//!
//! The gateway speaks JSON text frames. Every inbound frame is an object
//! with a `type` field; everything else on the frame depends on that type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recognized inbound event-type strings.
///
/// This is the closed set the session knows how to classify. Frames with a
/// type outside this set are dropped without comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Handshake success sentinel, must be the first frame on the wire.
    Hello,
    /// Error report, both during handshake and post-handshake.
    Error,
    Message,
    ChannelCreated,
    ChannelJoined,
    ChannelLeft,
    ChannelRename,
    ChannelArchive,
    ChannelUnarchive,
    ChannelHistoryChanged,
    GroupJoined,
    GroupLeft,
    GroupOpen,
    GroupClose,
    GroupArchive,
    GroupUnarchive,
    GroupRename,
    GroupHistoryChanged,
    UserChange,
    TeamJoin,
}

impl EventKind {
    /// Classify a raw type string. Returns `None` for unrecognized types.
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        let kind = match kind {
            "hello" => EventKind::Hello,
            "error" => EventKind::Error,
            "message" => EventKind::Message,
            "channel_created" => EventKind::ChannelCreated,
            "channel_joined" => EventKind::ChannelJoined,
            "channel_left" => EventKind::ChannelLeft,
            "channel_rename" => EventKind::ChannelRename,
            "channel_archive" => EventKind::ChannelArchive,
            "channel_unarchive" => EventKind::ChannelUnarchive,
            "channel_history_changed" => EventKind::ChannelHistoryChanged,
            "group_joined" => EventKind::GroupJoined,
            "group_left" => EventKind::GroupLeft,
            "group_open" => EventKind::GroupOpen,
            "group_close" => EventKind::GroupClose,
            "group_archive" => EventKind::GroupArchive,
            "group_unarchive" => EventKind::GroupUnarchive,
            "group_rename" => EventKind::GroupRename,
            "group_history_changed" => EventKind::GroupHistoryChanged,
            "user_change" => EventKind::UserChange,
            "team_join" => EventKind::TeamJoin,
            _ => return None,
        };
        Some(kind)
    }

    /// The wire spelling of this event kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Hello => "hello",
            EventKind::Error => "error",
            EventKind::Message => "message",
            EventKind::ChannelCreated => "channel_created",
            EventKind::ChannelJoined => "channel_joined",
            EventKind::ChannelLeft => "channel_left",
            EventKind::ChannelRename => "channel_rename",
            EventKind::ChannelArchive => "channel_archive",
            EventKind::ChannelUnarchive => "channel_unarchive",
            EventKind::ChannelHistoryChanged => "channel_history_changed",
            EventKind::GroupJoined => "group_joined",
            EventKind::GroupLeft => "group_left",
            EventKind::GroupOpen => "group_open",
            EventKind::GroupClose => "group_close",
            EventKind::GroupArchive => "group_archive",
            EventKind::GroupUnarchive => "group_unarchive",
            EventKind::GroupRename => "group_rename",
            EventKind::GroupHistoryChanged => "group_history_changed",
            EventKind::UserChange => "user_change",
            EventKind::TeamJoin => "team_join",
        }
    }
}

/// One inbound frame, split into its type string and the full JSON object
/// it arrived as.
///
/// The payload keeps the whole object (type field included) so that typed
/// decoders can pick out whichever fields their event needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Raw value of the frame's `type` field.
    pub kind: String,
    /// The complete frame object.
    pub data: Value,
}

impl RawFrame {
    /// Classify the frame's type string.
    #[must_use]
    pub fn event_kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.kind)
    }

    /// Decode the `error` object carried by error frames, if present and
    /// well-formed.
    #[must_use]
    pub fn error(&self) -> Option<RtError> {
        self.data
            .get("error")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Error record carried inside `{"type": "error", "error": {...}}` frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtError {
    /// Gateway-assigned error code.
    pub code: i64,
    /// Human-readable description.
    pub msg: String,
}

/// Payload of a `message` frame.
///
/// Every field is optional on the wire; which ones are present depends on
/// the message subtype.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessagePayload {
    /// Id of the authoring user.
    #[serde(default)]
    pub user: Option<String>,
    /// Id of the channel or group the message was posted to.
    #[serde(default)]
    pub channel: Option<String>,
    /// Message body.
    #[serde(default)]
    pub text: Option<String>,
    /// Gateway timestamp, unique per channel.
    #[serde(default)]
    pub ts: Option<String>,
    /// Subtype tag, absent for plain messages.
    #[serde(default)]
    pub subtype: Option<MessageSubtype>,
    /// Edit attribution, present when the message was changed.
    #[serde(default)]
    pub edited: Option<Edited>,
}

impl MessagePayload {
    /// Whether this payload describes an edit to an earlier message.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(self.subtype, Some(MessageSubtype::MessageChanged))
    }

    /// Id of the user the message should be attributed to: the editor for
    /// edit subtypes, the original author otherwise.
    #[must_use]
    pub fn acting_user_id(&self) -> Option<&str> {
        if self.is_edit() {
            self.edited.as_ref().and_then(|e| e.user.as_deref())
        } else {
            self.user.as_deref()
        }
    }
}

/// Edit attribution on a changed message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Edited {
    /// Id of the user who performed the edit.
    #[serde(default)]
    pub user: Option<String>,
    /// Timestamp of the edit.
    #[serde(default)]
    pub ts: Option<String>,
}

/// Message subtype tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    BotMessage,
    MeMessage,
    MessageChanged,
    MessageDeleted,
    ChannelJoin,
    ChannelLeave,
    /// Any subtype the client does not model explicitly.
    #[serde(other)]
    Other,
}

/// Frames the client sends to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Keepalive probe; the gateway echoes the id back in a pong.
    Ping {
        /// Outbound sequence number, starts at 1 per connection.
        id: u64,
    },
}

impl OutboundFrame {
    /// Create a new Ping frame.
    #[must_use]
    pub fn ping(id: u64) -> Self {
        OutboundFrame::Ping { id }
    }
}
