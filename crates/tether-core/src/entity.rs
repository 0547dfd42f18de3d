//! Workspace entity records.
//!
//! Entities arrive as JSON records inside the bootstrap snapshot. Each kind
//! has a stable opaque id and a display name; everything else is optional
//! and default-filled.

use serde::Deserialize;
use serde_json::Value;

/// A workspace member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// A public conversation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub members: Vec<String>,
}

/// A private conversation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub members: Vec<String>,
}

/// The bootstrap snapshot handed to the session at construction.
///
/// `url` is the transport endpoint; the entity arrays are kept raw here and
/// decoded record by record during directory load so that one malformed
/// record is reported against its kind.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapPayload {
    /// Gateway transport endpoint.
    pub url: String,
    /// The connecting identity.
    #[serde(rename = "self")]
    pub self_info: SelfInfo,
    /// Raw user records.
    pub users: Vec<Value>,
    /// Raw channel records.
    pub channels: Vec<Value>,
    /// Raw group records.
    pub groups: Vec<Value>,
}

/// Identity block of the bootstrap snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SelfInfo {
    pub id: String,
}
