//! In-memory directory of workspace entities.
//!
//! The directory owns one (name, id) table pair per entity kind. It is
//! populated once from the bootstrap snapshot before the connection starts
//! and mutated afterwards only through the explicit `add_*` operations;
//! lookups from the frame-processing path run concurrently with them.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::entity::{BootstrapPayload, Channel, Group, User};

/// Directory errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A snapshot record could not be decoded.
    #[error("Malformed {kind} record in snapshot: {source}")]
    MalformedRecord {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Lookup tables for users, channels, and groups.
///
/// Names are matched case-insensitively; ids exactly. Name collisions within
/// a kind overwrite (last record wins), mirroring the snapshot contract.
#[derive(Debug, Default)]
pub struct EntityDirectory {
    users_by_name: DashMap<String, Arc<User>>,
    users_by_id: DashMap<String, Arc<User>>,
    channels_by_name: DashMap<String, Arc<Channel>>,
    channels_by_id: DashMap<String, Arc<Channel>>,
    groups_by_name: DashMap<String, Arc<Group>>,
    groups_by_id: DashMap<String, Arc<Group>>,
    self_user: OnceLock<Arc<User>>,
}

impl EntityDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the directory from a bootstrap snapshot.
    ///
    /// Records the user whose id matches the snapshot's self id as the self
    /// user.
    ///
    /// # Errors
    ///
    /// Returns an error on the first record that cannot be decoded; the
    /// session must not come up against a partial snapshot.
    pub fn load(&self, snapshot: &BootstrapPayload) -> Result<(), DirectoryError> {
        let self_id = &snapshot.self_info.id;

        for record in &snapshot.users {
            let user: User = serde_json::from_value(record.clone()).map_err(|source| {
                DirectoryError::MalformedRecord {
                    kind: "user",
                    source,
                }
            })?;
            let user = self.add_user(user);
            if user.id == *self_id {
                let _ = self.self_user.set(user);
            }
        }

        for record in &snapshot.channels {
            let channel: Channel =
                serde_json::from_value(record.clone()).map_err(|source| {
                    DirectoryError::MalformedRecord {
                        kind: "channel",
                        source,
                    }
                })?;
            self.add_channel(channel);
        }

        for record in &snapshot.groups {
            let group: Group = serde_json::from_value(record.clone()).map_err(|source| {
                DirectoryError::MalformedRecord {
                    kind: "group",
                    source,
                }
            })?;
            self.add_group(group);
        }

        debug!(
            users = self.users_by_id.len(),
            channels = self.channels_by_id.len(),
            groups = self.groups_by_id.len(),
            "Directory loaded"
        );

        Ok(())
    }

    /// Insert a user, overwriting any existing entry with the same name or id.
    pub fn add_user(&self, user: User) -> Arc<User> {
        let user = Arc::new(user);
        self.users_by_name
            .insert(user.name.to_lowercase(), Arc::clone(&user));
        self.users_by_id.insert(user.id.clone(), Arc::clone(&user));
        user
    }

    /// Insert a channel, overwriting any existing entry with the same name or id.
    pub fn add_channel(&self, channel: Channel) -> Arc<Channel> {
        let channel = Arc::new(channel);
        self.channels_by_name
            .insert(channel.name.to_lowercase(), Arc::clone(&channel));
        self.channels_by_id
            .insert(channel.id.clone(), Arc::clone(&channel));
        channel
    }

    /// Insert a group, overwriting any existing entry with the same name or id.
    pub fn add_group(&self, group: Group) -> Arc<Group> {
        let group = Arc::new(group);
        self.groups_by_name
            .insert(group.name.to_lowercase(), Arc::clone(&group));
        self.groups_by_id
            .insert(group.id.clone(), Arc::clone(&group));
        group
    }

    /// The user whose id matched the snapshot's self id, if any.
    #[must_use]
    pub fn self_user(&self) -> Option<Arc<User>> {
        self.self_user.get().cloned()
    }

    /// Look up a user by display name, case-insensitively.
    #[must_use]
    pub fn user(&self, name: &str) -> Option<Arc<User>> {
        self.users_by_name
            .get(&name.to_lowercase())
            .map(|entry| Arc::clone(&entry))
    }

    /// Look up a user by id.
    #[must_use]
    pub fn user_by_id(&self, id: &str) -> Option<Arc<User>> {
        self.users_by_id.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Look up a channel by display name, case-insensitively.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels_by_name
            .get(&name.to_lowercase())
            .map(|entry| Arc::clone(&entry))
    }

    /// Look up a channel by id.
    #[must_use]
    pub fn channel_by_id(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels_by_id.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Look up a group by display name, case-insensitively.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups_by_name
            .get(&name.to_lowercase())
            .map(|entry| Arc::clone(&entry))
    }

    /// Look up a group by id.
    #[must_use]
    pub fn group_by_id(&self, id: &str) -> Option<Arc<Group>> {
        self.groups_by_id.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Snapshot of all known users.
    #[must_use]
    pub fn users(&self) -> Vec<Arc<User>> {
        self.users_by_id
            .iter()
            .map(|entry| Arc::clone(&entry))
            .collect()
    }

    /// Snapshot of all known channels.
    #[must_use]
    pub fn channels(&self) -> Vec<Arc<Channel>> {
        self.channels_by_id
            .iter()
            .map(|entry| Arc::clone(&entry))
            .collect()
    }

    /// Snapshot of all known groups.
    #[must_use]
    pub fn groups(&self) -> Vec<Arc<Group>> {
        self.groups_by_id
            .iter()
            .map(|entry| Arc::clone(&entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> BootstrapPayload {
        serde_json::from_value(json!({
            "url": "wss://gateway.example/socket",
            "self": {"id": "U2"},
            "users": [
                {"id": "U1", "name": "Alice"},
                {"id": "U2", "name": "bob", "is_bot": false},
            ],
            "channels": [
                {"id": "C1", "name": "General", "is_member": true},
            ],
            "groups": [
                {"id": "G1", "name": "ops"},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_load_resolves_ids_and_names() {
        let directory = EntityDirectory::new();
        directory.load(&snapshot()).unwrap();

        assert_eq!(directory.user_by_id("U1").unwrap().name, "Alice");
        assert_eq!(directory.channel_by_id("C1").unwrap().name, "General");
        assert_eq!(directory.group_by_id("G1").unwrap().name, "ops");

        // Case-insensitive regardless of the casing in the snapshot.
        assert_eq!(directory.user("alice").unwrap().id, "U1");
        assert_eq!(directory.user("ALICE").unwrap().id, "U1");
        assert_eq!(directory.channel("general").unwrap().id, "C1");
        assert_eq!(directory.group("OPS").unwrap().id, "G1");
    }

    #[test]
    fn test_load_records_self_user() {
        let directory = EntityDirectory::new();
        directory.load(&snapshot()).unwrap();

        assert_eq!(directory.self_user().unwrap().id, "U2");
    }

    #[test]
    fn test_missing_entries_are_absent_not_errors() {
        let directory = EntityDirectory::new();
        directory.load(&snapshot()).unwrap();

        assert!(directory.user("nobody").is_none());
        assert!(directory.user_by_id("U999").is_none());
        assert!(directory.channel("random").is_none());
    }

    #[test]
    fn test_malformed_record_is_fatal() {
        let payload: BootstrapPayload = serde_json::from_value(json!({
            "url": "wss://gateway.example/socket",
            "self": {"id": "U1"},
            "users": [{"id": "U1"}],
            "channels": [],
            "groups": [],
        }))
        .unwrap();

        let directory = EntityDirectory::new();
        assert!(matches!(
            directory.load(&payload),
            Err(DirectoryError::MalformedRecord { kind: "user", .. })
        ));
    }

    #[test]
    fn test_name_collision_last_write_wins() {
        let directory = EntityDirectory::new();
        directory.add_user(User {
            id: "U1".into(),
            name: "dup".into(),
            real_name: None,
            is_bot: false,
            deleted: false,
        });
        directory.add_user(User {
            id: "U2".into(),
            name: "Dup".into(),
            real_name: None,
            is_bot: false,
            deleted: false,
        });

        assert_eq!(directory.user("dup").unwrap().id, "U2");
        // Both ids still resolve.
        assert!(directory.user_by_id("U1").is_some());
        assert!(directory.user_by_id("U2").is_some());
    }

    #[test]
    fn test_snapshot_views() {
        let directory = EntityDirectory::new();
        directory.load(&snapshot()).unwrap();

        assert_eq!(directory.users().len(), 2);
        assert_eq!(directory.channels().len(), 1);
        assert_eq!(directory.groups().len(), 1);
    }
}
