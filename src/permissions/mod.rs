//! Per-user capability flags and the rules that gate every mutation.
//!
//! A user without a `user_permissions` row has every flag off.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPermissions {
    pub edit_own_participation: bool,
    pub edit_any_participation: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPermissions {
    pub edit_own_songs: bool,
    pub edit_any_songs: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPermissions {
    pub edit_events: bool,
    pub edit_tracklists: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub join: JoinPermissions,
    pub songs: SongPermissions,
    pub events: EventPermissions,
}

/// Flat row shape of `user_permissions`.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PermissionRow {
    pub edit_own_participation: bool,
    pub edit_any_participation: bool,
    pub edit_own_songs: bool,
    pub edit_any_songs: bool,
    pub edit_events: bool,
    pub edit_tracklists: bool,
}

impl From<PermissionRow> for PermissionSet {
    fn from(row: PermissionRow) -> Self {
        Self {
            join: JoinPermissions {
                edit_own_participation: row.edit_own_participation,
                edit_any_participation: row.edit_any_participation,
            },
            songs: SongPermissions {
                edit_own_songs: row.edit_own_songs,
                edit_any_songs: row.edit_any_songs,
            },
            events: EventPermissions {
                edit_events: row.edit_events,
                edit_tracklists: row.edit_tracklists,
            },
        }
    }
}

impl PermissionSet {
    /// Granted to password-registered accounts until an admin decides otherwise.
    pub fn none() -> Self {
        Self::default()
    }

    /// Granted to users created through Telegram login.
    pub fn chat_member_defaults() -> Self {
        Self {
            join: JoinPermissions {
                edit_own_participation: true,
                edit_any_participation: false,
            },
            songs: SongPermissions {
                edit_own_songs: true,
                edit_any_songs: false,
            },
            events: EventPermissions::default(),
        }
    }

    pub fn can_create_song(&self) -> bool {
        self.songs.edit_own_songs || self.songs.edit_any_songs
    }
}

fn owned_by(owner_id: Option<Uuid>, actor_id: Uuid) -> bool {
    owner_id == Some(actor_id)
}

pub fn can_edit_song(perms: Option<&PermissionSet>, owner_id: Option<Uuid>, actor_id: Uuid) -> bool {
    let Some(perms) = perms else {
        return false;
    };
    perms.songs.edit_any_songs || (perms.songs.edit_own_songs && owned_by(owner_id, actor_id))
}

/// `owner_id` is the participant whose assignment changes.
pub fn can_edit_join(perms: Option<&PermissionSet>, owner_id: Option<Uuid>, actor_id: Uuid) -> bool {
    let Some(perms) = perms else {
        return false;
    };
    perms.join.edit_any_participation
        || (perms.join.edit_own_participation && owned_by(owner_id, actor_id))
}

pub fn can_edit_event(perms: Option<&PermissionSet>) -> bool {
    perms.is_some_and(|p| p.events.edit_events)
}

/// Editing events implies control over their tracklists.
pub fn can_edit_tracklist(perms: Option<&PermissionSet>) -> bool {
    perms.is_some_and(|p| p.events.edit_tracklists || p.events.edit_events)
}
