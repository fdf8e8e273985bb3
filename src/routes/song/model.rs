use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::{SongFields, SongLinkKind},
    error::AppError,
};

#[derive(Debug, Deserialize)]
pub struct SongLink {
    pub kind: SongLinkKind,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub description: String,
    pub link: SongLink,
    #[serde(default)]
    pub available_roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSongRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub song: CreateSongRequest,
}

#[derive(Debug, Deserialize)]
pub struct SongIdRequest {
    pub id: Uuid,
}

/// `user_id` is the participant; omitted means the caller.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub song_id: Uuid,
    pub role: String,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongResponse {
    pub id: Uuid,
}

impl CreateSongRequest {
    /// Validated row fields plus the normalized role list.
    pub fn into_fields(self) -> Result<(SongFields, Vec<String>), AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::invalid_argument("song title is required"));
        }

        let link_kind = self
            .link
            .kind
            .as_db()
            .ok_or_else(|| AppError::invalid_argument("unsupported link kind"))?;

        let fields = SongFields {
            title,
            artist: self.artist.trim().to_string(),
            description: self.description,
            link_kind,
            link_url: self.link.url.trim().to_string(),
        };

        Ok((fields, normalize_roles(self.available_roles)))
    }
}

/// Trims, drops blanks and duplicates, keeps first-seen order.
pub(crate) fn normalize_roles(roles: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(roles.len());
    for role in roles {
        let role = role.trim();
        if !role.is_empty() && !out.iter().any(|r| r == role) {
            out.push(role.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str, title: &str, roles: &[&str]) -> CreateSongRequest {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "artist": " The Band ",
            "link": { "kind": kind, "url": "https://youtu.be/abc" },
            "available_roles": roles,
        }))
        .unwrap()
    }

    #[test]
    fn accepts_known_link_kinds() {
        for kind in ["youtube", "yandex_music", "soundcloud"] {
            let (fields, _) = request(kind, "Song", &[]).into_fields().unwrap();
            assert_eq!(fields.link_kind, kind);
            assert_eq!(fields.artist, "The Band");
        }
    }

    #[test]
    fn rejects_unknown_link_kind() {
        let err = request("vk", "Song", &[]).into_fields().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_blank_title() {
        let err = request("youtube", "   ", &[]).into_fields().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn roles_are_normalized() {
        let (_, roles) = request("youtube", "Song", &[" guitar", "vocals", "guitar ", "", "drums"])
            .into_fields()
            .unwrap();
        assert_eq!(roles, vec!["guitar", "vocals", "drums"]);
    }

    #[test]
    fn update_request_flattens_song_fields() {
        let id = Uuid::new_v4();
        let req: UpdateSongRequest = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "Song",
            "link": { "kind": "soundcloud", "url": "" },
        }))
        .unwrap();
        assert_eq!(req.id, id);
        assert!(req.song.available_roles.is_empty());
    }
}
