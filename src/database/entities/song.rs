use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongLinkKind {
    Youtube,
    YandexMusic,
    Soundcloud,
    #[serde(other)]
    Unknown,
}

impl SongLinkKind {
    /// Value stored in `song.link_kind`; `None` for kinds that cannot be stored.
    pub fn as_db(self) -> Option<&'static str> {
        match self {
            Self::Youtube => Some("youtube"),
            Self::YandexMusic => Some("yandex_music"),
            Self::Soundcloud => Some("soundcloud"),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SongFields {
    pub title: String,
    pub artist: String,
    pub description: String,
    pub link_kind: &'static str,
    pub link_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kinds_from_json() {
        let kind: SongLinkKind = serde_json::from_str("\"yandex_music\"").unwrap();
        assert_eq!(kind.as_db(), Some("yandex_music"));

        let kind: SongLinkKind = serde_json::from_str("\"vk\"").unwrap();
        assert_eq!(kind, SongLinkKind::Unknown);
        assert_eq!(kind.as_db(), None);
    }
}
