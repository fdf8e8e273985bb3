pub mod entities;
pub mod repositories;

pub use entities::{EventFields, SongFields, SongLinkKind, TrackItem, TrackSlot, UserEntity};
pub use repositories::{
    EventRepository, PermissionRepository, RefreshTokenRepository, SongRepository,
    TgAuthSessionRepository, UserRepository,
};
