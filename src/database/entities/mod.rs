mod event;
mod song;
mod user;

pub use event::{EventFields, TrackItem, TrackSlot};
pub use song::{SongFields, SongLinkKind};
pub use user::UserEntity;
