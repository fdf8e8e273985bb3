mod handler;
mod model;

pub use handler::{create_song, delete_song, join_role, leave_role, update_song};
pub use model::{CreateSongRequest, RoleRequest, SongIdRequest, SongLink, SongResponse, UpdateSongRequest};
