mod handler;
mod model;

pub use handler::{
    create_event, delete_event, join_event, leave_event, update_event, update_tracklist,
};
pub use model::{
    CreateEventRequest, EventIdRequest, EventResponse, ParticipationRequest, UpdateEventRequest,
    UpdateTracklistRequest,
};
