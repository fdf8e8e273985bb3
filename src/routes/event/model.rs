use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::{EventFields, TrackItem, TrackSlot},
    error::AppError,
};

pub type CreateEventRequest = EventFields;

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub event: EventFields,
}

#[derive(Debug, Deserialize)]
pub struct EventIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTracklistRequest {
    pub event_id: Uuid,
    #[serde(default)]
    pub items: Vec<TrackItem>,
}

/// `user_id` is the participant; omitted means the caller.
#[derive(Debug, Deserialize)]
pub struct ParticipationRequest {
    pub event_id: Uuid,
    pub role: String,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: Uuid,
}

pub(crate) fn validate_event(mut fields: EventFields) -> Result<EventFields, AppError> {
    fields.title = fields.title.trim().to_string();
    if fields.title.is_empty() {
        return Err(AppError::invalid_argument("event title is required"));
    }
    fields.location = fields.location.trim().to_string();
    Ok(fields)
}

/// Every item needs a song or a custom title, and positions must be unique
/// and fit a Postgres INTEGER. Returns the slots sorted by position.
pub(crate) fn validate_tracklist(items: Vec<TrackItem>) -> Result<Vec<TrackSlot>, AppError> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut slots = Vec::with_capacity(items.len());

    for item in items {
        let position = i32::try_from(item.order).map_err(|_| {
            AppError::invalid_argument(format!("track position {} is out of range", item.order))
        })?;

        let custom_title = item
            .custom_title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let custom_artist = item
            .custom_artist
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        if item.song_id.is_none() && custom_title.is_none() {
            return Err(AppError::invalid_argument(format!(
                "track {} needs a song or a custom title",
                item.order
            )));
        }
        if !seen.insert(position) {
            return Err(AppError::invalid_argument(format!(
                "duplicate track position {}",
                item.order
            )));
        }

        slots.push(TrackSlot {
            position,
            song_id: item.song_id,
            custom_title,
            custom_artist,
        });
    }

    slots.sort_by_key(|slot| slot.position);
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(order: u32, song: bool, title: Option<&str>) -> TrackItem {
        TrackItem {
            order,
            song_id: song.then(Uuid::new_v4),
            custom_title: title.map(str::to_string),
            custom_artist: None,
        }
    }

    #[test]
    fn tracklist_is_sorted() {
        let items = validate_tracklist(vec![
            item(3, true, None),
            item(1, false, Some("Jam")),
            item(2, true, Some("ignored title")),
        ])
        .unwrap();
        let positions: Vec<i32> = items.iter().map(|slot| slot.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn empty_tracklist_is_fine() {
        assert!(validate_tracklist(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn item_needs_song_or_title() {
        let err = validate_tracklist(vec![item(1, false, Some("   "))]).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn positions_are_unique() {
        let err = validate_tracklist(vec![item(1, true, None), item(1, true, None)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn position_must_fit_an_integer_column() {
        let max = i32::MAX as u32;
        assert_eq!(
            validate_tracklist(vec![item(max, true, None)]).unwrap()[0].position,
            i32::MAX
        );

        let err = validate_tracklist(vec![item(max + 1, true, None)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn event_needs_title() {
        let fields: EventFields = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "location": "Club",
        }))
        .unwrap();
        assert!(validate_event(fields).is_err());
    }

    #[test]
    fn update_request_parses_start_time() {
        let req: UpdateEventRequest = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "title": "Jam night",
            "start_at": "2025-03-01T19:00:00Z",
            "notify_day_before": true,
        }))
        .unwrap();
        let event = validate_event(req.event).unwrap();
        assert_eq!(event.title, "Jam night");
        assert!(event.start_at.is_some());
        assert!(event.notify_day_before);
        assert!(!event.notify_hour_before);
    }
}
