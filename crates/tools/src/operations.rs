//! The calendar operation set.
//!
//! Every operation performs at most one remote mutation (or one paginated
//! listing) and never returns an error to its caller: validation, transport
//! and provider failures all come back as descriptive text. Listings return
//! fully projected records.

use crate::pagination::fetch_all;
use calclaw_core::calendar::{
    CalendarApi, CalendarRecord, EventDateTime, EventPayload, EventPerson, EventQuery, EventRecord,
    NewCalendar,
};
use calclaw_core::error::CalendarError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, warn};

/// Provider ceiling for one calendar-list page.
pub const CALENDAR_PAGE_CAP: u32 = 200;
/// Provider ceiling for one events page.
pub const EVENT_PAGE_CAP: u32 = 250;

pub const UNAVAILABLE_MESSAGE: &str = "Unable to communicate with the Google Calendar service.";
pub const INVALID_START_MESSAGE: &str = "The event start time is not in ISO/RFC3339 format";
pub const INVALID_END_MESSAGE: &str = "The event end time is not in ISO/RFC3339 format";

/// Text outcome of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// False when the text reports a validation or remote failure
    pub ok: bool,
    pub text: String,
}

impl StatusMessage {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCalendarRequest {
    pub name: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventsRequest {
    pub calendar_id: String,
    pub max_total: usize,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub show_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventRequest {
    pub start: String,
    pub end: String,
    pub calendar_id: String,
    pub timezone: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    pub send_notifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateEventRequest {
    pub event_id: String,
    pub calendar_id: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub timezone: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEventRequest {
    pub event_id: String,
    pub calendar_id: String,
    pub send_notifications: bool,
}

/// Whether `value` parses as an ISO-8601 / RFC3339 date or date-time.
pub fn is_iso_datetime(value: &str) -> bool {
    const WITH_OFFSET: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%d %H:%M%:z",
    ];
    const LOCAL: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || WITH_OFFSET
            .iter()
            .any(|f| DateTime::parse_from_str(value, f).is_ok())
        || LOCAL
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// The six calendar operations over an injected client handle.
///
/// `None` stands for "no authenticated client": every operation then
/// reports the service as unavailable.
pub struct CalendarOperations {
    client: Option<Arc<dyn CalendarApi>>,
}

impl CalendarOperations {
    pub fn new(client: Option<Arc<dyn CalendarApi>>) -> Self {
        Self { client }
    }

    pub fn connected(client: Arc<dyn CalendarApi>) -> Self {
        Self::new(Some(client))
    }

    pub fn disconnected() -> Self {
        Self::new(None)
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub async fn create_calendar(&self, request: &CreateCalendarRequest) -> StatusMessage {
        let Some(client) = &self.client else {
            return StatusMessage::failed(UNAVAILABLE_MESSAGE);
        };

        let body = NewCalendar {
            summary: request.name.clone(),
            time_zone: request.timezone.clone(),
        };
        match client.insert_calendar(&body).await {
            Ok(created) => {
                let id = created.get("id").and_then(|v| v.as_str()).unwrap_or_default();
                debug!(calendar_id = %id, "Calendar created");
                StatusMessage::ok(format!(
                    "Calendar created.\n summary: '{}' | calendar_id: '{id}'.",
                    request.name
                ))
            }
            Err(e) => tool_failure("create_calendar", &e),
        }
    }

    /// Calendars visible to the user, at most `max_total` of them.
    pub async fn list_calendars(&self, max_total: usize) -> Result<Vec<CalendarRecord>, String> {
        let Some(client) = &self.client else {
            return Err(UNAVAILABLE_MESSAGE.into());
        };

        let raw = fetch_all(max_total, CALENDAR_PAGE_CAP, |size, token| {
            let client = client.clone();
            async move { client.list_calendars(size, token.as_deref()).await }
        })
        .await
        .map_err(|e| tool_failure("list_calendars", &e).text)?;

        raw.iter()
            .map(CalendarRecord::from_raw)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| tool_failure("list_calendars", &e).text)
    }

    pub async fn list_events(&self, request: &ListEventsRequest) -> Result<Vec<EventRecord>, String> {
        let Some(client) = &self.client else {
            return Err(UNAVAILABLE_MESSAGE.into());
        };

        let query = EventQuery {
            time_min: request.time_min.clone(),
            time_max: request.time_max.clone(),
            show_deleted: request.show_deleted,
        };
        let raw = fetch_all(request.max_total, EVENT_PAGE_CAP, |size, token| {
            let client = client.clone();
            let query = &query;
            let calendar_id = request.calendar_id.as_str();
            async move {
                client
                    .list_events(calendar_id, query, size, token.as_deref())
                    .await
            }
        })
        .await
        .map_err(|e| tool_failure("list_events", &e).text)?;

        raw.iter()
            .map(EventRecord::from_raw)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| tool_failure("list_events", &e).text)
    }

    pub async fn create_event(&self, request: &CreateEventRequest) -> StatusMessage {
        let Some(client) = &self.client else {
            return StatusMessage::failed(UNAVAILABLE_MESSAGE);
        };
        if !is_iso_datetime(&request.start) {
            return StatusMessage::failed(INVALID_START_MESSAGE);
        }
        if !is_iso_datetime(&request.end) {
            return StatusMessage::failed(INVALID_END_MESSAGE);
        }

        let at = |value: &str| EventDateTime {
            date_time: Some(value.to_string()),
            date: None,
            time_zone: Some(request.timezone.clone()),
        };
        let payload = EventPayload {
            start: Some(at(&request.start)),
            end: Some(at(&request.end)),
            summary: request.summary.clone(),
            description: request.description.clone(),
            location: request.location.clone(),
            attendees: (!request.attendees.is_empty())
                .then(|| request.attendees.iter().map(EventPerson::email).collect()),
        };

        match client
            .insert_event(&request.calendar_id, &payload, request.send_notifications)
            .await
        {
            Ok(created) => {
                let field = |key: &str| {
                    created
                        .get(key)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                StatusMessage::ok(format!(
                    "Event created successfully with id '{}'. \nEvent link: {}",
                    field("id"),
                    field("htmlLink")
                ))
            }
            Err(e) => tool_failure("create_event", &e),
        }
    }

    /// Patch only the supplied fields.
    ///
    /// A timezone is written to both `start` and `end`, even when neither
    /// date-time is supplied, and both then count as changed.
    pub async fn update_event(&self, request: &UpdateEventRequest) -> StatusMessage {
        let Some(client) = &self.client else {
            return StatusMessage::failed(UNAVAILABLE_MESSAGE);
        };

        let (patch, changed) = match build_patch(request) {
            Ok(built) => built,
            Err(message) => return StatusMessage::failed(message),
        };

        match client
            .patch_event(&request.calendar_id, &request.event_id, &patch)
            .await
        {
            Ok(_) => StatusMessage::ok(format!(
                "Event with id {} was updated with the fields: [{}]",
                request.event_id,
                changed.join(",")
            )),
            Err(e) => {
                warn!(event_id = %request.event_id, error = %e, "Event update failed");
                StatusMessage::failed(format!("Failed to update the event. Error: {e}"))
            }
        }
    }

    pub async fn delete_event(&self, request: &DeleteEventRequest) -> StatusMessage {
        let Some(client) = &self.client else {
            return StatusMessage::failed(UNAVAILABLE_MESSAGE);
        };

        match client
            .delete_event(
                &request.calendar_id,
                &request.event_id,
                request.send_notifications,
            )
            .await
        {
            Ok(()) => StatusMessage::ok(format!(
                "Event (ID: {}) deleted successfully.",
                request.event_id
            )),
            Err(e) => StatusMessage::failed(format!(
                "Error deleting event from calendar. Event ID: {} - Error message:\n{e}",
                request.event_id
            )),
        }
    }
}

/// The partial-update body and the changed field names in canonical order.
fn build_patch(
    request: &UpdateEventRequest,
) -> Result<(EventPayload, Vec<&'static str>), &'static str> {
    let mut patch = EventPayload::default();

    if let Some(start) = &request.start {
        if !is_iso_datetime(start) {
            return Err(INVALID_START_MESSAGE);
        }
        patch.start = Some(EventDateTime {
            date_time: Some(start.clone()),
            ..EventDateTime::default()
        });
    }

    if let Some(end) = &request.end {
        if !is_iso_datetime(end) {
            return Err(INVALID_END_MESSAGE);
        }
        patch.end = Some(EventDateTime {
            date_time: Some(end.clone()),
            ..EventDateTime::default()
        });
    }

    if let Some(timezone) = &request.timezone {
        patch.start.get_or_insert_with(EventDateTime::default).time_zone = Some(timezone.clone());
        patch.end.get_or_insert_with(EventDateTime::default).time_zone = Some(timezone.clone());
    }

    patch.summary = request.summary.clone();
    patch.description = request.description.clone();
    patch.location = request.location.clone();

    let changed = [
        ("start", patch.start.is_some()),
        ("end", patch.end.is_some()),
        ("summary", patch.summary.is_some()),
        ("description", patch.description.is_some()),
        ("location", patch.location.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, set)| set.then_some(name))
    .collect();

    Ok((patch, changed))
}

fn tool_failure(tool: &str, error: &CalendarError) -> StatusMessage {
    warn!(tool, error = %error, "Calendar operation failed");
    StatusMessage::failed(format!("Failed to run tool `{tool}`. Error: {error}"))
}
