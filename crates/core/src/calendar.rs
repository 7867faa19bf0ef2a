//! Calendar domain: the remote provider port and its normalized records.
//!
//! [`CalendarApi`] is the narrow interface to the remote calendar service:
//! six one-shot calls, two of them paged. Listings return raw provider items;
//! the operation layer projects them into [`CalendarRecord`] / [`EventRecord`],
//! which are plain values with no remote handles attached.

use crate::error::CalendarError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a provider listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Opaque cursor for the next page; `None` when the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Normalized projection of a remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub primary: bool,
    pub time_zone: Option<String>,
    /// Version tag
    pub etag: Option<String>,
    pub access_role: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCalendar {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    primary: bool,
    time_zone: Option<String>,
    etag: Option<String>,
    access_role: Option<String>,
}

impl CalendarRecord {
    /// Project a raw calendar-list entry.
    pub fn from_raw(raw: &Value) -> Result<Self, CalendarError> {
        let raw = RawCalendar::deserialize(raw)
            .map_err(|e| CalendarError::Decode(format!("calendar entry: {e}")))?;
        Ok(Self {
            id: raw.id,
            name: raw.summary,
            description: raw.description,
            primary: raw.primary,
            time_zone: raw.time_zone,
            etag: raw.etag,
            access_role: raw.access_role,
        })
    }
}

/// A start or end instant: `dateTime` for timed events, `date` for all-day ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Creator, organizer, or attendee of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPerson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(default, rename = "self", skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
}

impl EventPerson {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            email: Some(address.into()),
            ..Self::default()
        }
    }
}

/// Normalized projection of a remote event.
///
/// Serialized with the provider's field names so the LLM sees familiar keys;
/// absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub end: Option<EventDateTime>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub creator: Option<EventPerson>,
    #[serde(default)]
    pub organizer: Option<EventPerson>,
    #[serde(default)]
    pub attendees: Option<Vec<EventPerson>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "hangoutLink")]
    pub hangout_link: Option<String>,
    #[serde(default, rename = "conferenceData")]
    pub conference_data: Option<Value>,
    #[serde(default, rename = "recurringEventId")]
    pub recurring_event_id: Option<String>,
}

impl EventRecord {
    /// Project a raw event resource, dropping every field not in the record.
    pub fn from_raw(raw: &Value) -> Result<Self, CalendarError> {
        Self::deserialize(raw).map_err(|e| CalendarError::Decode(format!("event entry: {e}")))
    }
}

/// Body of a calendar insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendar {
    pub summary: String,
    pub time_zone: String,
}

/// Body of an event insert or patch. Only set fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<EventPerson>>,
}

/// Filters for an event listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub show_deleted: bool,
}

/// The remote calendar provider.
///
/// Every call is a single blocking round-trip: no retries, no caching.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Create a calendar; returns the created resource.
    async fn insert_calendar(&self, calendar: &NewCalendar) -> Result<Value, CalendarError>;

    /// One page of the user's calendar list.
    async fn list_calendars(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Value>, CalendarError>;

    /// One page of events from a calendar.
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &EventQuery,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Value>, CalendarError>;

    /// Create an event; returns the created resource.
    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventPayload,
        send_notifications: bool,
    ) -> Result<Value, CalendarError>;

    /// Partially update an event; returns the updated resource.
    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPayload,
    ) -> Result<Value, CalendarError>;

    async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        send_notifications: bool,
    ) -> Result<(), CalendarError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn calendar_record_from_raw_fills_defaults() {
        let raw = json!({
            "id": "c1",
            "summary": "Work",
            "primary": true,
            "timeZone": "America/Sao_Paulo",
            "kind": "calendar#calendarListEntry"
        });
        let record = CalendarRecord::from_raw(&raw).unwrap();
        assert_eq!(record.id, "c1");
        assert_eq!(record.name, "Work");
        assert_eq!(record.description, "");
        assert!(record.primary);
        assert_eq!(record.time_zone.as_deref(), Some("America/Sao_Paulo"));
        assert!(record.etag.is_none());
        assert!(record.access_role.is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["time_zone"], "America/Sao_Paulo");
        assert_eq!(json["access_role"], Value::Null);
    }

    #[test]
    fn calendar_record_requires_id() {
        let err = CalendarRecord::from_raw(&json!({"summary": "No id"})).unwrap_err();
        assert!(matches!(err, CalendarError::Decode(_)));
    }

    #[test]
    fn event_record_keeps_provider_keys() {
        let raw = json!({
            "id": "e1",
            "summary": "Standup",
            "start": {"dateTime": "2025-05-26T09:00:00-03:00", "timeZone": "America/Sao_Paulo"},
            "end": {"dateTime": "2025-05-26T09:15:00-03:00"},
            "status": "confirmed",
            "organizer": {"email": "me@example.com", "self": true},
            "attendees": [{"email": "a@example.com", "responseStatus": "accepted"}],
            "hangoutLink": "https://meet.google.com/abc",
            "htmlLink": "https://calendar.google.com/event?eid=1",
            "etag": "\"3\""
        });
        let record = EventRecord::from_raw(&raw).unwrap();
        assert_eq!(record.id.as_deref(), Some("e1"));
        assert_eq!(record.organizer.as_ref().unwrap().is_self, Some(true));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["hangoutLink"], "https://meet.google.com/abc");
        assert_eq!(json["start"]["dateTime"], "2025-05-26T09:00:00-03:00");
        assert_eq!(json["attendees"][0]["responseStatus"], "accepted");
        assert_eq!(json["recurringEventId"], Value::Null);
        assert!(json.get("htmlLink").is_none());
        assert!(json.get("etag").is_none());
    }

    #[test]
    fn payload_serializes_only_set_fields() {
        let payload = EventPayload {
            start: Some(EventDateTime {
                time_zone: Some("UTC".into()),
                ..EventDateTime::default()
            }),
            summary: Some("Lunch".into()),
            ..EventPayload::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, json!({"start": {"timeZone": "UTC"}, "summary": "Lunch"}));
    }
}
