//! The six calendar tools and the registry that exposes them to the LLM.

pub mod create_calendar;
pub mod create_event;
pub mod delete_event;
pub mod list_calendars;
pub mod list_events;
pub mod update_event;

pub use create_calendar::CreateCalendarTool;
pub use create_event::CreateEventTool;
pub use delete_event::DeleteEventTool;
pub use list_calendars::ListCalendarsTool;
pub use list_events::ListEventsTool;
pub use update_event::UpdateEventTool;

use crate::operations::{CalendarOperations, StatusMessage};
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ToolArgs, ToolRegistry, ToolResult};
use serde::Serialize;
use std::sync::Arc;

/// Build the static registry of calendar tools.
///
/// `default_timezone` is the fallback zone advertised by the tools that
/// take a `timezone` parameter.
pub fn calendar_registry(
    ops: Arc<CalendarOperations>,
    default_timezone: &str,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CreateCalendarTool::new(ops.clone(), default_timezone)))?;
    registry.register(Arc::new(ListCalendarsTool::new(ops.clone())))?;
    registry.register(Arc::new(ListEventsTool::new(ops.clone())))?;
    registry.register(Arc::new(CreateEventTool::new(ops.clone(), default_timezone)))?;
    registry.register(Arc::new(UpdateEventTool::new(ops.clone(), default_timezone)))?;
    registry.register(Arc::new(DeleteEventTool::new(ops)))?;
    Ok(registry)
}

fn status_result(message: StatusMessage) -> ToolResult {
    ToolResult::text(message.ok, message.text)
}

fn listing_result<T: Serialize>(listing: Result<Vec<T>, String>) -> ToolResult {
    match listing.map(|records| serde_json::to_value(&records)) {
        Ok(Ok(value)) => ToolResult::json(value),
        Ok(Err(e)) => ToolResult::text(false, format!("Failed to encode listing: {e}")),
        Err(text) => ToolResult::text(false, text),
    }
}

/// `max_capacity`, with negative values clamped to zero.
fn capacity(args: &ToolArgs, default: i64) -> usize {
    args.i64("max_capacity").unwrap_or(default).max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::tests::RecordingCalendar;
    use crate::operations::UNAVAILABLE_MESSAGE;
    use calclaw_core::tool::ToolCall;
    use serde_json::{Value, json};

    const TZ: &str = "America/Sao_Paulo";

    fn registry_over(api: &Arc<RecordingCalendar>) -> ToolRegistry {
        let ops = Arc::new(CalendarOperations::connected(api.clone()));
        calendar_registry(ops, TZ).unwrap()
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn registry_exposes_six_tools_in_order() {
        let registry = registry_over(&Arc::new(RecordingCalendar::default()));
        assert_eq!(
            registry.names(),
            vec![
                "create_calendar",
                "list_calendars",
                "list_events",
                "create_event",
                "update_event",
                "delete_event"
            ]
        );
    }

    #[test]
    fn schemas_carry_defaults_and_required() {
        let registry = registry_over(&Arc::new(RecordingCalendar::default()));
        let defs = registry.definitions();
        let schema = |name: &str| {
            defs.iter()
                .find(|d| d.name == name)
                .map(|d| d.parameters.clone())
                .unwrap()
        };

        let create_calendar = schema("create_calendar");
        assert_eq!(create_calendar["required"], json!(["calendar_name"]));
        assert_eq!(create_calendar["properties"]["timezone"]["default"], TZ);

        let list_events = schema("list_events");
        assert_eq!(list_events["required"], json!([]));
        assert_eq!(list_events["properties"]["max_capacity"]["default"], 20);
        assert_eq!(list_events["properties"]["show_deleted"]["default"], false);
        assert!(list_events["properties"]["time_min"].get("default").is_none());

        let create_event = schema("create_event");
        assert_eq!(create_event["required"], json!(["start", "end"]));
        assert_eq!(create_event["properties"]["attendees"]["type"], "array");
        assert_eq!(create_event["properties"]["send_notifications"]["default"], true);

        let update_event = schema("update_event");
        assert_eq!(update_event["required"], json!(["event_id"]));
        assert_eq!(update_event["properties"]["timezone"]["default"], TZ);

        let delete_event = schema("delete_event");
        assert_eq!(delete_event["required"], json!(["event_id"]));
        assert_eq!(delete_event["properties"].as_object().unwrap().len(), 3);
        assert_eq!(schema("list_calendars")["properties"]["max_capacity"]["default"], 200);
    }

    #[tokio::test]
    async fn list_calendars_returns_pretty_json() {
        let api = Arc::new(RecordingCalendar::with_calendars(vec![
            json!({"id": "c1", "summary": "Work", "primary": true}),
            json!({"id": "c2", "summary": "Family"}),
        ]));
        let result = registry_over(&api)
            .execute(&call("list_calendars", json!({"max_capacity": "1"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.call_id, "call_1");
        let data = result.data.unwrap();
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["name"], "Work");
        assert!(result.output.contains("\"name\": \"Work\""));
    }

    #[tokio::test]
    async fn negative_capacity_lists_nothing() {
        let api = Arc::new(RecordingCalendar::default());
        let result = registry_over(&api)
            .execute(&call("list_events", json!({"max_capacity": -5})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "[]");
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn update_without_timezone_applies_default_zone() {
        let api = Arc::new(RecordingCalendar::default());
        let result = registry_over(&api)
            .execute(&call("update_event", json!({"event_id": "ev1", "summary": "Gym"})))
            .await
            .unwrap();
        assert_eq!(
            result.output,
            "Event with id ev1 was updated with the fields: [start,end,summary]"
        );
        let payload = api.last_payload.lock().unwrap().clone().unwrap();
        assert_eq!(payload["start"], json!({"timeZone": TZ}));
    }

    #[tokio::test]
    async fn create_event_accepts_comma_separated_attendees() {
        let api = Arc::new(RecordingCalendar::default());
        let result = registry_over(&api)
            .execute(&call(
                "create_event",
                json!({
                    "start": "2025-05-26T15:30:00-03:00",
                    "end": "2025-05-26T16:30:00-03:00",
                    "attendees": "ana@example.com, bruno@example.com",
                    "send_notifications": "false"
                }),
            ))
            .await
            .unwrap();
        assert!(result.success);
        let payload = api.last_payload.lock().unwrap().clone().unwrap();
        assert_eq!(payload["attendees"][1]["email"], "bruno@example.com");
        assert_eq!(payload["start"]["timeZone"], TZ);
        assert_eq!(api.calls.lock().unwrap()[0], "insert_event:primary:false");
    }

    #[tokio::test]
    async fn missing_required_argument_is_an_error() {
        let api = Arc::new(RecordingCalendar::default());
        let err = registry_over(&api)
            .execute(&call("delete_event", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("'event_id'")));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = registry_over(&Arc::new(RecordingCalendar::default()));
        let err = registry
            .execute(&call("book_flight", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: book_flight");
    }

    #[tokio::test]
    async fn disconnected_tools_report_unavailable() {
        let ops = Arc::new(CalendarOperations::disconnected());
        let registry = calendar_registry(ops, TZ).unwrap();
        for (name, args) in [
            ("list_calendars", json!({})),
            ("create_calendar", json!({"calendar_name": "Gym"})),
            ("delete_event", json!({"event_id": "e1"})),
        ] {
            let result = registry.execute(&call(name, args)).await.unwrap();
            assert!(!result.success, "{name}");
            assert_eq!(result.output, UNAVAILABLE_MESSAGE);
        }
    }
}
