//! `create_event`: schedule a new event.

use crate::operations::{CalendarOperations, CreateEventRequest};
use async_trait::async_trait;
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::info;

pub struct CreateEventTool {
    ops: Arc<CalendarOperations>,
    spec: ToolSpec,
}

impl CreateEventTool {
    pub fn new(ops: Arc<CalendarOperations>, default_timezone: &str) -> Self {
        let spec = ToolSpec::new(
            "create_event",
            "Create an event in Google Calendar with the given details and return a message \
             with the id of the created event.",
        )
        .param(ParamSpec::required(
            "start",
            ParamType::String,
            "Event start time in RFC3339 format (e.g., '2025-04-06T10:00:00-04:00')",
        ))
        .param(ParamSpec::required(
            "end",
            ParamType::String,
            "Event end time in RFC3339 format (e.g., '2025-04-06T11:00:00-04:00')",
        ))
        .param(ParamSpec::with_default(
            "calendar_id",
            ParamType::String,
            "primary",
            "ID of the calendar where the event is created (default: 'primary')",
        ))
        .param(ParamSpec::with_default(
            "timezone",
            ParamType::String,
            default_timezone,
            format!("IANA time zone of the event (e.g., '{default_timezone}')"),
        ))
        .param(ParamSpec::optional(
            "summary",
            ParamType::String,
            "Short title of the event",
        ))
        .param(ParamSpec::optional(
            "description",
            ParamType::String,
            "Detailed description or notes",
        ))
        .param(ParamSpec::optional(
            "location",
            ParamType::String,
            "Physical or virtual location",
        ))
        .param(ParamSpec::optional(
            "attendees",
            ParamType::StringList,
            "Email addresses of the attendees",
        ))
        .param(ParamSpec::with_default(
            "send_notifications",
            ParamType::Boolean,
            true,
            "Whether attendees are notified",
        ));
        Self { ops, spec }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        info!(tool = "create_event", "Tool `create_event` invoked");
        let request = CreateEventRequest {
            start: args.require_str("start")?.to_string(),
            end: args.require_str("end")?.to_string(),
            calendar_id: args.string("calendar_id").unwrap_or_else(|| "primary".into()),
            timezone: args.string("timezone").unwrap_or_default(),
            summary: args.string("summary"),
            description: args.string("description"),
            location: args.string("location"),
            attendees: args.list("attendees").unwrap_or_default(),
            send_notifications: args.bool("send_notifications").unwrap_or(true),
        };
        Ok(super::status_result(self.ops.create_event(&request).await))
    }
}
