//! `update_event`: patch the supplied fields of an existing event.
//!
//! `timezone` carries a default, so every update also rewrites the
//! time zone of both `start` and `end`.

use crate::operations::{CalendarOperations, UpdateEventRequest};
use async_trait::async_trait;
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::info;

pub struct UpdateEventTool {
    ops: Arc<CalendarOperations>,
    spec: ToolSpec,
}

impl UpdateEventTool {
    pub fn new(ops: Arc<CalendarOperations>, default_timezone: &str) -> Self {
        let spec = ToolSpec::new(
            "update_event",
            "Update an event in Google Calendar, replacing the given fields with new values. \
             Fields that are not given keep their current values.",
        )
        .param(ParamSpec::required(
            "event_id",
            ParamType::String,
            "ID of the event to update",
        ))
        .param(ParamSpec::with_default(
            "calendar_id",
            ParamType::String,
            "primary",
            "ID of the calendar holding the event (default: 'primary')",
        ))
        .param(ParamSpec::optional(
            "start",
            ParamType::String,
            "New start time in ISO 8601 format (e.g., '2025-04-06T10:00:00-04:00')",
        ))
        .param(ParamSpec::optional(
            "end",
            ParamType::String,
            "New end time in ISO 8601 format (e.g., '2025-04-06T11:00:00-04:00')",
        ))
        .param(ParamSpec::with_default(
            "timezone",
            ParamType::String,
            default_timezone,
            "New IANA time zone for the event",
        ))
        .param(ParamSpec::optional(
            "summary",
            ParamType::String,
            "New title of the event",
        ))
        .param(ParamSpec::optional(
            "description",
            ParamType::String,
            "New description or notes",
        ))
        .param(ParamSpec::optional(
            "location",
            ParamType::String,
            "New physical or virtual location",
        ));
        Self { ops, spec }
    }
}

#[async_trait]
impl Tool for UpdateEventTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        info!(tool = "update_event", "Tool `update_event` invoked");
        let request = UpdateEventRequest {
            event_id: args.require_str("event_id")?.to_string(),
            calendar_id: args.string("calendar_id").unwrap_or_else(|| "primary".into()),
            start: args.string("start"),
            end: args.string("end"),
            timezone: args.string("timezone"),
            summary: args.string("summary"),
            description: args.string("description"),
            location: args.string("location"),
        };
        Ok(super::status_result(self.ops.update_event(&request).await))
    }
}
