//! `delete_event`: remove an event by id.

use crate::operations::{CalendarOperations, DeleteEventRequest};
use async_trait::async_trait;
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::info;

pub struct DeleteEventTool {
    ops: Arc<CalendarOperations>,
    spec: ToolSpec,
}

impl DeleteEventTool {
    pub fn new(ops: Arc<CalendarOperations>) -> Self {
        let spec = ToolSpec::new("delete_event", "Delete an event from Google Calendar by its id.")
            .param(ParamSpec::required(
                "event_id",
                ParamType::String,
                "ID of the event to delete",
            ))
            .param(ParamSpec::with_default(
                "send_notifications",
                ParamType::Boolean,
                true,
                "Whether attendees receive a cancellation notice",
            ))
            .param(ParamSpec::with_default(
                "calendar_id",
                ParamType::String,
                "primary",
                "ID of the calendar holding the event",
            ));
        Self { ops, spec }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        info!(tool = "delete_event", "Tool `delete_event` invoked");
        let request = DeleteEventRequest {
            event_id: args.require_str("event_id")?.to_string(),
            calendar_id: args.string("calendar_id").unwrap_or_else(|| "primary".into()),
            send_notifications: args.bool("send_notifications").unwrap_or(true),
        };
        Ok(super::status_result(self.ops.delete_event(&request).await))
    }
}
