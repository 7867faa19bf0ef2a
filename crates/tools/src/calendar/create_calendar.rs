//! `create_calendar`: create a new secondary calendar.

use crate::operations::{CalendarOperations, CreateCalendarRequest};
use async_trait::async_trait;
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::info;

pub struct CreateCalendarTool {
    ops: Arc<CalendarOperations>,
    spec: ToolSpec,
}

impl CreateCalendarTool {
    pub fn new(ops: Arc<CalendarOperations>, default_timezone: &str) -> Self {
        let spec = ToolSpec::new(
            "create_calendar",
            "Create a new Google Calendar and return the id of the created calendar.",
        )
        .param(ParamSpec::required(
            "calendar_name",
            ParamType::String,
            "Name of the calendar to create",
        ))
        .param(ParamSpec::with_default(
            "timezone",
            ParamType::String,
            default_timezone,
            format!("IANA time zone of the calendar (default: {default_timezone})"),
        ));
        Self { ops, spec }
    }
}

#[async_trait]
impl Tool for CreateCalendarTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        info!(tool = "create_calendar", "Tool `create_calendar` invoked");
        let request = CreateCalendarRequest {
            name: args.require_str("calendar_name")?.to_string(),
            timezone: args.string("timezone").unwrap_or_default(),
        };
        Ok(super::status_result(self.ops.create_calendar(&request).await))
    }
}
