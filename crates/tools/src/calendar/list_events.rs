//! `list_events`: events of one calendar, optionally within a time window.

use crate::operations::{CalendarOperations, ListEventsRequest};
use async_trait::async_trait;
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::info;

const DEFAULT_MAX_CAPACITY: i64 = 20;

pub struct ListEventsTool {
    ops: Arc<CalendarOperations>,
    spec: ToolSpec,
}

impl ListEventsTool {
    pub fn new(ops: Arc<CalendarOperations>) -> Self {
        let spec = ToolSpec::new(
            "list_events",
            "List events of a calendar, up to max_capacity entries, optionally restricted \
             to a time window.",
        )
        .param(ParamSpec::with_default(
            "calendar_id",
            ParamType::String,
            "primary",
            "ID of the calendar to query (default: 'primary')",
        ))
        .param(ParamSpec::with_default(
            "max_capacity",
            ParamType::Integer,
            DEFAULT_MAX_CAPACITY,
            "Maximum number of events to retrieve",
        ))
        .param(ParamSpec::optional(
            "time_min",
            ParamType::String,
            "Lower bound for event start in RFC3339 format (e.g., '2025-04-06T10:00:00-04:00')",
        ))
        .param(ParamSpec::optional(
            "time_max",
            ParamType::String,
            "Upper bound for event end in RFC3339 format (e.g., '2025-04-06T10:00:00-04:00')",
        ))
        .param(ParamSpec::with_default(
            "show_deleted",
            ParamType::Boolean,
            false,
            "Whether deleted events are included",
        ));
        Self { ops, spec }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        info!(tool = "list_events", "Tool `list_events` invoked");
        let request = ListEventsRequest {
            calendar_id: args.string("calendar_id").unwrap_or_else(|| "primary".into()),
            max_total: super::capacity(&args, DEFAULT_MAX_CAPACITY),
            time_min: args.string("time_min"),
            time_max: args.string("time_max"),
            show_deleted: args.bool("show_deleted").unwrap_or(false),
        };
        Ok(super::listing_result(self.ops.list_events(&request).await))
    }
}
