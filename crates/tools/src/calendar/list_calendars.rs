//! `list_calendars`: the calendars visible to the authorized account.

use crate::operations::CalendarOperations;
use async_trait::async_trait;
use calclaw_core::error::ToolError;
use calclaw_core::tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::info;

const DEFAULT_MAX_CAPACITY: i64 = 200;

pub struct ListCalendarsTool {
    ops: Arc<CalendarOperations>,
    spec: ToolSpec,
}

impl ListCalendarsTool {
    pub fn new(ops: Arc<CalendarOperations>) -> Self {
        let spec = ToolSpec::new(
            "list_calendars",
            "List the calendars of the Google Calendar account, up to max_capacity entries. \
             Each entry has id, name, description, primary, time_zone, etag and access_role.",
        )
        .param(ParamSpec::with_default(
            "max_capacity",
            ParamType::Integer,
            DEFAULT_MAX_CAPACITY,
            "Maximum number of calendars to retrieve",
        ));
        Self { ops, spec }
    }
}

#[async_trait]
impl Tool for ListCalendarsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        info!(tool = "list_calendars", "Tool `list_calendars` invoked");
        let max_total = super::capacity(&args, DEFAULT_MAX_CAPACITY);
        Ok(super::listing_result(self.ops.list_calendars(max_total).await))
    }
}
