//! Google Calendar tools for calclaw.
//!
//! [`operations`] holds the six calendar operations over an injected
//! [`CalendarApi`](calclaw_core::calendar::CalendarApi) handle; [`calendar`]
//! wraps each one as a [`Tool`](calclaw_core::tool::Tool) with a declared
//! parameter schema, and [`pagination`] aggregates paged listings.

pub mod calendar;
pub mod operations;
pub mod pagination;

pub use calendar::calendar_registry;
pub use operations::{CalendarOperations, StatusMessage};
pub use pagination::fetch_all;
