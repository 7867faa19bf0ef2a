//! # calclaw Core
//!
//! Domain types, traits, and error definitions for the calclaw calendar agent.
//! This crate has **no framework dependencies**: it defines the domain model
//! that every other crate implements against.
//!
//! ## Seams
//!
//! Each external collaborator is a trait here, implemented elsewhere:
//! - [`Provider`]: the LLM that decides the next action
//! - [`CalendarApi`]: the remote calendar provider
//! - [`HistoryStore`]: per-session conversation persistence
//! - [`Tool`]: a named, schema-described operation the agent can invoke

pub mod calendar;
pub mod error;
pub mod history;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use calendar::{CalendarApi, CalendarRecord, EventRecord, Page};
pub use error::{Error, Result};
pub use history::HistoryStore;
pub use message::{Conversation, Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolCall, ToolRegistry, ToolResult, ToolSpec};
