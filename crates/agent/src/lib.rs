//! The calclaw agent loop.
//!
//! One user turn runs a **think → act → observe** cycle:
//!
//! 1. **Load** the session history (seeding the system prompt for new sessions)
//! 2. **Think**: send the history and the tool catalog to the LLM
//! 3. **Act**: if the LLM asked for a tool, run exactly one call
//! 4. **Observe**: append the tool output and go back to step 2
//! 5. **Answer**: when the LLM replies with text, commit the turn and return it
//!
//! Turns of one session never interleave; different sessions run concurrently.

pub mod error;
pub mod loop_runner;
pub mod prompt;

pub use error::AgentError;
pub use loop_runner::{AgentLoop, APOLOGY_REPLY, ITERATION_LIMIT_REPLY};
pub use prompt::{SystemPrompt, now_at_offset};
