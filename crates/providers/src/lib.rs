//! LLM provider implementations for calclaw.
//!
//! All providers implement the `calclaw_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRoute, ProviderRouter, build_from_config};
