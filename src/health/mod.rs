//! Per-hotspot code health and remediation priority, obtained from an
//! external reasoning service in two dependent requests.

pub mod client;
pub mod language;
pub mod orchestrator;
pub mod prompt;
pub mod response;

pub use client::{AnthropicClient, Reasoner};
pub use orchestrator::{sort_by_priority, Orchestrator};
pub use prompt::PromptTemplates;
