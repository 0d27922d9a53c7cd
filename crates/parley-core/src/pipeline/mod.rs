//! The turn pipeline: context preparation, model invocation, bookkeeping.

pub mod fallback;
pub mod orchestrator;
pub mod stages;
pub mod state;

pub use orchestrator::{AgentRuntime, ChatAgent, TurnReport};
