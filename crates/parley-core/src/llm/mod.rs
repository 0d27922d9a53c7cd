//! Model provider abstractions for Parley.
//!
//! - `LlmProvider`: RPITIT trait for concrete backends
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `ChatModel`: the live-or-disabled model the pipeline invokes
//! - `ProviderRegistry`: startup-time mapping from configuration to `ChatModel`

pub mod box_provider;
pub mod model;
pub mod provider;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;
