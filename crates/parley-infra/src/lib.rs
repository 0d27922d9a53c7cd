//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: model
//! backends behind cargo features, the in-memory checkpointer and its idle
//! session sweeper, credential stores, and the configuration loader.

pub mod checkpoint;
pub mod config;
pub mod llm;
pub mod secret;
