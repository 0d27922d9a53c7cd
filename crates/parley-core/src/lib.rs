//! Turn orchestration and port definitions for Parley.
//!
//! This crate holds the conversation core: prompt selection, the model
//! provider abstraction, the session store, and the turn pipeline. It
//! defines the "ports" (traits) that the infrastructure layer implements and
//! depends only on `parley-types` -- never on `parley-infra` or any network
//! or storage crate.

pub mod credential;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod session;
