//! Shared domain types for Parley.
//!
//! This crate contains the types used across the Parley workspace:
//! conversation threads, session summaries, provider requests, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod secret;
