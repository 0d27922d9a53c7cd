//! Interactive terminal chat.
//!
//! A readline loop over the same agent the REST API serves. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
