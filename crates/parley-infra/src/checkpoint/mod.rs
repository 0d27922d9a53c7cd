//! Checkpointer implementations and session housekeeping.

pub mod memory;
pub mod sweeper;

pub use self::memory::MemoryCheckpointer;
pub use self::sweeper::spawn_session_sweeper;
