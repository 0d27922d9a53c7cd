//! Conversation memory: the checkpointer port and the session store.

pub mod checkpoint;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
