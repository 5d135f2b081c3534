//! Waiting-queue backends.

pub mod memory;

pub use memory::InMemoryWaitingQueue;
