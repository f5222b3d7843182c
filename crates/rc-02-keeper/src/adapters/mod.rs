//! Adapters: bundled store implementations.

pub mod memory;

pub use memory::MemoryStore;
