//! Default implementations of the collaborator interfaces

pub mod file_store;
pub mod memory_store;
pub mod probe_registry;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use probe_registry::ProbeRegistry;
