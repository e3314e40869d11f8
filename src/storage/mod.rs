//! Persistence of the monitoring state
//!
//! The monitor keeps exactly one record. The `StateStore` trait hides
//! where it lives:
//!
//! - **File** (default): JSON file replaced atomically on every save
//! - **In-Memory**: no persistence, for tests and dry runs

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::StateStore;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
