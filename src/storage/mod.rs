//! Persistence behind injected repository traits.
//!
//! - [`repo`] – traits and the records they exchange
//! - [`json_repo`] – flat JSON files in one data directory
//! - [`memory_repo`] – in-memory store for tests and simulations
//! - [`error`] – [`StoreError`]

pub mod error;
pub mod json_repo;
pub mod memory_repo;
pub mod repo;

pub use error::StoreError;
pub use json_repo::JsonRepository;
pub use memory_repo::MemoryRepository;
