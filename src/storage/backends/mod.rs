//! Storage backend implementations

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryBackend;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
