//! Storage factory for creating storage instances

use std::sync::Arc;
use tracing::info;

use super::backends::MemoryBackend;
#[cfg(feature = "postgres")]
use super::backends::PostgresBackend;
use super::config::{BackendType, StorageConfig};
use super::error::{StorageError, StorageResult};
use super::traits::MarketplaceStorage;

/// Factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create storage from explicit configuration
    pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn MarketplaceStorage>> {
        info!(backend = ?config.backend, "Opening storage backend");
        match config.backend {
            BackendType::Memory => Ok(Arc::new(MemoryBackend::new())),
            #[cfg(feature = "postgres")]
            BackendType::Postgres => {
                if config.postgres.connection_string.is_empty() {
                    return Err(StorageError::configuration(
                        "PostgreSQL backend requires a connection string",
                    ));
                }
                let backend = PostgresBackend::new(&config.postgres).await?;
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "postgres"))]
            BackendType::Postgres => Err(StorageError::configuration(
                "PostgreSQL backend not enabled. Enable with --features postgres",
            )),
        }
    }

    /// Create an in-memory storage instance
    pub fn memory() -> Arc<dyn MarketplaceStorage> {
        Arc::new(MemoryBackend::new())
    }
}
