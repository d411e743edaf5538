//! Storage abstraction layer for talentdeck
//!
//! A unified [`MarketplaceStorage`] hands out one sub-trait per table. The
//! backend is chosen from configuration by [`StorageFactory`].

pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod traits;
pub mod types;

pub use backends::MemoryBackend;
#[cfg(feature = "postgres")]
pub use backends::PostgresBackend;
pub use config::{BackendType, PostgresConfig, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use factory::StorageFactory;
pub use traits::{
    AccountStorage, FounderStorage, IntroStorage, InviteStorage, MarketplaceStorage,
    PastRoleStorage, SessionStorage, ShortlistStorage, TagStorage, TalentStorage,
};
pub use types::{
    HealthStatus, IntroFilter, InviteFilter, Onboarding, Page, StarterProfile, TalentFilter,
};
