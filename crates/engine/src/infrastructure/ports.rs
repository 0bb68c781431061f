//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine; everything else is
//! concrete types. Ports exist for:
//! - Universe document storage (could swap SQLite -> Postgres)
//! - Clock (for testing)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use orrery_domain::{Universe, UniverseId};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub fn database(context: &str, e: impl std::fmt::Display) -> Self {
        RepoError::Database(format!("{context}: {e}"))
    }
}

/// Storage for universe documents, keyed by universe id. Documents are
/// opaque to the store; validation lives in the domain crate.
#[async_trait]
pub trait UniverseRepo: Send + Sync {
    async fn get(&self, id: &UniverseId) -> Result<Option<Universe>, RepoError>;

    /// Upsert the full document under the given id.
    async fn save(&self, id: &UniverseId, universe: &Universe) -> Result<(), RepoError>;

    async fn list(&self) -> Result<Vec<(UniverseId, Universe)>, RepoError>;

    async fn delete(&self, id: &UniverseId) -> Result<(), RepoError>;
}

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
