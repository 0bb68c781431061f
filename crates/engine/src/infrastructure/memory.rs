//! In-memory universe storage for tests and ephemeral runs.

use async_trait::async_trait;
use dashmap::DashMap;

use orrery_domain::{Universe, UniverseId};

use crate::infrastructure::ports::{RepoError, UniverseRepo};

#[derive(Default)]
pub struct MemoryUniverseRepo {
    universes: DashMap<UniverseId, Universe>,
}

impl MemoryUniverseRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed helper for tests and demo startup.
    pub fn with_universe(self, id: UniverseId, universe: Universe) -> Self {
        self.universes.insert(id, universe);
        self
    }
}

#[async_trait]
impl UniverseRepo for MemoryUniverseRepo {
    async fn get(&self, id: &UniverseId) -> Result<Option<Universe>, RepoError> {
        Ok(self.universes.get(id).map(|entry| entry.clone()))
    }

    async fn save(&self, id: &UniverseId, universe: &Universe) -> Result<(), RepoError> {
        self.universes.insert(id.clone(), universe.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(UniverseId, Universe)>, RepoError> {
        let mut out: Vec<(UniverseId, Universe)> = self
            .universes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(out)
    }

    async fn delete(&self, id: &UniverseId) -> Result<(), RepoError> {
        self.universes.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_get_returns_the_document() {
        let repo = MemoryUniverseRepo::new();
        let id = UniverseId::from("u1");
        let universe = Universe::new();

        repo.save(&id, &universe).await.expect("save");
        assert_eq!(repo.get(&id).await.expect("get"), Some(universe));
        assert!(repo.get(&UniverseId::from("u2")).await.expect("get").is_none());
    }
}
