//! SQLite-backed universe document storage.
//!
//! Documents are stored whole as JSON, one row per universe. Reads and
//! writes always move the full document; there is no partial update path.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use orrery_domain::{Universe, UniverseId};

use crate::infrastructure::ports::{ClockPort, RepoError, UniverseRepo};

pub struct SqliteUniverseRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteUniverseRepo {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("universes", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS universes (
                id TEXT PRIMARY KEY,
                document_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("universes", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl UniverseRepo for SqliteUniverseRepo {
    async fn get(&self, id: &UniverseId) -> Result<Option<Universe>, RepoError> {
        let row = sqlx::query("SELECT document_json FROM universes WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("universes", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("document_json");
                let universe = serde_json::from_str(&json)
                    .map_err(|e| RepoError::Serialization(e.to_string()))?;
                Ok(Some(universe))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, id: &UniverseId, universe: &Universe) -> Result<(), RepoError> {
        let json = serde_json::to_string(universe)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO universes (id, document_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                document_json = excluded.document_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("universes", e))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<(UniverseId, Universe)>, RepoError> {
        let rows = sqlx::query("SELECT id, document_json FROM universes ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("universes", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let json: String = row.get("document_json");
            let universe = serde_json::from_str(&json)
                .map_err(|e| RepoError::Serialization(e.to_string()))?;
            out.push((UniverseId::from(id), universe));
        }
        Ok(out)
    }

    async fn delete(&self, id: &UniverseId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM universes WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("universes", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::TimeZone;
    use chrono::Utc;
    use orrery_domain::{Body, BodyKind};

    fn fixed_now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    async fn temp_repo() -> (SqliteUniverseRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("universes.db");
        let repo = SqliteUniverseRepo::new(
            path.to_str().expect("utf-8 path"),
            Arc::new(FixedClock(fixed_now())),
        )
        .await
        .expect("create repo");
        (repo, dir)
    }

    #[tokio::test]
    async fn document_round_trips_through_sqlite() {
        let (repo, _dir) = temp_repo().await;
        let id = UniverseId::from("sol-system");

        assert!(repo.get(&id).await.expect("get").is_none());

        let mut universe = Universe::new();
        let sol = Body::new("sol", BodyKind::Star, "Sol");
        universe.root_bodies.push(sol.id.clone());
        universe.bodies.insert(sol.id.clone(), sol);
        universe.time = 12.5;

        repo.save(&id, &universe).await.expect("save");
        let loaded = repo.get(&id).await.expect("get").expect("present");
        assert_eq!(loaded, universe);
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let (repo, _dir) = temp_repo().await;
        let id = UniverseId::from("u1");

        let mut universe = Universe::new();
        repo.save(&id, &universe).await.expect("first save");
        universe.time = 99.0;
        repo.save(&id, &universe).await.expect("second save");

        let loaded = repo.get(&id).await.expect("get").expect("present");
        assert_eq!(loaded.time, 99.0);
        assert_eq!(repo.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn save_stamps_updated_at_from_the_clock() {
        let (repo, _dir) = temp_repo().await;
        let id = UniverseId::from("u1");
        repo.save(&id, &Universe::new()).await.expect("save");

        let row = sqlx::query("SELECT updated_at FROM universes WHERE id = ?")
            .bind(id.as_str())
            .fetch_one(&repo.pool)
            .await
            .expect("row");
        let stamped: String = row.get("updated_at");
        assert_eq!(stamped, fixed_now().to_rfc3339());
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (repo, _dir) = temp_repo().await;
        let id = UniverseId::from("u1");
        repo.save(&id, &Universe::new()).await.expect("save");
        repo.delete(&id).await.expect("delete");
        assert!(repo.get(&id).await.expect("get").is_none());
    }
}
