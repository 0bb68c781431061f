//! Command orchestration: fetch, apply, persist, broadcast.

use std::sync::Arc;

use serde_json::Value;

use orrery_domain::{apply, parse_envelope, EnvelopeError, Event, Universe, UniverseId};

use crate::broadcast::BroadcastHub;
use crate::infrastructure::ports::{RepoError, UniverseRepo};

/// Hard failures of the orchestration pipeline. Domain rejections are
/// not errors; they come back inside [`CommandOutcome::events`].
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("universe {0} not found")]
    UniverseNotFound(UniverseId),
    #[error(transparent)]
    MalformedEnvelope(#[from] EnvelopeError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct CommandOutcome {
    pub next_state: Universe,
    pub events: Vec<Event>,
}

/// Drives one command through the full pipeline. Stateless between
/// calls; concurrent calls for the same universe are last-writer-wins
/// (single active editor per universe is assumed).
pub struct CommandProcessor {
    repo: Arc<dyn UniverseRepo>,
    hub: Arc<BroadcastHub>,
}

impl CommandProcessor {
    pub fn new(repo: Arc<dyn UniverseRepo>, hub: Arc<BroadcastHub>) -> Self {
        Self { repo, hub }
    }

    /// Process one command envelope against a stored universe.
    ///
    /// The next state is persisted unconditionally, rejections included,
    /// and the original envelope (not the events) is broadcast to
    /// subscribers only after the write completes.
    pub async fn process(
        &self,
        universe_id: &UniverseId,
        envelope: Value,
    ) -> Result<CommandOutcome, ProcessError> {
        let command = parse_envelope(&envelope)?;

        let state = self
            .repo
            .get(universe_id)
            .await?
            .ok_or_else(|| ProcessError::UniverseNotFound(universe_id.clone()))?;

        let (next_state, events) = apply(state, &command);

        self.repo.save(universe_id, &next_state).await?;
        self.hub.broadcast(universe_id, &envelope);

        if let Some(rejection) = events.iter().find(|e| e.is_rejection()) {
            tracing::debug!(universe_id = %universe_id, ?rejection, "Command rejected");
        }

        Ok(CommandOutcome { next_state, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryUniverseRepo;
    use serde_json::json;

    fn processor_with(
        universe: Option<Universe>,
    ) -> (CommandProcessor, Arc<dyn UniverseRepo>, Arc<BroadcastHub>) {
        let mut repo = MemoryUniverseRepo::new();
        if let Some(universe) = universe {
            repo = repo.with_universe(UniverseId::from("u1"), universe);
        }
        let repo: Arc<dyn UniverseRepo> = Arc::new(repo);
        let hub = Arc::new(BroadcastHub::new());
        (
            CommandProcessor::new(repo.clone(), hub.clone()),
            repo,
            hub,
        )
    }

    #[tokio::test]
    async fn missing_universe_short_circuits_without_write_or_broadcast() {
        let (processor, repo, hub) = processor_with(None);
        let id = UniverseId::from("u1");
        let mut sub = hub.subscribe(&id);

        let result = processor.process(&id, json!({"type": "tick", "delta": 1.0})).await;
        assert!(matches!(result, Err(ProcessError::UniverseNotFound(_))));
        assert!(repo.get(&id).await.expect("get").is_none());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn malformed_envelope_is_a_hard_error() {
        let (processor, _repo, _hub) = processor_with(Some(Universe::new()));
        let id = UniverseId::from("u1");

        let result = processor.process(&id, json!({"delta": 1.0})).await;
        assert!(matches!(
            result,
            Err(ProcessError::MalformedEnvelope(EnvelopeError::MissingType))
        ));

        let result = processor.process(&id, json!([1, 2])).await;
        assert!(matches!(
            result,
            Err(ProcessError::MalformedEnvelope(EnvelopeError::NotAnObject))
        ));
    }

    #[tokio::test]
    async fn success_persists_then_broadcasts_the_envelope() {
        let (processor, repo, hub) = processor_with(Some(Universe::new()));
        let id = UniverseId::from("u1");
        let mut sub = hub.subscribe(&id);

        let envelope = json!({"type": "tick", "delta": 2.0});
        let outcome = processor.process(&id, envelope.clone()).await.expect("process");

        assert_eq!(outcome.next_state.time, 2.0);
        assert_eq!(outcome.events, vec![Event::TimeAdvanced { time: 2.0 }]);
        let stored = repo.get(&id).await.expect("get").expect("present");
        assert_eq!(stored.time, 2.0);
        // Subscribers see the original envelope, not the events.
        assert_eq!(sub.recv().await.expect("broadcast"), envelope);
    }

    #[tokio::test]
    async fn domain_rejection_still_persists_and_broadcasts() {
        let (processor, _repo, hub) = processor_with(Some(Universe::new()));
        let id = UniverseId::from("u1");
        let mut sub = hub.subscribe(&id);

        let envelope = json!({"type": "removeBody", "id": "ghost"});
        let outcome = processor.process(&id, envelope.clone()).await.expect("process");

        assert!(outcome.events[0].is_rejection());
        assert_eq!(sub.recv().await.expect("broadcast"), envelope);
    }

    #[tokio::test]
    async fn an_unknown_command_kind_round_trips_as_an_event() {
        let (processor, _repo, _hub) = processor_with(Some(Universe::new()));
        let id = UniverseId::from("u1");

        let outcome = processor
            .process(&id, json!({"type": "warpDrive"}))
            .await
            .expect("process");
        assert_eq!(
            outcome.events,
            vec![Event::UnrecognizedCommand {
                kind: "warpDrive".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn subscribers_observe_two_commands_in_order() {
        let (processor, _repo, hub) = processor_with(Some(Universe::new()));
        let id = UniverseId::from("u1");
        let mut sub = hub.subscribe(&id);

        processor
            .process(&id, json!({"type": "tick", "delta": 1.0}))
            .await
            .expect("first");
        processor
            .process(&id, json!({"type": "tick", "delta": 2.0}))
            .await
            .expect("second");

        assert_eq!(sub.recv().await.expect("first")["delta"], 1.0);
        assert_eq!(sub.recv().await.expect("second")["delta"], 2.0);
    }
}
