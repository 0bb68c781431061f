//! Session lifecycle for the tool transport.
//!
//! Sessions are in-memory only. Each session owns a notification outbox
//! whose sender is swapped whenever the client (re)opens its event
//! stream; notifications raised while no stream is attached go to a
//! closed channel and are dropped (live-only delivery).

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use orrery_domain::UniverseId;

use crate::broadcast::BroadcastHub;
use crate::infrastructure::ports::UniverseRepo;
use crate::mcp::protocol::notification;
use crate::use_cases::CommandProcessor;

pub struct McpSession {
    pub id: String,
    notify: RwLock<mpsc::UnboundedSender<Value>>,
    /// One broadcast forwarder task per watched universe.
    forwarders: DashMap<UniverseId, tokio::task::JoinHandle<()>>,
}

impl McpSession {
    fn new() -> Self {
        // Sender with no receiver: notifications are dropped until a
        // stream attaches.
        let (tx, _) = mpsc::unbounded_channel();
        Self {
            id: Uuid::new_v4().to_string(),
            notify: RwLock::new(tx),
            forwarders: DashMap::new(),
        }
    }

    /// Queue one JSON-RPC message for the session's event stream.
    pub async fn push(&self, message: Value) {
        let _ = self.notify.read().await.send(message);
    }

    /// Open a fresh outbox and hand back its receiving end. Any previous
    /// stream's sender is replaced, ending that stream.
    pub async fn attach_stream(&self) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.notify.write().await = tx;
        rx
    }

    fn shutdown(&self) {
        for entry in self.forwarders.iter() {
            entry.value().abort();
        }
        self.forwarders.clear();
    }
}

pub struct SessionManager {
    sessions: DashMap<String, Arc<McpSession>>,
    pub repo: Arc<dyn UniverseRepo>,
    hub: Arc<BroadcastHub>,
    pub processor: Arc<CommandProcessor>,
}

impl SessionManager {
    pub fn new(
        repo: Arc<dyn UniverseRepo>,
        hub: Arc<BroadcastHub>,
        processor: Arc<CommandProcessor>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            repo,
            hub,
            processor,
        }
    }

    /// Mint and register a new session. Terminated ids are never reused:
    /// every call produces a fresh uuid.
    pub fn create(&self) -> Arc<McpSession> {
        let session = Arc::new(McpSession::new());
        self.sessions.insert(session.id.clone(), session.clone());
        tracing::info!(session_id = %session.id, "MCP session created");
        session
    }

    pub fn get(&self, id: &str) -> Option<Arc<McpSession>> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove the session and stop its forwarders. Returns false for
    /// unknown (or already terminated) ids.
    pub fn terminate(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.shutdown();
                tracing::info!(session_id = %id, "MCP session terminated");
                true
            }
            None => false,
        }
    }

    /// Ensure the session forwards broadcasts for this universe to its
    /// event stream. Called by every tool that touches a universe; the
    /// first touch subscribes, later touches are no-ops.
    pub fn watch(&self, session: &Arc<McpSession>, universe_id: &UniverseId) {
        // Entry keeps check-and-spawn atomic: concurrent tool calls for
        // the same universe must not race into two forwarders.
        session
            .forwarders
            .entry(universe_id.clone())
            .or_insert_with(|| {
                let mut subscription = self.hub.subscribe(universe_id);
                let forwarded_id = universe_id.clone();
                let weak_session = Arc::downgrade(session);
                tracing::debug!(
                    session_id = %session.id,
                    universe_id = %universe_id,
                    "Session watching universe"
                );
                tokio::spawn(async move {
                    while let Some(envelope) = subscription.recv().await {
                        let Some(session) = weak_session.upgrade() else { break };
                        session
                            .push(notification(
                                "notifications/universe/command",
                                serde_json::json!({
                                    "universeId": forwarded_id.as_str(),
                                    "command": envelope,
                                }),
                            ))
                            .await;
                    }
                })
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryUniverseRepo;
    use orrery_domain::Universe;
    use serde_json::json;

    fn manager() -> SessionManager {
        let repo: Arc<dyn UniverseRepo> = Arc::new(
            MemoryUniverseRepo::new().with_universe(UniverseId::from("u1"), Universe::new()),
        );
        let hub = Arc::new(BroadcastHub::new());
        let processor = Arc::new(CommandProcessor::new(repo.clone(), hub.clone()));
        SessionManager::new(repo, hub, processor)
    }

    #[tokio::test]
    async fn create_then_get_then_terminate() {
        let manager = manager();
        let session = manager.create();
        let id = session.id.clone();

        assert!(manager.get(&id).is_some());
        assert!(manager.terminate(&id));
        assert!(manager.get(&id).is_none());
        // Terminate-then-reuse of the same id fails.
        assert!(!manager.terminate(&id));
    }

    #[tokio::test]
    async fn re_initializing_mints_a_distinct_id() {
        let manager = manager();
        let first = manager.create();
        manager.terminate(&first.id);
        let second = manager.create();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn watched_universe_broadcasts_arrive_as_notifications() {
        let manager = manager();
        let session = manager.create();
        let mut stream = session.attach_stream().await;
        let universe_id = UniverseId::from("u1");

        manager.watch(&session, &universe_id);
        // Watching twice must not duplicate deliveries.
        manager.watch(&session, &universe_id);

        manager
            .processor
            .process(&universe_id, json!({"type": "tick", "delta": 1.0}))
            .await
            .expect("process");

        let message = stream.recv().await.expect("notification");
        assert_eq!(message["method"], "notifications/universe/command");
        assert_eq!(message["params"]["universeId"], "u1");
        assert_eq!(message["params"]["command"]["type"], "tick");
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_watch_calls_register_a_single_forwarder() {
        let manager = Arc::new(manager());
        let session = manager.create();
        let mut stream = session.attach_stream().await;
        let universe_id = UniverseId::from("u1");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                let session = session.clone();
                let universe_id = universe_id.clone();
                tokio::spawn(async move { manager.watch(&session, &universe_id) })
            })
            .collect();
        for task in tasks {
            task.await.expect("watch task");
        }

        assert_eq!(session.forwarders.len(), 1);
        assert_eq!(manager.hub.subscriber_count(&universe_id), 1);

        manager
            .processor
            .process(&universe_id, json!({"type": "tick", "delta": 1.0}))
            .await
            .expect("process");
        let message = stream.recv().await.expect("notification");
        assert_eq!(message["method"], "notifications/universe/command");
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn notifications_before_a_stream_attaches_are_dropped() {
        let manager = manager();
        let session = manager.create();
        let universe_id = UniverseId::from("u1");
        manager.watch(&session, &universe_id);

        manager
            .processor
            .process(&universe_id, json!({"type": "tick", "delta": 1.0}))
            .await
            .expect("process");
        // Give the forwarder a chance to run before attaching.
        tokio::task::yield_now().await;

        let mut stream = session.attach_stream().await;
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn terminate_stops_forwarding() {
        let manager = manager();
        let session = manager.create();
        let mut stream = session.attach_stream().await;
        let universe_id = UniverseId::from("u1");
        manager.watch(&session, &universe_id);

        manager.terminate(&session.id);
        // Let the aborted forwarder unwind and drop its subscription.
        tokio::task::yield_now().await;

        manager
            .processor
            .process(&universe_id, json!({"type": "tick", "delta": 1.0}))
            .await
            .expect("process");
        tokio::task::yield_now().await;
        assert!(stream.try_recv().is_err());
    }
}
