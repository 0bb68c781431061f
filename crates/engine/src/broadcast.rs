//! Broadcast gateway: per-universe fan-out of command envelopes.
//!
//! Delivery is live-only and at-most-once: subscribers receive every
//! envelope broadcast while their subscription exists, in broadcast
//! order, and nothing from before they subscribed. Envelopes travel
//! through unbounded channels, so a subscriber dropping mid-broadcast
//! never invalidates the iteration.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use orrery_domain::UniverseId;

/// Registered subscribers, per universe, in registration order.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: RwLock<HashMap<UniverseId, Vec<(Uuid, mpsc::UnboundedSender<Value>)>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for one universe. The returned guard
    /// unsubscribes on drop.
    pub fn subscribe(self: &Arc<Self>, universe_id: &UniverseId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        {
            let mut subscribers = self.subscribers.write().expect("subscriber lock poisoned");
            subscribers
                .entry(universe_id.clone())
                .or_default()
                .push((id, tx));
        }
        tracing::debug!(universe_id = %universe_id, subscription_id = %id, "Subscriber registered");
        Subscription {
            hub: self.clone(),
            universe_id: universe_id.clone(),
            id,
            receiver: rx,
        }
    }

    /// Remove one subscriber. Unknown ids are ignored, so dropping a
    /// guard after an explicit unsubscribe is harmless.
    fn unsubscribe(&self, universe_id: &UniverseId, id: Uuid) {
        let mut subscribers = self.subscribers.write().expect("subscriber lock poisoned");
        if let Some(entries) = subscribers.get_mut(universe_id) {
            entries.retain(|(sub_id, _)| *sub_id != id);
            if entries.is_empty() {
                subscribers.remove(universe_id);
            }
        }
    }

    /// Deliver one envelope to every live subscriber of the universe, in
    /// registration order. Closed channels are skipped.
    pub fn broadcast(&self, universe_id: &UniverseId, envelope: &Value) {
        let subscribers = self.subscribers.read().expect("subscriber lock poisoned");
        let Some(entries) = subscribers.get(universe_id) else {
            return;
        };
        for (id, tx) in entries {
            if tx.send(envelope.clone()).is_err() {
                tracing::warn!(
                    universe_id = %universe_id,
                    subscription_id = %id,
                    "Skipping closed broadcast channel"
                );
            }
        }
    }

    pub fn subscriber_count(&self, universe_id: &UniverseId) -> usize {
        self.subscribers
            .read()
            .expect("subscriber lock poisoned")
            .get(universe_id)
            .map_or(0, Vec::len)
    }
}

/// A live subscription to one universe's broadcasts. Dropping it (or
/// calling [`Subscription::unsubscribe`]) removes the hub entry.
pub struct Subscription {
    hub: Arc<BroadcastHub>,
    universe_id: UniverseId,
    id: Uuid,
    receiver: mpsc::UnboundedReceiver<Value>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Value> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.universe_id, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hub() -> Arc<BroadcastHub> {
        Arc::new(BroadcastHub::new())
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber() {
        let hub = hub();
        let id = UniverseId::from("u1");
        let mut a = hub.subscribe(&id);
        let mut b = hub.subscribe(&id);

        hub.broadcast(&id, &json!({"type": "tick", "delta": 1.0}));

        assert_eq!(a.recv().await.expect("a")["type"], "tick");
        assert_eq!(b.recv().await.expect("b")["type"], "tick");
    }

    #[tokio::test]
    async fn broadcasts_are_scoped_to_their_universe() {
        let hub = hub();
        let mut other = hub.subscribe(&UniverseId::from("u2"));

        hub.broadcast(&UniverseId::from("u1"), &json!({"type": "tick"}));
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_broadcasts_in_order() {
        let hub = hub();
        let id = UniverseId::from("u1");
        let mut sub = hub.subscribe(&id);

        hub.broadcast(&id, &json!({"seq": 1}));
        hub.broadcast(&id, &json!({"seq": 2}));

        assert_eq!(sub.recv().await.expect("first")["seq"], 1);
        assert_eq!(sub.recv().await.expect("second")["seq"], 2);
    }

    #[tokio::test]
    async fn drop_unsubscribes_and_is_idempotent() {
        let hub = hub();
        let id = UniverseId::from("u1");

        let sub = hub.subscribe(&id);
        assert_eq!(hub.subscriber_count(&id), 1);
        sub.unsubscribe();
        assert_eq!(hub.subscriber_count(&id), 0);

        // A second removal of the same entry is a no-op.
        hub.unsubscribe(&id, Uuid::new_v4());
        assert_eq!(hub.subscriber_count(&id), 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_the_rest() {
        let hub = hub();
        let id = UniverseId::from("u1");

        let first = hub.subscribe(&id);
        let mut second = hub.subscribe(&id);
        drop(first);

        hub.broadcast(&id, &json!({"type": "tick"}));
        assert_eq!(second.recv().await.expect("second")["type"], "tick");
    }
}
