//! Event stream (§6): one topic per entity kind, plus three synthetic
//! topics (`controller`, `virtualcircuit`, `temps`) that don't map to a
//! single `Collection<T>` but are still part of the exhaustive topic
//! list collaborators subscribe against.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::model::{EntityKind, Id};

/// How many in-flight events a sink may buffer before new events are
/// dropped (§4.6: "dropped-newest per sink after a bounded queue fills").
pub const SINK_QUEUE_DEPTH: usize = 256;

/// One post-image fan-out, as delivered to subscribers (§6: "each event
/// carries `{id, changedFields[], postImage}`").
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub topic: &'static str,
    pub id: Id,
    pub changed_fields: Vec<&'static str>,
    pub post_image: serde_json::Value,
}

impl Event {
    pub fn new(
        topic: &'static str,
        id: Id,
        changed_fields: Vec<&'static str>,
        post_image: serde_json::Value,
    ) -> Self {
        Self {
            topic,
            id,
            changed_fields,
            post_image,
        }
    }

    /// Convenience constructor for the common single-field case, used by
    /// both wire-confirmed decode updates and locally-applied intents.
    pub fn field(kind: EntityKind, id: Id, field: &'static str, value: serde_json::Value) -> Self {
        Self::new(
            kind.topic(),
            id,
            vec![field],
            serde_json::json!({ "id": id, field: value }),
        )
    }

    pub fn circuit(id: Id, is_on: bool) -> Self {
        Self::field(EntityKind::Circuit, id, "isOn", serde_json::json!(is_on))
    }

    /// Synthetic topic: not backed by a `Collection`, emitted by the
    /// config hot-reload watcher (§6).
    pub fn configuration_reloaded() -> Self {
        Self::new("controller", 0, vec!["configurationReloaded"], serde_json::json!({}))
    }

    /// Synthetic topic: emitted once when a persisted root was corrupt
    /// and startup recovered by falling back to defaults (§8 scenario 6).
    pub fn configuration_corrupt(path: &std::path::Path) -> Self {
        Self::new(
            "controller",
            0,
            vec!["configurationCorrupt"],
            serde_json::json!({ "path": path.display().to_string() }),
        )
    }
}

struct Sink {
    tx: mpsc::Sender<Event>,
    overflow: Arc<AtomicU64>,
}

/// Fan-out bus (§4.6): publish is synchronous from the caller's point of
/// view (every sink gets a `try_send` before `publish` returns); a full
/// sink queue drops the new event and bumps that sink's overflow counter
/// rather than applying backpressure to the Change Engine's commit lane.
#[derive(Default)]
pub struct EventBus {
    sinks: std::sync::Mutex<Vec<Sink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            sinks: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber, returning the receiving end and a
    /// shared handle to its overflow counter.
    pub fn subscribe(&self) -> (mpsc::Receiver<Event>, Arc<AtomicU64>) {
        let (tx, rx) = mpsc::channel(SINK_QUEUE_DEPTH);
        let overflow = Arc::new(AtomicU64::new(0));
        self.sinks.lock().unwrap().push(Sink {
            tx,
            overflow: overflow.clone(),
        });
        (rx, overflow)
    }

    pub fn publish(&self, event: Event) {
        let sinks = self.sinks.lock().unwrap();
        for sink in sinks.iter() {
            if sink.tx.try_send(event.clone()).is_err() {
                sink.overflow.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let (mut rx, _overflow) = bus.subscribe();
        bus.publish(Event::circuit(6, true));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "circuit");
        assert_eq!(event.id, 6);
    }

    #[tokio::test]
    async fn full_queue_drops_newest_and_counts_overflow() {
        let bus = EventBus::new();
        let (_rx, overflow) = bus.subscribe();
        for i in 0..(SINK_QUEUE_DEPTH as Id + 5) {
            bus.publish(Event::circuit(i, true));
        }
        assert!(overflow.load(Ordering::Relaxed) >= 5);
    }
}
