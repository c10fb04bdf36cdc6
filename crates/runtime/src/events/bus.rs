//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use mud_core::CombatEvent;

use super::types::{CombatRecord, TickEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Hits, heals, casts and deaths
    Combat,
    /// Effect applications and removals
    Effect,
    /// Tick-loop lifecycle
    Tick,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Combat, Topic::Effect, Topic::Tick];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Combat(CombatRecord),
    Tick(TickEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(record) => match record.event {
                CombatEvent::EffectApplied { .. } | CombatEvent::EffectRemoved { .. } => {
                    Topic::Effect
                }
                _ => Topic::Combat,
            },
            Event::Tick(_) => Topic::Tick,
        }
    }

    /// The wrapped combat event, if any.
    pub fn as_combat(&self) -> Option<&CombatEvent> {
        match self {
            Event::Combat(record) => Some(&record.event),
            Event::Tick(_) => None,
        }
    }
}

struct Channels {
    combat: broadcast::Sender<Event>,
    effect: broadcast::Sender<Event>,
    tick: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks; a subscriber that falls
/// more than the buffer behind observes `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                combat: broadcast::channel(capacity).0,
                effect: broadcast::channel(capacity).0,
                tick: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Combat => &self.channels.combat,
            Topic::Effect => &self.channels.effect,
            Topic::Tick => &self.channels.tick,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use mud_core::{EntityId, RemovalReason, Timestamp};

    use super::*;

    fn removed() -> Event {
        Event::Combat(CombatRecord {
            at: Timestamp(5),
            event: CombatEvent::EffectRemoved {
                target: EntityId(1),
                effect_id: "renew".into(),
                reason: RemovalReason::Expired,
            },
        })
    }

    #[tokio::test]
    async fn events_route_by_topic() {
        let bus = EventBus::with_capacity(4);
        let mut effects = bus.subscribe(Topic::Effect);
        let mut ticks = bus.subscribe(Topic::Tick);

        bus.publish(removed());
        bus.publish(Event::Tick(TickEvent::Started { at: Timestamp(0) }));

        assert_eq!(effects.recv().await.unwrap(), removed());
        assert!(matches!(ticks.recv().await.unwrap(), Event::Tick(TickEvent::Started { .. })));
        assert!(effects.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(removed());
    }
}
