//! Core notifications for the presentation layer
//!
//! Components append to their own `EventQueue` while resolving. The run
//! drains those queues at safe points and forwards everything through the
//! `EventBus`. Delivery is fire-and-forget: observers cannot fail a publish.

use serde::{Deserialize, Serialize};

use crate::archetype::EngineKind;
use crate::core::types::{Seconds, Side, UnitId};
use crate::run::LevelUpChoice;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreEvent {
    // Run lifecycle
    RunStarted { starting_unit: String },
    RunEnded { victory: bool, level: u32 },
    RewardsAvailable { level: u32, gold: u32 },
    LevelUpAvailable { level: u32, choices: Vec<LevelUpChoice> },

    // Battle lifecycle
    TurnStarted { side: Side, turn: u32 },
    TurnTimedOut { turn: u32 },
    CombatEnded { victory: bool, turns: u32 },

    // Actions
    DamageDealt {
        source: UnitId,
        target: UnitId,
        amount: f32,
        ability: Option<String>,
    },
    UnitHealed { source: UnitId, target: UnitId, amount: f32 },
    UnitDied { unit: UnitId, side: Side },
    AbilityUsed {
        caster: UnitId,
        ability: String,
        target: Option<UnitId>,
    },

    // Resources
    ResourceChanged {
        unit: UnitId,
        kind: EngineKind,
        current: u32,
        max: Option<u32>,
    },
    TauntStarted { unit: UnitId, duration: Seconds },
    Overloaded { unit: UnitId, stun: Seconds, backlash: f32 },
}

/// Pending events of one component
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<CoreEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn peek(&self) -> &[CoreEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Receives every published event
pub trait EventObserver: Send {
    fn on_event(&mut self, event: &CoreEvent);
}

impl<F> EventObserver for F
where
    F: FnMut(&CoreEvent) + Send,
{
    fn on_event(&mut self, event: &CoreEvent) {
        self(event)
    }
}

/// Handle returned by `EventBus::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

/// Observer registry
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(SubscriptionId, Box<dyn EventObserver>)>,
    next_id: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl EventObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn publish(&mut self, event: &CoreEvent) {
        for (_, observer) in &mut self.observers {
            observer.on_event(event);
        }
    }

    pub fn publish_all(&mut self, events: impl IntoIterator<Item = CoreEvent>) {
        for event in events {
            self.publish(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.observers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = EventQueue::new();
        queue.push(CoreEvent::TurnTimedOut { turn: 1 });
        queue.push(CoreEvent::TurnTimedOut { turn: 2 });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unsubscribed_observer_stops_receiving() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let sink = Arc::clone(&seen);
        let id = bus.subscribe(move |event: &CoreEvent| sink.lock().unwrap().push(event.clone()));
        bus.publish(&CoreEvent::TurnTimedOut { turn: 1 });

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&CoreEvent::TurnTimedOut { turn: 2 });

        assert_eq!(*seen.lock().unwrap(), vec![CoreEvent::TurnTimedOut { turn: 1 }]);
    }

    #[test]
    fn test_publish_without_observers_is_noop() {
        let mut bus = EventBus::new();
        bus.publish(&CoreEvent::RunEnded {
            victory: false,
            level: 3,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
