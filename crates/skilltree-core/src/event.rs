//! Progression events and a synchronous, in-process event bus.
//!
//! The engine publishes a [`ProgressionEvent`] for every state change. The
//! [`EventBus`] delivers each event to its subscribers immediately, in
//! subscription order, on the caller's thread.
//!
//! # Subscriber Types
//!
//! - **Passive listeners**: read-only, used for UI updates, audio, analytics.
//! - **Reactive handlers**: may return follow-up events. Follow-ups are
//!   queued and delivered after the current event has reached every
//!   subscriber, preserving publish order.

use crate::id::SkillId;
use std::collections::VecDeque;

/// Upper bound on deliveries triggered by a single `publish`, including
/// follow-ups. Guards against handlers that keep answering each other.
pub const MAX_CASCADE: usize = 1024;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Payload announced after a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockNotification {
    pub skill: SkillId,
    /// Cost of the skill.
    pub xp_spent: u32,
    /// `xp - cost` at unlock time. Informational; XP is not deducted.
    pub remaining_xp: u32,
    /// Skills held after the unlock.
    pub unlocked_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionEvent {
    SkillUnlocked(UnlockNotification),
    UnlockUndone {
        skill: SkillId,
        unlocked_count: usize,
    },
    TemporaryExpired {
        skill: SkillId,
    },
    ProgressionReset,
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SkillUnlocked,
    UnlockUndone,
    TemporaryExpired,
    ProgressionReset,
}

impl ProgressionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProgressionEvent::SkillUnlocked(_) => EventKind::SkillUnlocked,
            ProgressionEvent::UnlockUndone { .. } => EventKind::UnlockUndone,
            ProgressionEvent::TemporaryExpired { .. } => EventKind::TemporaryExpired,
            ProgressionEvent::ProgressionReset => EventKind::ProgressionReset,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&ProgressionEvent)>;

/// A reactive handler receives an event and returns follow-up events.
pub type ReactiveHandler = Box<dyn FnMut(&ProgressionEvent) -> Vec<ProgressionEvent>>;

enum Subscriber {
    Passive(PassiveListener),
    Reactive(ReactiveHandler),
}

struct SubscriberEntry {
    /// `None` receives every kind.
    kind: Option<EventKind>,
    subscriber: Subscriber,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.subscriber {
            Subscriber::Passive(_) => "Passive(<fn>)",
            Subscriber::Reactive(_) => "Reactive(<fn>)",
        };
        f.debug_struct("SubscriberEntry")
            .field("kind", &self.kind)
            .field("subscriber", &tag)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Synchronous event bus with a bounded log of delivered events.
#[derive(Debug)]
pub struct EventBus {
    subscribers: Vec<SubscriberEntry>,
    /// Events waiting for delivery during a cascade.
    queue: VecDeque<ProgressionEvent>,
    /// Most recently delivered events, oldest first.
    recent: VecDeque<ProgressionEvent>,
    recent_capacity: usize,
    delivered: u64,
    dropped: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    /// Create a bus keeping the last `recent_capacity` delivered events.
    pub fn new(recent_capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            queue: VecDeque::new(),
            recent: VecDeque::with_capacity(recent_capacity),
            recent_capacity,
            delivered: 0,
            dropped: 0,
        }
    }

    /// Listen to every event.
    pub fn subscribe(&mut self, listener: PassiveListener) {
        self.subscribers.push(SubscriberEntry {
            kind: None,
            subscriber: Subscriber::Passive(listener),
        });
    }

    /// Listen to one kind of event.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.subscribers.push(SubscriberEntry {
            kind: Some(kind),
            subscriber: Subscriber::Passive(listener),
        });
    }

    /// Register a handler whose returned events are published after the
    /// current delivery completes.
    pub fn on_reactive(&mut self, kind: EventKind, handler: ReactiveHandler) {
        self.subscribers.push(SubscriberEntry {
            kind: Some(kind),
            subscriber: Subscriber::Reactive(handler),
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` and any follow-ups it triggers. Returns once the
    /// queue is empty.
    pub fn publish(&mut self, event: ProgressionEvent) {
        self.queue.push_back(event);

        let mut deliveries = 0;
        while let Some(event) = self.queue.pop_front() {
            if deliveries == MAX_CASCADE {
                self.dropped += 1 + self.queue.len() as u64;
                tracing::warn!(
                    dropped = 1 + self.queue.len(),
                    "event cascade limit reached, dropping queued events"
                );
                self.queue.clear();
                break;
            }
            deliveries += 1;

            let kind = event.kind();
            for entry in &mut self.subscribers {
                if entry.kind.is_some_and(|k| k != kind) {
                    continue;
                }
                match &mut entry.subscriber {
                    Subscriber::Passive(listener) => listener(&event),
                    Subscriber::Reactive(handler) => {
                        let follow_ups = handler(&event);
                        self.queue.extend(follow_ups);
                    }
                }
            }

            self.delivered += 1;
            self.remember(event);
        }
    }

    fn remember(&mut self, event: ProgressionEvent) {
        if self.recent_capacity == 0 {
            return;
        }
        if self.recent.len() == self.recent_capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    /// Recently delivered events, oldest first.
    pub fn recent(&self) -> impl ExactSizeIterator<Item = &ProgressionEvent> {
        self.recent.iter()
    }

    /// Total events delivered since creation.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Events discarded by the cascade limit.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn clear_recent(&mut self) {
        self.recent.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn unlocked(name: &str) -> ProgressionEvent {
        ProgressionEvent::SkillUnlocked(UnlockNotification {
            skill: SkillId::new(name),
            xp_spent: 10,
            remaining_xp: 0,
            unlocked_count: 1,
        })
    }

    fn expired(name: &str) -> ProgressionEvent {
        ProgressionEvent::TemporaryExpired {
            skill: SkillId::new(name),
        }
    }

    // -----------------------------------------------------------------------
    // Test 1: Listeners run in subscription order
    // -----------------------------------------------------------------------
    #[test]
    fn listeners_run_in_subscription_order() {
        let mut bus = EventBus::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            bus.subscribe(Box::new(move |_| log.borrow_mut().push(tag)));
        }

        bus.publish(ProgressionEvent::ProgressionReset);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    // -----------------------------------------------------------------------
    // Test 2: Kind filtering
    // -----------------------------------------------------------------------
    #[test]
    fn kind_filter_skips_other_events() {
        let mut bus = EventBus::default();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        bus.on_passive(
            EventKind::TemporaryExpired,
            Box::new(move |_| *c.borrow_mut() += 1),
        );

        bus.publish(unlocked("a"));
        bus.publish(expired("a"));
        bus.publish(ProgressionEvent::ProgressionReset);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.delivered_count(), 3);
    }

    // -----------------------------------------------------------------------
    // Test 3: Re-entrant publishes are queued until the current event is done
    // -----------------------------------------------------------------------
    #[test]
    fn follow_ups_delivered_after_in_flight_event() {
        let mut bus = EventBus::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        bus.on_reactive(
            EventKind::SkillUnlocked,
            Box::new(|event| match event {
                ProgressionEvent::SkillUnlocked(n) => vec![expired(n.skill.as_str())],
                _ => Vec::new(),
            }),
        );
        let l = Rc::clone(&log);
        bus.subscribe(Box::new(move |event| {
            l.borrow_mut().push(event.kind());
        }));

        bus.publish(unlocked("a"));

        // The passive listener sees the unlock before the follow-up even
        // though the reactive handler ran first.
        assert_eq!(
            *log.borrow(),
            vec![EventKind::SkillUnlocked, EventKind::TemporaryExpired]
        );
    }

    #[test]
    fn follow_ups_preserve_publish_order() {
        let mut bus = EventBus::default();
        bus.on_reactive(
            EventKind::ProgressionReset,
            Box::new(|_| vec![expired("x"), expired("y")]),
        );
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        bus.on_passive(
            EventKind::TemporaryExpired,
            Box::new(move |event| {
                if let ProgressionEvent::TemporaryExpired { skill } = event {
                    l.borrow_mut().push(skill.to_string());
                }
            }),
        );

        bus.publish(ProgressionEvent::ProgressionReset);
        assert_eq!(*log.borrow(), vec!["x".to_string(), "y".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Test 4: Runaway cascades are cut off
    // -----------------------------------------------------------------------
    #[test]
    fn cascade_limit_stops_feedback_loops() {
        let mut bus = EventBus::new(4);
        bus.on_reactive(
            EventKind::ProgressionReset,
            Box::new(|_| vec![ProgressionEvent::ProgressionReset]),
        );

        bus.publish(ProgressionEvent::ProgressionReset);

        assert_eq!(bus.delivered_count(), MAX_CASCADE as u64);
        assert_eq!(bus.dropped_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 5: Recent log is bounded
    // -----------------------------------------------------------------------
    #[test]
    fn recent_log_keeps_latest_events() {
        let mut bus = EventBus::new(2);
        bus.publish(unlocked("a"));
        bus.publish(unlocked("b"));
        bus.publish(unlocked("c"));

        let recent: Vec<&ProgressionEvent> = bus.recent().collect();
        assert_eq!(recent, vec![&unlocked("b"), &unlocked("c")]);
    }
}
