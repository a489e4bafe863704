//! Typed publish/subscribe queue for input events.
//!
//! Subscribers are identified by a caller-chosen [`SubscriberId`] and register
//! per topic, getting a [`Subscription`] handle back. Each subscriber owns a
//! single inbox shared by all of its topics, so draining it yields events in
//! the order they were published.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::MAX_SUBSCRIBERS;

/// Abstract key identifiers. Translating host key codes is the input
/// layer's job.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    /// Jump.
    Up,
    Down,
    Other(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    KeyDown,
    KeyUp,
    MouseClick,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::KeyDown, Topic::KeyUp, Topic::MouseClick];

    fn slot(self) -> usize {
        match self {
            Topic::KeyDown => 0,
            Topic::KeyUp => 1,
            Topic::MouseClick => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    KeyDown(Key),
    KeyUp(Key),
    /// Click position in screen pixels.
    MouseClick { x: u32, y: u32 },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::KeyDown(_) => Topic::KeyDown,
            Event::KeyUp(_) => Topic::KeyUp,
            Event::MouseClick { .. } => Topic::MouseClick,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

/// Handle returned by [`EventBus::subscribe`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub topic: Topic,
    pub subscriber: SubscriberId,
}

#[derive(Debug)]
struct Inbox {
    id: SubscriberId,
    events: Vec<Event>,
}

#[derive(Debug, Default)]
pub struct EventBus {
    topics: [Vec<SubscriberId>; 3],
    inboxes: Vec<Inbox>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` on `topic`. Fails without side effects when the
    /// topic is full or the subscriber is already registered there.
    pub fn subscribe(&mut self, topic: Topic, subscriber: SubscriberId) -> SimResult<Subscription> {
        let subs = &mut self.topics[topic.slot()];
        if subs.contains(&subscriber) {
            return Err(SimError::DuplicateSubscription { topic, subscriber });
        }
        if subs.len() >= MAX_SUBSCRIBERS {
            return Err(SimError::CapacityExceeded {
                what: "event topic",
                capacity: MAX_SUBSCRIBERS,
            });
        }
        subs.push(subscriber);
        if !self.inboxes.iter().any(|i| i.id == subscriber) {
            self.inboxes.push(Inbox { id: subscriber, events: Vec::new() });
        }
        Ok(Subscription { topic, subscriber })
    }

    /// Drop a subscription and anything still queued for it on that topic.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let subs = &mut self.topics[sub.topic.slot()];
        let Some(i) = subs.iter().position(|id| *id == sub.subscriber) else {
            return false;
        };
        subs.remove(i);
        let still_subscribed = self.topics.iter().any(|t| t.contains(&sub.subscriber));
        if still_subscribed {
            if let Some(inbox) = self.inboxes.iter_mut().find(|i| i.id == sub.subscriber) {
                inbox.events.retain(|e| e.topic() != sub.topic);
            }
        } else {
            self.inboxes.retain(|i| i.id != sub.subscriber);
        }
        true
    }

    pub fn publish(&mut self, event: Event) {
        let subs = &self.topics[event.topic().slot()];
        for inbox in self.inboxes.iter_mut().filter(|i| subs.contains(&i.id)) {
            inbox.events.push(event);
        }
    }

    /// Take everything queued for `subscriber` across its topics, oldest first.
    pub fn drain(&mut self, subscriber: SubscriberId) -> Vec<Event> {
        self.inboxes
            .iter_mut()
            .find(|i| i.id == subscriber)
            .map(|i| std::mem::take(&mut i.events))
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics[topic.slot()].len()
    }
}
