//! Crate-wide error type. Every failure is local and recoverable; the
//! operation that reports it leaves existing state untouched.

use thiserror::Error;

use crate::events::{SubscriberId, Topic};

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A bounded container (entity pool, state machine list, topic) is full.
    #[error("{what} is full (capacity {capacity})")]
    CapacityExceeded { what: &'static str, capacity: usize },

    #[error("subscriber {subscriber:?} is already subscribed to {topic:?}")]
    DuplicateSubscription { topic: Topic, subscriber: SubscriberId },

    /// Elapsed or delta time requested from a timer that was never set.
    #[error("timer has not been set")]
    TimerUnset,

    #[error("map layer {layer} has {actual} cells, grid needs {expected}")]
    MapSize { layer: usize, expected: usize, actual: usize },

    #[error("state table has no states")]
    EmptyStateTable,

    #[error("state {state} has no fallback transition")]
    MissingFallback { state: &'static str },

    #[error("state {state} has {count} transitions (max {max})")]
    TooManyTransitions { state: &'static str, count: usize, max: usize },

    #[error("state {state} targets unknown state {target}")]
    UnknownTarget { state: &'static str, target: usize },

    /// Handle refers to a slot that has since been released.
    #[error("stale entity handle")]
    StaleHandle,
}
