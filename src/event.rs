//! External events and the bounded queues that carry them.
//!
//! Events come from outside the stepped world, typically from another thread
//! such as a [`Timer`](crate::source::Timer). An [`EventQueue`] is a bounded,
//! thread-safe hand-off; when it is full a producer either blocks until the
//! engine drains an event or drops the new event, depending on [`OnFull`].
//!
//! A [`Synchronizer`] binds an inbound queue to a port. Each step the engine
//! takes at most one event from every synchronizer and injects its payload
//! into the target port, where it reads like any other update.

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{SimError, SimResult};
use crate::types::{PortId, SimTime};
use crate::value::Value;

/// A timestamped external event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Time of the event in the producer's clock, in milliseconds
    pub time: SimTime,
    /// The value to inject into the target port
    pub payload: Value,
}

impl Event {
    pub fn new(time: SimTime, payload: impl Into<Value>) -> Self {
        Self {
            time,
            payload: payload.into(),
        }
    }
}

/// What a producer does when the queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFull {
    /// Wait until space frees up.
    #[default]
    Block,
    /// Discard the new event.
    Drop,
}

/// Which way events flow through a queue, seen from the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueDirection {
    #[default]
    In,
    Out,
}

/// Result of a successful push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    Dropped,
}

#[derive(Debug)]
struct QueueState {
    events: VecDeque<Event>,
    on_full: OnFull,
    closed: bool,
    pushed: u64,
    popped: u64,
    dropped: u64,
}

#[derive(Debug)]
struct Shared {
    name: String,
    capacity: usize,
    direction: QueueDirection,
    state: Mutex<QueueState>,
    not_full: Condvar,
}

/// A named, bounded, multi-producer event queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Debug)]
pub struct EventQueue {
    shared: Arc<Shared>,
}

impl EventQueue {
    /// Creates an inbound queue holding at most `capacity` events (minimum 1).
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_direction(name, capacity, QueueDirection::In)
    }

    pub fn with_direction(name: impl Into<String>, capacity: usize, direction: QueueDirection) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                capacity: capacity.max(1),
                direction,
                state: Mutex::new(QueueState {
                    events: VecDeque::with_capacity(capacity.max(1)),
                    on_full: OnFull::Block,
                    closed: false,
                    pushed: 0,
                    popped: 0,
                    dropped: 0,
                }),
                not_full: Condvar::new(),
            }),
        }
    }

    /// Sets the overflow policy.
    pub fn with_on_full(self, policy: OnFull) -> Self {
        self.set_on_full(policy);
        self
    }

    pub fn set_on_full(&self, policy: OnFull) {
        self.shared.state.lock().on_full = policy;
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn direction(&self) -> QueueDirection {
        self.shared.direction
    }

    pub fn on_full(&self) -> OnFull {
        self.shared.state.lock().on_full
    }

    /// A producer handle for another thread.
    pub fn sender(&self) -> EventSender {
        EventSender {
            queue: self.clone(),
        }
    }

    /// Pushes an event, honoring the overflow policy.
    ///
    /// Fails with `QueueClosed` once the queue is closed, including while a
    /// blocked producer is waiting.
    pub fn push(&self, event: Event) -> SimResult<PushOutcome> {
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(SimError::QueueClosed(self.shared.name.clone()));
            }
            if state.events.len() < self.shared.capacity {
                state.events.push_back(event);
                state.pushed += 1;
                return Ok(PushOutcome::Queued);
            }
            match state.on_full {
                OnFull::Drop => {
                    state.dropped += 1;
                    tracing::warn!(queue = %self.shared.name, time = event.time, "queue full, event dropped");
                    return Ok(PushOutcome::Dropped);
                }
                OnFull::Block => self.shared.not_full.wait(&mut state),
            }
        }
    }

    /// Takes the oldest event, if any.
    pub fn try_pop(&self) -> Option<Event> {
        let mut state = self.shared.state.lock();
        let event = state.events.pop_front();
        if event.is_some() {
            state.popped += 1;
            self.shared.not_full.notify_one();
        }
        event
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the queue and wakes blocked producers. Pending events stay
    /// available to `try_pop`.
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of events discarded by the `Drop` policy.
    pub fn dropped(&self) -> u64 {
        self.shared.state.lock().dropped
    }

    pub fn export_stats(&self) -> serde_json::Value {
        let state = self.shared.state.lock();
        serde_json::json!({
            "name": self.shared.name,
            "capacity": self.shared.capacity,
            "pending": state.events.len(),
            "pushed": state.pushed,
            "popped": state.popped,
            "dropped": state.dropped,
            "closed": state.closed,
        })
    }
}

/// Producer side of an [`EventQueue`].
#[derive(Clone, Debug)]
pub struct EventSender {
    queue: EventQueue,
}

impl EventSender {
    pub fn send(&self, event: Event) -> SimResult<PushOutcome> {
        self.queue.push(event)
    }

    pub fn queue_name(&self) -> &str {
        self.queue.name()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

/// Adapts an inbound queue into writes on one port.
#[derive(Debug)]
pub(crate) struct Synchronizer {
    pub(crate) queue: EventQueue,
    pub(crate) target: PortId,
    pub(crate) path: String,
}

impl Synchronizer {
    /// The event to inject this step, if any.
    pub(crate) fn next(&self) -> Option<Event> {
        self.queue.try_pop()
    }
}
