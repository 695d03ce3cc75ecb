//! A synchronous, in-process publish/subscribe event bus.
//!
//! Every `emit` call delivers to matching subscribers immediately, in
//! subscription order, before returning. Subscriptions are snapshotted out
//! of the bus before dispatch, so a listener that calls [`EventBus::on`],
//! [`EventBus::off`], or emits another event from within its callback never
//! observes or corrupts the in-flight subscriber list -- it only affects
//! events dispatched afterward.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use sim_ecs::prelude::EntityId;
use tracing::{trace, warn};

use crate::event::EventKind;

pub type ListenerId = u64;

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventBusConfig {
    pub history_enabled: bool,
    pub history_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            history_enabled: false,
            history_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EventBusStats {
    pub emitted: u64,
    pub dispatches: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub event: EventKind,
    pub timestamp: u64,
    pub sequence: u64,
}

struct Subscription {
    id: ListenerId,
    /// `None` means "every event" (an `onAll` subscription).
    event_name: Option<String>,
    once: bool,
    callback: Box<dyn FnMut(&EventKind, u64)>,
}

pub struct EventBus {
    config: EventBusConfig,
    next_listener_id: ListenerId,
    subscriptions: Vec<Subscription>,
    pending: VecDeque<EventKind>,
    processing: bool,
    history: VecDeque<HistoryEntry>,
    stats: EventBusStats,
    timestamp: u64,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            next_listener_id: 1,
            subscriptions: Vec::new(),
            pending: VecDeque::new(),
            processing: false,
            history: VecDeque::new(),
            stats: EventBusStats::default(),
            timestamp: 0,
        }
    }

    /// Set the simulation clock value attached to every event emitted from
    /// now on, until changed again. The tick loop calls this once per tick.
    pub fn set_time(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    pub fn on(
        &mut self,
        event_name: impl Into<String>,
        callback: impl FnMut(&EventKind, u64) + 'static,
    ) -> ListenerId {
        self.subscribe(Some(event_name.into()), false, callback)
    }

    pub fn once(
        &mut self,
        event_name: impl Into<String>,
        callback: impl FnMut(&EventKind, u64) + 'static,
    ) -> ListenerId {
        self.subscribe(Some(event_name.into()), true, callback)
    }

    pub fn on_all(&mut self, callback: impl FnMut(&EventKind, u64) + 'static) -> ListenerId {
        self.subscribe(None, false, callback)
    }

    fn subscribe(
        &mut self,
        event_name: Option<String>,
        once: bool,
        callback: impl FnMut(&EventKind, u64) + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.subscriptions.push(Subscription {
            id,
            event_name,
            once,
            callback: Box::new(callback),
        });
        id
    }

    /// Unsubscribe a listener previously returned by `on`/`once`/`on_all`.
    /// Returns `false` if no such listener exists.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn clear_listeners(&mut self) {
        self.subscriptions.clear();
    }

    /// Queue `event` for dispatch. If called from within a listener's
    /// callback (reentrant emit), the event is queued and drained by the
    /// outermost `emit` call after the current dispatch finishes, rather
    /// than recursing.
    pub fn emit(&mut self, event: EventKind) {
        self.stats.emitted += 1;
        self.pending.push_back(event);
        if self.processing {
            return;
        }
        self.processing = true;
        while let Some(event) = self.pending.pop_front() {
            self.dispatch(event);
        }
        self.processing = false;
    }

    fn dispatch(&mut self, event: EventKind) {
        self.stats.dispatches += 1;
        if self.config.history_enabled {
            if self.history.len() >= self.config.history_capacity {
                self.history.pop_front();
            }
            self.history.push_back(HistoryEntry {
                event: event.clone(),
                timestamp: self.timestamp,
                sequence: self.stats.dispatches,
            });
        }

        let name = event.name().to_string();
        trace!(event = %name, timestamp = self.timestamp, "dispatching event");

        // Snapshot subscriptions out so listener-side on/off/emit calls
        // can't alias this loop's iteration.
        let mut subs = std::mem::take(&mut self.subscriptions);
        let mut fired_once = Vec::new();
        let timestamp = self.timestamp;

        // Type-specific listeners fire before onAll listeners, regardless
        // of registration order.
        for sub in subs.iter_mut().filter(|s| s.event_name.is_some()) {
            if sub.event_name.as_deref() == Some(name.as_str()) {
                Self::invoke(sub, &event, timestamp);
                if sub.once {
                    fired_once.push(sub.id);
                }
            }
        }
        for sub in subs.iter_mut().filter(|s| s.event_name.is_none()) {
            Self::invoke(sub, &event, timestamp);
            if sub.once {
                fired_once.push(sub.id);
            }
        }

        if !fired_once.is_empty() {
            subs.retain(|s| !fired_once.contains(&s.id));
        }
        // Merge back listeners added during dispatch (subscribe() pushed
        // into self.subscriptions, which is currently empty) ahead of the
        // restored set so newly added ones aren't lost.
        let added_during_dispatch = std::mem::take(&mut self.subscriptions);
        subs.extend(added_during_dispatch);
        self.subscriptions = subs;
    }

    /// Run a single listener, catching a panic so one misbehaving callback
    /// can't abort the rest of dispatch.
    fn invoke(sub: &mut Subscription, event: &EventKind, timestamp: u64) {
        let callback = &mut sub.callback;
        let result = panic::catch_unwind(AssertUnwindSafe(|| callback(event, timestamp)));
        if let Err(payload) = result {
            warn!(
                listener = sub.id,
                event = %event.name(),
                error = %panic_payload_to_string(&payload),
                "event listener panicked; dispatch continues"
            );
        }
    }

    pub fn set_history_enabled(&mut self, enabled: bool) {
        self.config.history_enabled = enabled;
        if !enabled {
            self.history.clear();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn events_by_type(&self, name: &str) -> Vec<&HistoryEntry> {
        self.history.iter().filter(|h| h.event.name() == name).collect()
    }

    pub fn events_by_entity(&self, entity: EntityId) -> Vec<&HistoryEntry> {
        self.history
            .iter()
            .filter(|h| h.event.primary_entity() == Some(entity))
            .collect()
    }

    pub fn stats(&self) -> EventBusStats {
        self.stats
    }

    /// Re-dispatch recorded history to current subscribers, with timestamps
    /// compressed or stretched relative to the first recorded event by
    /// `speed` (2.0 replays twice as fast, 0.5 half as fast). Calls
    /// `on_complete` once after the last event has been dispatched (or
    /// immediately, if there is no history to replay).
    pub fn replay(&mut self, speed: f64, on_complete: impl FnOnce()) {
        let speed = if speed <= 0.0 { 1.0 } else { speed };
        let entries: Vec<(EventKind, u64)> = match self.history.front() {
            Some(first) => {
                let base = first.timestamp;
                self.history
                    .iter()
                    .map(|h| {
                        let elapsed = h.timestamp.saturating_sub(base) as f64;
                        (h.event.clone(), base + (elapsed / speed) as u64)
                    })
                    .collect()
            }
            None => Vec::new(),
        };
        for (event, timestamp) in entries {
            self.set_time(timestamp);
            self.emit(event);
        }
        on_complete();
    }
}
