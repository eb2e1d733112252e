//! Broadcast cell carrying navigation commands between decoupled parts of a
//! scrolly presentation.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, Weak,
};

use serde_json::Value;
use tracing::warn;

pub mod command;
pub mod error;

pub use command::{ScrollyCommand, TIMESTAMP_FIELD};
pub use error::ChannelError;

type ObserverFn = dyn Fn(Option<&ScrollyCommand>) + Send + Sync;

struct ObserverSlot {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Arc<ObserverFn>,
}

#[derive(Default)]
struct ChannelState {
    current: Option<ScrollyCommand>,
    observers: Vec<ObserverSlot>,
    next_id: u64,
}

/// Latest-value-wins broadcast cell for [`ScrollyCommand`]s.
///
/// The channel holds at most one current command; publishing replaces it and
/// synchronously notifies every registered observer on the calling thread, in
/// subscription order. Handles are cheap to clone and share state. Construct
/// one channel per presentation and pass it to whichever components publish
/// or subscribe.
#[derive(Clone, Default)]
pub struct CommandChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `payload` with the current wall-clock time, make it the
    /// channel's current command, and notify every observer with it before
    /// returning.
    ///
    /// `payload` must be a JSON object; anything else is rejected with
    /// [`ChannelError::InvalidArgument`] and the channel is left untouched.
    pub fn publish(&self, payload: Value) -> Result<(), ChannelError> {
        let fields = match payload {
            Value::Object(fields) => fields,
            other => {
                return Err(ChannelError::InvalidArgument(format!(
                    "command payload must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let command = ScrollyCommand::stamp_now(fields);

        // Snapshot the observer list before dispatching so callbacks are
        // free to subscribe, cancel, or publish reentrantly.
        let snapshot = {
            let mut state = self.lock_state();
            state.current = Some(command.clone());
            state
                .observers
                .iter()
                .map(|slot| (Arc::clone(&slot.active), Arc::clone(&slot.callback)))
                .collect::<Vec<_>>()
        };

        for (active, callback) in snapshot {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            dispatch(&callback, Some(&command));
        }

        Ok(())
    }

    /// Register `observer` for every future publish. It is invoked once
    /// immediately with the current command, or `None` if nothing has been
    /// published yet.
    ///
    /// Dropping the returned [`Subscription`] without calling
    /// [`Subscription::cancel`] leaves the observer registered.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(Option<&ScrollyCommand>) + Send + Sync + 'static,
    {
        let callback: Arc<ObserverFn> = Arc::new(observer);
        let active = Arc::new(AtomicBool::new(true));

        let (id, current) = {
            let mut state = self.lock_state();
            let id = state.next_id;
            state.next_id += 1;
            state.observers.push(ObserverSlot {
                id,
                active: Arc::clone(&active),
                callback: Arc::clone(&callback),
            });
            (id, state.current.clone())
        };

        dispatch(&callback, current.as_ref());

        Subscription {
            id,
            active,
            state: Arc::downgrade(&self.state),
        }
    }

    /// The most recently published command, if any.
    pub fn current(&self) -> Option<ScrollyCommand> {
        self.lock_state().current.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.lock_state().observers.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, ChannelState> {
        // The lock is never held across observer callbacks, so a poisoned
        // registry is still structurally sound.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one registered observer. [`cancel`](Self::cancel) removes it;
/// after `cancel` returns the observer sees no later publishes.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    state: Weak<Mutex<ChannelState>>,
}

impl Subscription {
    pub fn cancel(self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.observers.retain(|slot| slot.id != self.id);
        }
    }
}

fn dispatch(callback: &Arc<ObserverFn>, value: Option<&ScrollyCommand>) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(value)));
    if outcome.is_err() {
        warn!("observer panicked during command notification");
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
