use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rand::Rng;
use tokio::task::AbortHandle;

/// Identifier of an armed timer. Non-zero, drawn at random from
/// [1, i32::MAX - 1] and unique among live timers.
pub type TimerId = i32;

/// Collision retries before reserve() gives up. With a 31 bit id space and a
/// realistic number of live timers this cap is never hit.
const MAX_RESERVE_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimerState {
    /// Reserved or sleeping; aborting is still allowed
    Armed,
    /// The fire callback has started; aborting now would cut cleanup short
    Firing,
}

struct TimerEntry {
    state: TimerState,
    /// None between reserve() and bind()
    abort: Option<AbortHandle>,
}

/// In-memory map of live one-shot timers keyed by randomly allocated ids.
///
/// Owned by the timeout manager. All mutation goes through a single mutex so
/// the reserve retry loop, state transitions and release never race each
/// other. The lock is never held across an await.
pub struct TimerRegistry {
    timers: Mutex<HashMap<TimerId, TimerEntry>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TimerId, TimerEntry>> {
        // Registry state is reconstructible from the ledger, a poisoned lock
        // is not worth dying over
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserves a fresh random id with an armed placeholder entry.
    ///
    /// The caller must follow up with bind() once the timer task exists.
    pub fn reserve(&self) -> Result<TimerId, crate::Error> {
        let mut timers = self.lock();

        for _ in 0..MAX_RESERVE_ATTEMPTS {
            let id = rand::thread_rng().gen_range(1..i32::MAX);

            match timers.entry(id) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(TimerEntry {
                        state: TimerState::Armed,
                        abort: None,
                    });

                    return Ok(id);
                }
            }
        }

        Err("Exhausted timer id reservation attempts".into())
    }

    /// Attaches the spawned task's abort handle to a reserved id.
    ///
    /// If the id was already released (a cancel can win between reserve and
    /// bind), the task is aborted on the spot so it can never fire.
    pub fn bind(&self, id: TimerId, abort: AbortHandle) {
        let mut timers = self.lock();

        match timers.get_mut(&id) {
            Some(entry) => entry.abort = Some(abort),
            None => abort.abort(),
        }
    }

    /// Armed -> Firing transition, taken by the timer task when it wakes up.
    ///
    /// Returns false when the id is no longer armed (i.e. it was cancelled),
    /// in which case the callback must not run.
    pub fn begin_fire(&self, id: TimerId) -> bool {
        let mut timers = self.lock();

        match timers.get_mut(&id) {
            Some(entry) if entry.state == TimerState::Armed => {
                entry.state = TimerState::Firing;
                true
            }
            _ => false,
        }
    }

    /// Cancels (if still armed) and forgets a timer.
    ///
    /// No-op for unknown ids, including ids that already fired and cleaned
    /// themselves up. A firing timer is only forgotten, never aborted, so the
    /// fire path can safely release its own id mid-callback.
    pub fn release(&self, id: TimerId) {
        let mut timers = self.lock();

        if let Some(entry) = timers.remove(&id) {
            log::info!("Releasing timer id {}", id);

            if entry.state == TimerState::Armed {
                if let Some(abort) = entry.abort {
                    abort.abort();
                }
            }
        }
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
