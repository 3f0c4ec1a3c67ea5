//! Progress controller
//!
//! A thread-safe publish/subscribe counter tracking bytes processed
//! against a total. Every update notifies the registered listeners
//! synchronously, and a trailing window of samples is kept to derive
//! throughput and time remaining.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

/// Default trailing window for speed estimation
pub const DEFAULT_SPEED_WINDOW: Duration = Duration::from_secs(3);

/// Point-in-time view of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Units processed so far
    pub progress: u64,
    /// Total units expected
    pub total: u64,
}

impl ProgressSnapshot {
    /// Completion percentage (0.0 when the total is unknown)
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.progress as f64 / self.total as f64) * 100.0
        }
    }
}

/// How to move the progress value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Set to an absolute value
    To(u64),
    /// Add to the current value
    By(u64),
}

/// Identifies a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

#[derive(Debug)]
struct State {
    progress: u64,
    total: u64,
    history: VecDeque<(Instant, i128)>,
}

/// Progress counter with listeners and rolling speed estimation
pub struct ProgressController {
    state: Mutex<State>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    window: Duration,
}

impl ProgressController {
    /// Create a controller with the default speed window
    pub fn new() -> Self {
        Self::with_window(DEFAULT_SPEED_WINDOW)
    }

    /// Create a controller with a custom speed window
    pub fn with_window(window: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                progress: 0,
                total: 0,
                history: VecDeque::new(),
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            window,
        }
    }

    /// Apply an update, then notify every listener
    pub fn update(&self, advance: Option<Advance>, total: Option<u64>) {
        let snapshot = {
            let mut state = self.lock_state();
            if let Some(advance) = advance {
                let next = match advance {
                    Advance::To(value) => value,
                    Advance::By(delta) => state.progress.saturating_add(delta),
                };
                let delta = i128::from(next) - i128::from(state.progress);
                state.progress = next;
                state.history.push_back((Instant::now(), delta));
            }
            if let Some(total) = total {
                state.total = total;
            }
            ProgressSnapshot {
                progress: state.progress,
                total: state.total,
            }
        };
        self.notify(snapshot);
    }

    /// Add `delta` to the progress
    pub fn advance(&self, delta: u64) {
        self.update(Some(Advance::By(delta)), None);
    }

    /// Set the progress to an absolute value
    pub fn set_progress(&self, progress: u64) {
        self.update(Some(Advance::To(progress)), None);
    }

    /// Set the total
    pub fn set_total(&self, total: u64) {
        self.update(None, Some(total));
    }

    /// Current progress value
    pub fn progress(&self) -> u64 {
        self.lock_state().progress
    }

    /// Current total
    pub fn total(&self) -> u64 {
        self.lock_state().total
    }

    /// Current progress and total
    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.lock_state();
        ProgressSnapshot {
            progress: state.progress,
            total: state.total,
        }
    }

    /// Completion percentage (0.0 when the total is unknown)
    pub fn percent(&self) -> f64 {
        self.snapshot().percent()
    }

    /// Average units per second over the trailing window
    ///
    /// Samples older than the window are pruned first. Returns `None`
    /// with fewer than two samples left or no elapsed time between them.
    pub fn speed(&self) -> Option<f64> {
        let mut state = self.lock_state();
        let now = Instant::now();
        while let Some(&(at, _)) = state.history.front() {
            if now.duration_since(at) > self.window {
                state.history.pop_front();
            } else {
                break;
            }
        }

        if state.history.len() < 2 {
            return None;
        }

        let (first, _) = state.history[0];
        let (last, _) = state.history[state.history.len() - 1];
        let elapsed = last.duration_since(first).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }

        let moved: i128 = state.history.iter().skip(1).map(|&(_, delta)| delta).sum();
        Some(moved as f64 / elapsed)
    }

    /// Estimated time until `progress == total`
    pub fn remain(&self) -> Option<Duration> {
        let speed = self.speed()?;
        if speed <= 0.0 {
            return None;
        }
        let snapshot = self.snapshot();
        let left = snapshot.total.saturating_sub(snapshot.progress);
        Duration::try_from_secs_f64(left as f64 / speed).ok()
    }

    /// Register a listener; it is called immediately with the current state
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(ProgressSnapshot) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let listener: Listener = Arc::new(listener);
        listener(self.snapshot());
        self.lock_listeners().push((id, listener));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    /// Mirror every update of `source` into this controller
    ///
    /// Only a weak reference to `self` is captured, so the mirror stops
    /// silently once this controller is dropped.
    pub fn sync_from(self: &Arc<Self>, source: &ProgressController) -> ListenerId {
        let target: Weak<ProgressController> = Arc::downgrade(self);
        source.subscribe(move |snapshot| {
            if let Some(target) = target.upgrade() {
                target.update(Some(Advance::To(snapshot.progress)), Some(snapshot.total));
            }
        })
    }

    fn notify(&self, snapshot: ProgressSnapshot) {
        // Listeners run without any lock held so they may call back in.
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProgressController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ProgressController")
            .field("progress", &snapshot.progress)
            .field("total", &snapshot.total)
            .field("window", &self.window)
            .finish()
    }
}
