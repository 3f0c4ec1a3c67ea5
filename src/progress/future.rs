//! Result slots with progress
//!
//! A worker and its caller are joined by a one-shot channel. The worker
//! holds a [`TaskPromise`] and writes exactly one outcome into it; the
//! caller holds a [`FutureWithProgress`] that reads the outcome, mirrors
//! the worker's [`ProgressController`], and exposes the task's status.
//!
//! Status moves `Waiting -> Running -> {Completed, Failed, Canceled}`.
//! Cancellation is only effective before the task starts; cancelling a
//! running task marks it `Canceled` but the work itself runs to the end
//! and its outcome is discarded.

use super::controller::ProgressController;
use crate::error::{HashCalcError, Result};
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Lifecycle of a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Queued, not yet picked up by a worker
    Waiting,
    /// A worker is executing it
    Running,
    /// Finished with a value
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled by the caller
    Canceled,
}

impl TaskStatus {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status shared between a promise and its future
#[derive(Debug)]
struct TaskState {
    status: Mutex<TaskStatus>,
}

impl TaskState {
    fn new(status: TaskStatus) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TaskStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self) -> TaskStatus {
        *self.lock()
    }

    /// `Waiting -> Running`; false if the task was cancelled first
    fn start(&self) -> bool {
        let mut status = self.lock();
        match *status {
            TaskStatus::Waiting => {
                *status = TaskStatus::Running;
                true
            }
            _ => false,
        }
    }

    /// Record the terminal status unless one is already set
    fn finish(&self, terminal: TaskStatus) -> TaskStatus {
        let mut status = self.lock();
        if !status.is_terminal() {
            *status = terminal;
        }
        *status
    }

    /// Promise gone without an outcome: `Waiting -> Canceled`, `Running -> Failed`
    fn abandon(&self) -> TaskStatus {
        let mut status = self.lock();
        match *status {
            TaskStatus::Waiting => *status = TaskStatus::Canceled,
            TaskStatus::Running => *status = TaskStatus::Failed,
            _ => {}
        }
        *status
    }

    fn cancel(&self) -> bool {
        let mut status = self.lock();
        if status.is_terminal() {
            false
        } else {
            *status = TaskStatus::Canceled;
            true
        }
    }
}

enum Outcome<T> {
    Value(T),
    Error(HashCalcError),
    Canceled,
}

impl<T> Outcome<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Value(value) => Outcome::Value(f(value)),
            Self::Error(e) => Outcome::Error(e),
            Self::Canceled => Outcome::Canceled,
        }
    }
}

/// Settle a received outcome against the shared status
fn settle<T>(state: &TaskState, outcome: Option<Outcome<T>>) -> Outcome<T> {
    match outcome {
        Some(outcome) => {
            if state.get() == TaskStatus::Canceled {
                Outcome::Canceled
            } else {
                outcome
            }
        }
        // Promise dropped without an outcome: the pool discarded it.
        None => {
            if state.abandon() == TaskStatus::Canceled {
                Outcome::Canceled
            } else {
                Outcome::Error(HashCalcError::ThreadPoolError(
                    "task was dropped before producing a result".to_string(),
                ))
            }
        }
    }
}

/// Worker side of a task: writes exactly one outcome
pub struct TaskPromise<T> {
    sender: Sender<Outcome<T>>,
    state: Arc<TaskState>,
    progress: Arc<ProgressController>,
}

impl<T> TaskPromise<T> {
    /// Mark the task running; false if it was cancelled while waiting
    pub fn start(&self) -> bool {
        self.state.start()
    }

    /// The controller the work should report into
    pub fn progress(&self) -> &Arc<ProgressController> {
        &self.progress
    }

    /// Publish the outcome of the work
    pub fn complete(self, result: Result<T>) {
        let (terminal, outcome) = match result {
            Ok(value) => (TaskStatus::Completed, Outcome::Value(value)),
            Err(e) => (TaskStatus::Failed, Outcome::Error(e)),
        };
        let status = self.state.finish(terminal);
        let outcome = if status == TaskStatus::Canceled {
            Outcome::Canceled
        } else {
            outcome
        };
        // The receiver may be gone; nobody is waiting then.
        let _ = self.sender.send(outcome);
    }

    /// Finish without running
    pub fn cancel(self) {
        self.state.finish(TaskStatus::Canceled);
        let _ = self.sender.send(Outcome::Canceled);
    }
}

/// Caller side of a task: eventual value, status, and progress
pub struct FutureWithProgress<T> {
    receiver: Receiver<Outcome<T>>,
    state: Arc<TaskState>,
    progress: Arc<ProgressController>,
    settled: OnceLock<Outcome<T>>,
}

/// Create a connected promise/future pair
///
/// The future gets its own controller that mirrors `task_progress`, so
/// observers of the future never touch the worker's controller directly.
pub fn task_channel<T>(
    task_progress: Arc<ProgressController>,
) -> (TaskPromise<T>, FutureWithProgress<T>) {
    let (sender, receiver) = bounded(1);
    let state = TaskState::new(TaskStatus::Waiting);
    let mirror = Arc::new(ProgressController::new());
    mirror.sync_from(&task_progress);

    let promise = TaskPromise {
        sender,
        state: Arc::clone(&state),
        progress: task_progress,
    };
    let future = FutureWithProgress {
        receiver,
        state,
        progress: mirror,
        settled: OnceLock::new(),
    };
    (promise, future)
}

impl<T> FutureWithProgress<T> {
    /// A future that is already completed with `value`
    pub fn completed(value: T) -> Self {
        Self::resolved(TaskStatus::Completed, Outcome::Value(value))
    }

    /// A future that has already failed with `error`
    pub fn failed(error: HashCalcError) -> Self {
        Self::resolved(TaskStatus::Failed, Outcome::Error(error))
    }

    fn resolved(status: TaskStatus, outcome: Outcome<T>) -> Self {
        let (_sender, receiver) = bounded(1);
        let settled = OnceLock::new();
        let _ = settled.set(outcome);
        Self {
            receiver,
            state: TaskState::new(status),
            progress: Arc::new(ProgressController::new()),
            settled,
        }
    }

    /// Current status
    pub fn status(&self) -> TaskStatus {
        self.poll();
        self.state.get()
    }

    /// Whether an outcome is available without blocking
    pub fn is_done(&self) -> bool {
        self.poll();
        self.settled.get().is_some()
    }

    /// Whether the task is executing right now
    pub fn is_running(&self) -> bool {
        self.status() == TaskStatus::Running
    }

    /// Progress controller mirroring the task's progress
    pub fn progress(&self) -> &Arc<ProgressController> {
        &self.progress
    }

    /// Request cancellation
    ///
    /// Returns false if the task already reached a terminal status.
    /// A running task keeps running; only its status and outcome change.
    pub fn cancel(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.state.cancel()
    }

    /// Block until the task finishes and take its result
    pub fn wait(self) -> Result<T> {
        if self.settled.get().is_none() {
            let outcome = self.receive(self.receiver.recv().ok());
            let _ = self.settled.set(outcome);
        }

        match self.settled.into_inner() {
            Some(Outcome::Value(value)) => Ok(value),
            Some(Outcome::Error(e)) => Err(e),
            Some(Outcome::Canceled) | None => Err(HashCalcError::Cancelled),
        }
    }

    fn poll(&self) {
        if self.settled.get().is_some() {
            return;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => {
                let outcome = self.receive(Some(outcome));
                let _ = self.settled.set(outcome);
            }
            Err(TryRecvError::Disconnected) => {
                let outcome = self.receive(None);
                let _ = self.settled.set(outcome);
            }
            Err(TryRecvError::Empty) => {}
        }
    }

    fn receive(&self, outcome: Option<Outcome<T>>) -> Outcome<T> {
        settle(&self.state, outcome)
    }

    /// Derive a future whose value is `f` applied to this one's
    ///
    /// Status and progress are shared with the source, so the derived
    /// future reports the source task's real execution state. Errors and
    /// cancellation are forwarded unchanged.
    pub fn map<U, F>(self, f: F) -> FutureWithProgress<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let Self {
            receiver,
            state,
            progress,
            settled,
        } = self;
        let (sender, derived) = bounded(1);

        match settled.into_inner() {
            Some(outcome) => {
                let _ = sender.send(outcome.map(f));
            }
            None => {
                let source_state = Arc::clone(&state);
                let forward = std::thread::Builder::new()
                    .name("hashcalc-forward".to_string())
                    .spawn(move || {
                        let outcome = settle(&source_state, receiver.recv().ok());
                        let _ = sender.send(outcome.map(f));
                    });
                if let Err(e) = forward {
                    return FutureWithProgress::failed(HashCalcError::ThreadPoolError(format!(
                        "failed to spawn forwarding thread: {}",
                        e
                    )));
                }
            }
        }

        FutureWithProgress {
            receiver: derived,
            state,
            progress,
            settled: OnceLock::new(),
        }
    }
}

impl<T> std::fmt::Debug for FutureWithProgress<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FutureWithProgress")
            .field("status", &self.state.get())
            .field("progress", &self.progress.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_completed_future() {
        let future = FutureWithProgress::completed(7u32);
        assert!(future.is_done());
        assert_eq!(future.status(), TaskStatus::Completed);
        assert!(!future.cancel());
        assert_eq!(future.wait().unwrap(), 7);
    }

    #[test]
    fn test_failed_future() {
        let future: FutureWithProgress<u32> =
            FutureWithProgress::failed(HashCalcError::config("boom"));
        assert_eq!(future.status(), TaskStatus::Failed);
        assert!(matches!(future.wait(), Err(HashCalcError::ConfigError(_))));
    }

    #[test]
    fn test_lifecycle_through_channel() {
        let (promise, future) = task_channel::<String>(Arc::new(ProgressController::new()));
        assert_eq!(future.status(), TaskStatus::Waiting);
        assert!(!future.is_done());

        let worker = std::thread::spawn(move || {
            assert!(promise.start());
            promise.progress().set_total(10);
            promise.progress().advance(10);
            promise.complete(Ok("done".to_string()));
        });
        worker.join().unwrap();

        assert_eq!(future.status(), TaskStatus::Completed);
        assert_eq!(future.progress().progress(), 10);
        assert_eq!(future.progress().percent(), 100.0);
        assert_eq!(future.wait().unwrap(), "done");
    }

    #[test]
    fn test_error_is_reraised() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        assert!(promise.start());
        promise.complete(Err(HashCalcError::io(
            "/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        )));
        assert_eq!(future.status(), TaskStatus::Failed);
        assert!(future.wait().unwrap_err().is_permission_error());
    }

    #[test]
    fn test_cancel_before_start() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        assert!(future.cancel());
        assert!(!promise.start());
        promise.cancel();

        assert_eq!(future.status(), TaskStatus::Canceled);
        assert!(future.wait().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_cancel_while_running_discards_value() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        assert!(promise.start());
        assert!(future.is_running());
        assert!(future.cancel());

        // The work still finishes.
        promise.complete(Ok(1));
        assert_eq!(future.status(), TaskStatus::Canceled);
        assert!(future.wait().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_terminal_status_is_idempotent() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        assert!(promise.start());
        promise.complete(Ok(3));
        assert_eq!(future.status(), TaskStatus::Completed);
        assert!(!future.cancel());
        assert_eq!(future.status(), TaskStatus::Completed);
        assert_eq!(future.wait().unwrap(), 3);
    }

    #[test]
    fn test_dropped_promise_fails_future() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        assert!(promise.start());
        drop(promise);
        assert_eq!(future.status(), TaskStatus::Failed);
        assert!(matches!(future.wait(), Err(HashCalcError::ThreadPoolError(_))));
    }

    #[test]
    fn test_dropped_waiting_promise_cancels_future() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        drop(promise);
        assert_eq!(future.status(), TaskStatus::Canceled);
        assert!(matches!(future.wait(), Err(HashCalcError::Cancelled)));
    }

    #[test]
    fn test_dropped_promise_keeps_user_cancel() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        assert!(promise.start());
        assert!(future.cancel());
        drop(promise);
        assert_eq!(future.status(), TaskStatus::Canceled);
        assert!(matches!(future.wait(), Err(HashCalcError::Cancelled)));
    }

    #[test]
    fn test_map_forwards_value_and_status() {
        let (promise, future) = task_channel::<u32>(Arc::new(ProgressController::new()));
        let derived = future.map(|n| n.to_string());
        assert_eq!(derived.status(), TaskStatus::Waiting);

        assert!(promise.start());
        assert!(derived.is_running());
        promise.progress().set_total(4);
        promise.progress().advance(4);
        promise.complete(Ok(42));

        assert_eq!(derived.progress().progress(), 4);
        assert_eq!(derived.wait().unwrap(), "42");
    }

    #[test]
    fn test_map_forwards_error_and_cancel() {
        let (promise, future) = task_channel::<u32>(Arc::new(ProgressController::new()));
        let derived = future.map(|n| n + 1);
        promise.complete(Err(HashCalcError::config("bad")));
        assert!(matches!(derived.wait(), Err(HashCalcError::ConfigError(_))));

        let (promise, future) = task_channel::<u32>(Arc::new(ProgressController::new()));
        let derived = future.map(|n| n + 1);
        assert!(derived.cancel());
        assert!(!promise.start());
        promise.cancel();
        assert!(derived.wait().unwrap_err().is_cancelled());

        let ready = FutureWithProgress::completed(1u32).map(|n| n * 10);
        assert_eq!(ready.wait().unwrap(), 10);
    }

    #[test]
    fn test_wait_blocks_until_done() {
        let (promise, future) = task_channel::<u8>(Arc::new(ProgressController::new()));
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            if promise.start() {
                promise.complete(Ok(9));
            }
        });
        assert_eq!(future.wait().unwrap(), 9);
    }
}
