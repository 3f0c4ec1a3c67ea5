//! Progress reporter implementation
//!
//! Uses indicatif to draw one bar per hashing task with:
//! - Bytes read against the file size
//! - Throughput and ETA from the task's progress controller
//! - The task's status

use super::controller::ProgressSnapshot;
use super::future::{FutureWithProgress, TaskStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format a throughput in bytes per second, `-` when unknown
pub fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(speed) if speed.is_finite() && speed >= 0.0 => {
            format!("{}/s", format_size(speed as u64))
        }
        _ => "-".to_string(),
    }
}

/// Format a remaining time rounded to whole seconds, `-` when unknown
pub fn format_eta(remain: Option<Duration>) -> String {
    match remain {
        Some(remain) => {
            humantime::format_duration(Duration::from_secs(remain.as_secs_f64().round() as u64))
                .to_string()
        }
        None => "-".to_string(),
    }
}

/// One status line for a task
pub fn task_line(
    status: TaskStatus,
    snapshot: ProgressSnapshot,
    speed: Option<f64>,
    remain: Option<Duration>,
) -> String {
    match status {
        TaskStatus::Running => format!(
            "{}/{} {:>5.1}% {} ETA {} [{}]",
            format_size(snapshot.progress),
            format_size(snapshot.total),
            snapshot.percent(),
            format_speed(speed),
            format_eta(remain),
            status
        ),
        _ => format!(
            "{}/{} {:>5.1}% [{}]",
            format_size(snapshot.progress),
            format_size(snapshot.total),
            snapshot.percent(),
            status
        ),
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:30.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

struct TaskBar {
    name: String,
    bar: Option<ProgressBar>,
    finished: bool,
}

/// Live per-task progress display
pub struct ProgressReporter {
    multi: MultiProgress,
    tasks: Vec<TaskBar>,
    show_all: bool,
}

impl ProgressReporter {
    /// Create a reporter drawing to stderr
    ///
    /// Unless `show_all` is set, a task is drawn only while it runs.
    pub fn new(show_all: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            tasks: Vec::new(),
            show_all,
        }
    }

    /// Create a reporter that draws nothing
    pub fn hidden() -> Self {
        let reporter = Self::new(false);
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Register a task under a display name; returns its index
    pub fn add_task(&mut self, name: impl Into<String>) -> usize {
        self.tasks.push(TaskBar {
            name: name.into(),
            bar: None,
            finished: false,
        });
        self.tasks.len() - 1
    }

    /// Redraw task `index` from its future
    pub fn refresh<T>(&mut self, index: usize, future: &FutureWithProgress<T>) {
        let status = future.status();
        let progress = future.progress();
        let snapshot = progress.snapshot();
        let line = task_line(status, snapshot, progress.speed(), progress.remain());

        let show_all = self.show_all;
        let multi = &self.multi;
        let Some(task) = self.tasks.get_mut(index) else {
            return;
        };
        if task.finished {
            return;
        }

        let visible = show_all || status == TaskStatus::Running;
        if task.bar.is_none() && visible {
            let bar = multi.add(ProgressBar::new(snapshot.total));
            bar.set_style(bar_style());
            bar.set_prefix(task.name.clone());
            task.bar = Some(bar);
        }

        if let Some(bar) = &task.bar {
            bar.set_length(snapshot.total);
            bar.set_position(snapshot.progress);
            bar.set_message(line);
        }

        if status.is_terminal() {
            task.finished = true;
            if let Some(bar) = task.bar.take() {
                if show_all {
                    bar.abandon();
                } else {
                    bar.finish_and_clear();
                    multi.remove(&bar);
                }
            }
        }
    }

    /// Whether every registered task reached a terminal status
    pub fn all_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.finished)
    }

    /// Clear the display
    pub fn finish(&self) {
        for task in &self.tasks {
            if let Some(bar) = &task.bar {
                bar.finish_and_clear();
            }
        }
        let _ = self.multi.clear();
    }
}

/// Totals printed after a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Tasks that produced digests
    pub completed: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Tasks that were cancelled
    pub canceled: usize,
    /// Bytes hashed by completed tasks
    pub bytes: u64,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Account for one finished task
    pub fn record(&mut self, status: TaskStatus, bytes: u64) {
        match status {
            TaskStatus::Completed => {
                self.completed += 1;
                self.bytes += bytes;
            }
            TaskStatus::Canceled => self.canceled += 1,
            _ => self.failed += 1,
        }
    }

    /// Whether any task did not complete
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.canceled > 0
    }

    /// Average throughput over the run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Print summary to stderr
    pub fn print(&self) {
        eprintln!(
            "{} completed, {} failed, {} canceled: {} in {:.1?} ({})",
            self.completed,
            self.failed,
            self.canceled,
            format_size(self.bytes),
            self.elapsed,
            format_speed(Some(self.throughput()))
        );
    }
}
