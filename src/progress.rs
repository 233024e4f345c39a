//! Pipeline progress reporting.
//!
//! Reports observable progress during `clh analyze` and `clh compare` so
//! users see which stage is running and how many gateway calls remain.
//! Progress is emitted on **stderr** so stdout remains parseable for
//! scripts.

use std::io::Write;

/// A single progress event for the pipeline.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// A named stage began (e.g. "holistic analysis", "chunk matching").
    StageStarted { stage: String },
    /// Per-item progress inside a stage: n items processed out of total.
    ItemProgress { stage: String, n: usize, total: usize },
    /// A stage completed, with a short result note.
    StageFinished { stage: String, note: String },
}

/// Reports pipeline progress. Implementations write to stderr or swallow
/// events entirely (tests).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "granular analysis  4 / 12".
pub struct StderrProgress;

fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::StageStarted { stage } => format!("{}...\n", stage),
        ProgressEvent::ItemProgress { stage, n, total } => {
            format!("{}  {} / {}\n", stage, n, total)
        }
        ProgressEvent::StageFinished { stage, note } => {
            format!("{}  done  {}\n", stage, note)
        }
    }
}

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = format_event(&event);
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Discards every event. Used by tests and JSON-only invocations.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _event: ProgressEvent) {}
}
