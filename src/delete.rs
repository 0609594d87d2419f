// File deletion module
// Removes caller-approved ghost files one at a time, isolating per-file
// failures, and reports an ordered result.

use std::fs;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};

use crate::cancel::CancelToken;
use crate::events::{DeleteEvent, RunStatus};

const EVENT_BUFFER: usize = 1024;

/// One path approved for deletion, with the size recorded at classification
/// time. `bytes_freed` uses this size; the file cannot be re-stat'd after
/// removal.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteTarget {
    pub path: PathBuf,
    pub size: u64,
}

/// Outcome for one processed path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum DeleteOutcome {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteEntry {
    pub path: PathBuf,
    pub size: u64,
    pub outcome: DeleteOutcome,
}

/// Aggregate outcome of a delete run. Entries appear in the same order as
/// the input path list; on cancellation only processed paths are present.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteResult {
    pub entries: Vec<DeleteEntry>,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_freed: u64,
    pub status: RunStatus,
}

/// Background deleter for a caller-supplied list of ghost paths.
///
/// Deletes exactly the supplied paths and nothing else: no re-matching, no
/// traversal. What to delete is entirely the caller's decision.
pub struct DeleteWorker {
    targets: Vec<DeleteTarget>,
    cancel: CancelToken,
}

impl DeleteWorker {
    pub fn new(targets: Vec<DeleteTarget>, cancel: CancelToken) -> Self {
        Self { targets, cancel }
    }

    /// Run the deletion on a dedicated thread and return the event stream.
    /// The final event is always `DeleteEvent::Finished`.
    pub fn spawn(self) -> (Receiver<DeleteEvent>, JoinHandle<()>) {
        let (sender, receiver) = bounded::<DeleteEvent>(EVENT_BUFFER);

        let handle = thread::spawn(move || {
            let mut emit = |event: DeleteEvent| sender.send(event).is_ok();
            self.run(&mut emit);
        });

        (receiver, handle)
    }

    /// Synchronous delete run driving a callback. Emits one `Entry` per
    /// processed path and a terminal `Finished`, and returns the finished
    /// result for single-threaded callers.
    pub fn run(&self, emit: &mut dyn FnMut(DeleteEvent) -> bool) -> DeleteResult {
        let mut result = DeleteResult {
            entries: Vec::with_capacity(self.targets.len()),
            succeeded: 0,
            failed: 0,
            bytes_freed: 0,
            status: RunStatus::Completed,
        };
        let mut consumer_gone = false;

        for target in &self.targets {
            // Cancellation takes effect before the next not-yet-processed
            // path; an in-flight removal always completes.
            if self.cancel.is_cancelled() {
                result.status = RunStatus::Cancelled;
                break;
            }

            let outcome = match fs::remove_file(&target.path) {
                Ok(()) => {
                    result.succeeded += 1;
                    result.bytes_freed += target.size;
                    DeleteOutcome::Deleted
                }
                Err(e) => {
                    // Permission denied, vanished, is-a-directory: recorded
                    // for this entry, run continues.
                    result.failed += 1;
                    DeleteOutcome::Failed(e.to_string())
                }
            };

            let entry = DeleteEntry {
                path: target.path.clone(),
                size: target.size,
                outcome,
            };
            result.entries.push(entry.clone());

            if !consumer_gone && !emit(DeleteEvent::Entry(entry)) {
                // Keep deleting what was approved, just stop streaming.
                consumer_gone = true;
            }
        }

        if !consumer_gone {
            emit(DeleteEvent::Finished(result.clone()));
        }
        result
    }
}
