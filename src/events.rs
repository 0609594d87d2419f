//! Events streamed from worker threads to the caller.
//!
//! Workers push these over a bounded crossbeam channel; the consumer drains
//! them on its own thread of control. Heavyweight state never crosses the
//! channel, only per-entry payloads, counter snapshots, and one terminal
//! `Finished` message.

use crate::delete::{DeleteEntry, DeleteResult};
use crate::scan::{ScanPayload, ScanStats};

/// Terminal state of a worker run. `Cancelled` is distinct from `Completed`:
/// the accompanying stats/result are a valid partial snapshot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum RunStatus {
    Completed,
    Cancelled,
    Failed(String),
}

/// Events produced by a scan run.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// One classified regular file, in deterministic traversal order.
    Entry(ScanPayload),
    /// Periodic counter snapshot. Total file count is unknown up front, so
    /// progress is a running count, not a fraction.
    Progress(ScanStats),
    /// Always the last event of a run.
    Finished { stats: ScanStats, status: RunStatus },
}

/// Events produced by a delete run.
#[derive(Debug, Clone)]
pub enum DeleteEvent {
    /// Outcome for one input path, in input order.
    Entry(DeleteEntry),
    /// Always the last event of a run.
    Finished(DeleteResult),
}
