// Directory scanning module
// Walks a tree on a background thread, classifies every regular file through
// the match engine, and streams results over a bounded channel.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use crossbeam_channel::{bounded, Receiver};

use crate::cancel::CancelToken;
use crate::error::GhostError;
use crate::events::{RunStatus, ScanEvent};
use crate::matcher::{MatchDecision, MatchEngine};
use crate::path_utils::DirIdentity;
use crate::rules::RuleSet;

/// Channel capacity for streamed events. A full channel blocks the scan
/// thread, never the consumer.
const EVENT_BUFFER: usize = 1024;

/// Emit a Progress snapshot every this many visited files.
const PROGRESS_INTERVAL: u64 = 100;

/// Aggregate counters accumulated during one scan. Monotonically
/// non-decreasing while the run is live; reset at the start of each scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanStats {
    pub files_visited: u64,
    pub dirs_visited: u64,
    /// Directories skipped because their canonical identity was already
    /// visited (symlink cycles, bind mounts).
    pub dirs_skipped: u64,
    pub files_matched: u64,
    pub bytes_reclaimable: u64,
    pub errors: u64,
}

/// One unit of streamed scan output, produced per visited regular file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanPayload {
    /// Root-relative path with `/` separators
    pub rel_path: String,
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    pub size: u64,
    pub mtime: Option<SystemTime>,
    pub decision: MatchDecision,
}

impl ScanPayload {
    /// A file is a ghost when an Exclude rule won the match.
    pub fn is_ghost(&self) -> bool {
        self.decision.matched
    }
}

/// Background scanner: traverses a directory tree, evaluates every regular
/// file against the rule set, and streams `ScanEvent`s.
///
/// One worker serves one run; construct a new one per scan.
pub struct ScanWorker {
    root: PathBuf,
    engine: MatchEngine,
    cancel: CancelToken,
}

impl ScanWorker {
    pub fn new(
        root: &Path,
        rules: RuleSet,
        case_sensitive: bool,
        cancel: CancelToken,
    ) -> Result<Self, GhostError> {
        Ok(Self {
            root: root.to_path_buf(),
            engine: MatchEngine::new(rules, case_sensitive)?,
            cancel,
        })
    }

    /// Run the scan on a dedicated thread and return the event stream.
    ///
    /// The final event is always `ScanEvent::Finished`. Dropping the
    /// receiver stops the worker at its next emission.
    pub fn spawn(self) -> (Receiver<ScanEvent>, JoinHandle<()>) {
        let (sender, receiver) = bounded::<ScanEvent>(EVENT_BUFFER);

        let handle = thread::spawn(move || {
            let mut emit = |event: ScanEvent| sender.send(event).is_ok();
            self.run(&mut emit);
        });

        (receiver, handle)
    }

    /// Synchronous scan driving a callback. `emit` returns false to stop the
    /// run early (a dropped channel receiver surfaces this way).
    ///
    /// Emits `Finished` as its last event and returns the same stats/status
    /// pair for callers that stay on one thread.
    pub fn run(&self, emit: &mut dyn FnMut(ScanEvent) -> bool) -> (ScanStats, RunStatus) {
        let mut stats = ScanStats::default();

        let root_meta = match fs::metadata(&self.root) {
            Ok(meta) => meta,
            Err(e) => {
                let status = RunStatus::Failed(format!(
                    "cannot read scan root {}: {}",
                    self.root.display(),
                    e
                ));
                emit(ScanEvent::Finished { stats: stats.clone(), status: status.clone() });
                return (stats, status);
            }
        };
        if !root_meta.is_dir() {
            let status = RunStatus::Failed(format!(
                "scan root {} is not a directory",
                self.root.display()
            ));
            emit(ScanEvent::Finished { stats: stats.clone(), status: status.clone() });
            return (stats, status);
        }

        let mut visited = HashSet::new();
        if let Ok(identity) = DirIdentity::of(&self.root, &root_meta) {
            visited.insert(identity);
        }
        stats.dirs_visited += 1;

        let completed = self.walk_dir(&self.root, &mut stats, &mut visited, emit);

        let status = if completed {
            RunStatus::Completed
        } else if self.cancel.is_cancelled() {
            RunStatus::Cancelled
        } else {
            // Consumer went away; treat the partial run like a cancellation.
            RunStatus::Cancelled
        };

        emit(ScanEvent::Finished { stats: stats.clone(), status: status.clone() });
        (stats, status)
    }

    /// Recursively walk one directory. Returns false when the run stopped
    /// early (cancellation or a dropped consumer).
    fn walk_dir(
        &self,
        dir: &Path,
        stats: &mut ScanStats,
        visited: &mut HashSet<DirIdentity>,
        emit: &mut dyn FnMut(ScanEvent) -> bool,
    ) -> bool {
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(_) => {
                // Unreadable directory: count it, keep scanning the rest.
                stats.errors += 1;
                return true;
            }
        };

        // Sort entries by name so emission order is deterministic for a
        // given tree and rule set.
        let mut entries: Vec<PathBuf> = Vec::new();
        for entry in reader {
            match entry {
                Ok(entry) => entries.push(entry.path()),
                Err(_) => stats.errors += 1,
            }
        }
        entries.sort();

        for path in entries {
            // Cancellation is checked per directory entry.
            if self.cancel.is_cancelled() {
                return false;
            }

            // Stat the entry itself; vanished entries land in `errors`.
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(_) => {
                    stats.errors += 1;
                    continue;
                }
            };
            let file_type = metadata.file_type();

            if file_type.is_dir() {
                if !self.enter_dir(&path, &metadata, stats, visited, emit) {
                    return false;
                }
            } else if file_type.is_file() {
                if !self.visit_file(&path, &metadata, stats, emit) {
                    return false;
                }
            } else if file_type.is_symlink() {
                // Follow the link only far enough to learn whether it names
                // a directory; the visited-identity guard keeps cycles out.
                match fs::metadata(&path) {
                    Ok(target) if target.is_dir() => {
                        if !self.enter_dir(&path, &target, stats, visited, emit) {
                            return false;
                        }
                    }
                    // Link to a file, or dangling: classify the link by its
                    // own metadata. Sizes stay those of the link, never the
                    // target, so reclaimable bytes match what deleting the
                    // link actually frees.
                    _ => {
                        if !self.visit_file(&path, &metadata, stats, emit) {
                            return false;
                        }
                    }
                }
            }
            // Sockets, fifos, device nodes: not classifiable by this engine.
        }

        true
    }

    /// Recurse into a directory (or a symlink resolving to one) unless its
    /// canonical identity was already visited. `metadata` must describe the
    /// resolved directory, not a link to it.
    fn enter_dir(
        &self,
        path: &Path,
        metadata: &fs::Metadata,
        stats: &mut ScanStats,
        visited: &mut HashSet<DirIdentity>,
        emit: &mut dyn FnMut(ScanEvent) -> bool,
    ) -> bool {
        let identity = match DirIdentity::of(path, metadata) {
            Ok(identity) => identity,
            Err(_) => {
                stats.errors += 1;
                return true;
            }
        };
        if !visited.insert(identity) {
            // Already entered through another name: symlink cycle.
            stats.dirs_skipped += 1;
            return true;
        }
        stats.dirs_visited += 1;
        self.walk_dir(path, stats, visited, emit)
    }

    fn visit_file(
        &self,
        path: &Path,
        metadata: &fs::Metadata,
        stats: &mut ScanStats,
        emit: &mut dyn FnMut(ScanEvent) -> bool,
    ) -> bool {
        stats.files_visited += 1;
        let size = metadata.len();

        let result = match self.engine.evaluate_path(path, &self.root) {
            Ok(result) => result,
            Err(_) => {
                // Entries come from read_dir under root, so this only fires
                // on pathological roots like "."-relative walks racing a cwd
                // change. Recorded, not fatal.
                stats.errors += 1;
                return true;
            }
        };

        // Stats are updated before the payload is emitted, so a Progress
        // snapshot never under-reports an entry the consumer has seen.
        if result.decision.matched {
            stats.files_matched += 1;
            stats.bytes_reclaimable += size;
        }

        let payload = ScanPayload {
            rel_path: result.rel_path,
            path: path.to_path_buf(),
            size,
            mtime: metadata.modified().ok(),
            decision: result.decision,
        };

        if !emit(ScanEvent::Entry(payload)) {
            return false;
        }

        if stats.files_visited % PROGRESS_INTERVAL == 0 {
            if !emit(ScanEvent::Progress(stats.clone())) {
                return false;
            }
        }

        true
    }
}
