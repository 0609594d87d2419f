// Library module for ghostsweep
// Re-exports modules for use in integration tests and external crates

pub mod cancel;
pub mod delete;
pub mod error;
pub mod events;
pub mod matcher;
pub mod path_utils;
pub mod rules;
pub mod scan;

// Re-export commonly used types for convenience
pub use cancel::CancelToken;
pub use delete::{DeleteEntry, DeleteOutcome, DeleteResult, DeleteTarget, DeleteWorker};
pub use error::GhostError;
pub use events::{DeleteEvent, RunStatus, ScanEvent};
pub use matcher::{MatchDecision, MatchEngine, MatchResult};
pub use rules::{parse_filter_file, parse_filter_text, Rule, RuleAction, RuleSet};
pub use scan::{ScanPayload, ScanStats, ScanWorker};
