//! Filter-file parsing.
//!
//! Filter files are line-oriented, gitignore-flavored text: `- pattern`
//! excludes, `+ pattern` includes, `#` comments. A comment of the exact form
//! `# label: some text` annotates the next rule line with a human-readable
//! label.

use std::fmt;
use std::fs;
use std::path::Path;

use globset::GlobBuilder;

use crate::error::GhostError;

/// What a filter directive does. Closed set so the evaluator can match
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RuleAction {
    Exclude,
    Include,
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuleAction::Exclude => write!(f, "-"),
            RuleAction::Include => write!(f, "+"),
        }
    }
}

/// One parsed filter directive. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Rule {
    pub action: RuleAction,
    /// Gitignore-style glob: `*` stays within one path segment, `**` crosses
    /// any number of segments including zero. Matched against root-relative
    /// paths with `/` separators.
    pub pattern: String,
    /// 1-based line number in the filter file
    pub source_line: usize,
    /// Optional annotation attached via a preceding `# label: ...` comment
    pub label: Option<String>,
}

/// Ordered, read-only sequence of Exclude rules. Order is significant:
/// the evaluator gives later rules precedence over earlier ones.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

/// Parse a filter file into a RuleSet.
///
/// Any failure to read the file (missing, permission denied, non-UTF-8
/// bytes) is reported uniformly as `FilterFileRead`; malformed lines are
/// `FilterFileParse` with their 1-based line number.
///
/// Include (`+`) lines are syntax-checked but not emitted: a filter file
/// containing only Include lines parses to an empty RuleSet, and a mixed
/// file behaves as if its Include lines were absent.
pub fn parse_filter_file(path: &Path) -> Result<RuleSet, GhostError> {
    let bytes = fs::read(path).map_err(|e| GhostError::filter_read(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| GhostError::FilterFileRead {
        path: path.to_path_buf(),
        reason: format!("file is not valid UTF-8: {}", e),
    })?;

    parse_filter_text(&text, path)
}

/// Parse filter-file contents. Split out from `parse_filter_file` so the
/// grammar can be tested without touching the filesystem.
pub fn parse_filter_text(text: &str, path: &Path) -> Result<RuleSet, GhostError> {
    let mut rules = Vec::new();
    // Label carried from a `# label: ...` comment to the next rule line.
    // Single-use: consumed by the next rule line, cleared by inert comments.
    let mut pending_label: Option<String> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let lineno = index + 1;
        let line = raw_line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            pending_label = parse_metadata_comment(comment);
            continue;
        }

        let (action, rest) = if let Some(rest) = line.strip_prefix('-') {
            (RuleAction::Exclude, rest)
        } else if let Some(rest) = line.strip_prefix('+') {
            (RuleAction::Include, rest)
        } else {
            return Err(GhostError::FilterFileParse {
                path: path.to_path_buf(),
                line: lineno,
                reason: format!("expected '-' or '+' prefix, got {:?}", line),
            });
        };

        if !rest.starts_with(char::is_whitespace) {
            return Err(GhostError::FilterFileParse {
                path: path.to_path_buf(),
                line: lineno,
                reason: "rule prefix must be followed by whitespace and a pattern".to_string(),
            });
        }

        let pattern = rest.trim();
        if pattern.is_empty() {
            return Err(GhostError::FilterFileParse {
                path: path.to_path_buf(),
                line: lineno,
                reason: "rule has an empty pattern".to_string(),
            });
        }

        // Validate the glob here so bad patterns fail at parse time with a
        // line number, not later inside the match engine.
        GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| GhostError::FilterFileParse {
                path: path.to_path_buf(),
                line: lineno,
                reason: format!("invalid pattern {:?}: {}", pattern, e),
            })?;

        // The pending label is consumed by whichever rule line follows it,
        // Include lines included, even though those are not emitted.
        let label = pending_label.take();

        if action == RuleAction::Exclude {
            rules.push(Rule {
                action,
                pattern: pattern.to_string(),
                source_line: lineno,
                label,
            });
        }
    }

    Ok(RuleSet::new(rules))
}

/// Interpret a comment body as a metadata directive. Returns the label to
/// carry forward when the body is exactly `label: value` (exactly one colon);
/// every other comment is inert and clears the annotation state.
fn parse_metadata_comment(comment: &str) -> Option<String> {
    let body = comment.trim();

    if body.matches(':').count() != 1 {
        return None;
    }

    let (key, value) = body.split_once(':')?;
    if key.trim() == "label" {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> RuleSet {
        parse_filter_text(text, Path::new("test-filter.txt")).unwrap()
    }

    #[test]
    fn parses_exclude_rules_in_order() {
        let rules = parse("- **/*.tmp\n- build/**\n");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get(0).unwrap().pattern, "**/*.tmp");
        assert_eq!(rules.get(0).unwrap().source_line, 1);
        assert_eq!(rules.get(1).unwrap().pattern, "build/**");
        assert_eq!(rules.get(1).unwrap().source_line, 2);
    }

    #[test]
    fn include_only_file_parses_to_empty_set() {
        let rules = parse("+ **/*.txt\n+ **/*.md\n");
        assert!(rules.is_empty());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let rules = parse("\n   \n# just a comment\n\t\n");
        assert!(rules.is_empty());
    }

    #[test]
    fn label_comment_attaches_to_next_rule() {
        let rules = parse("# label: old caches\n- **/*.cache\n");
        assert_eq!(rules.get(0).unwrap().label.as_deref(), Some("old caches"));
    }

    #[test]
    fn label_is_single_use() {
        let rules = parse("# label: first\n- a/**\n- b/**\n");
        assert_eq!(rules.get(0).unwrap().label.as_deref(), Some("first"));
        assert_eq!(rules.get(1).unwrap().label, None);
    }

    #[test]
    fn comment_with_two_colons_is_inert() {
        let rules = parse("# label: a: b\n- **/*.tmp\n");
        assert_eq!(rules.get(0).unwrap().label, None);
    }

    #[test]
    fn unrecognized_metadata_key_is_inert() {
        let rules = parse("# owner: alice\n- **/*.tmp\n");
        assert_eq!(rules.get(0).unwrap().label, None);
    }

    #[test]
    fn inert_comment_clears_pending_label() {
        let rules = parse("# label: stale\n# plain comment\n- **/*.tmp\n");
        assert_eq!(rules.get(0).unwrap().label, None);
    }

    #[test]
    fn include_line_consumes_pending_label() {
        let rules = parse("# label: keep these\n+ **/*.txt\n- **/*.tmp\n");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get(0).unwrap().label, None);
    }

    #[test]
    fn malformed_prefix_is_a_parse_error() {
        let err = parse_filter_text("*.tmp\n", Path::new("f.txt")).unwrap_err();
        match err {
            GhostError::FilterFileParse { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn prefix_without_whitespace_is_a_parse_error() {
        let err = parse_filter_text("-*.tmp\n", Path::new("f.txt")).unwrap_err();
        assert!(matches!(err, GhostError::FilterFileParse { line: 1, .. }));
    }

    #[test]
    fn empty_pattern_is_a_parse_error() {
        let err = parse_filter_text("-   \n", Path::new("f.txt")).unwrap_err();
        assert!(matches!(err, GhostError::FilterFileParse { line: 1, .. }));
    }

    #[test]
    fn parse_error_reports_later_line_numbers() {
        let err = parse_filter_text("- ok/**\n\n# note\nbogus\n", Path::new("f.txt")).unwrap_err();
        assert!(matches!(err, GhostError::FilterFileParse { line: 4, .. }));
    }
}
