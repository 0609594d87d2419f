//! Rule evaluation against root-relative paths.
//!
//! The engine compiles each rule pattern once and evaluates paths purely
//! lexically. Later rules override earlier ones: the last rule in the set
//! that matches a path determines the outcome.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::GhostError;
use crate::path_utils::rel_path_string;
use crate::rules::{Rule, RuleSet};

/// Decision for one evaluated path. `rule_index`/`rule` identify the winning
/// rule when `matched` is true; both are `None` when no rule applied.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MatchDecision {
    pub matched: bool,
    pub rule_index: Option<usize>,
    pub rule: Option<Rule>,
}

impl MatchDecision {
    fn no_match() -> Self {
        Self {
            matched: false,
            rule_index: None,
            rule: None,
        }
    }
}

/// A decision together with the root-relative path it was made for.
/// `rel_path` always uses `/` separators regardless of host convention.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MatchResult {
    pub rel_path: String,
    pub decision: MatchDecision,
}

/// Evaluates paths against an ordered rule set.
///
/// Construction compiles every pattern; evaluation performs no filesystem
/// I/O and is a pure function of the inputs.
#[derive(Debug)]
pub struct MatchEngine {
    rules: RuleSet,
    matchers: Vec<GlobMatcher>,
    case_sensitive: bool,
}

impl MatchEngine {
    /// Compile a rule set. `case_sensitive` (default true in filter files)
    /// controls literal/segment comparison only, never glob operator
    /// semantics.
    pub fn new(rules: RuleSet, case_sensitive: bool) -> Result<Self, GhostError> {
        let mut matchers = Vec::with_capacity(rules.len());

        for rule in rules.iter() {
            // literal_separator keeps `*` within one path segment; only `**`
            // may cross directory boundaries.
            let glob = GlobBuilder::new(&rule.pattern)
                .literal_separator(true)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| GhostError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    line: rule.source_line,
                    reason: e.to_string(),
                })?;
            matchers.push(glob.compile_matcher());
        }

        Ok(Self {
            rules,
            matchers,
            case_sensitive,
        })
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate `path` against the rule set, relative to `root`.
    ///
    /// `path` must be lexically contained within `root`; violation fails
    /// with `PathOutsideRoot`. The check is structural on path segments, so
    /// `root` does not need to exist on disk and symlink cycles elsewhere in
    /// the tree cannot make this loop.
    pub fn evaluate_path(&self, path: &Path, root: &Path) -> Result<MatchResult, GhostError> {
        let rel_path = rel_path_string(path, root)?;
        let decision = self.evaluate_rel(&rel_path);
        Ok(MatchResult { rel_path, decision })
    }

    /// Evaluate an already root-relative, slash-separated path.
    pub fn evaluate_rel(&self, rel_path: &str) -> MatchDecision {
        let mut decision = MatchDecision::no_match();

        // Last matching rule wins: keep overwriting the running decision.
        for (index, matcher) in self.matchers.iter().enumerate() {
            if matcher.is_match(rel_path) {
                decision = MatchDecision {
                    matched: true,
                    rule_index: Some(index),
                    rule: self.rules.get(index).cloned(),
                };
            }
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{parse_filter_text, RuleAction};

    fn engine(filter: &str, case_sensitive: bool) -> MatchEngine {
        let rules = parse_filter_text(filter, Path::new("test-filter.txt")).unwrap();
        MatchEngine::new(rules, case_sensitive).unwrap()
    }

    #[test]
    fn empty_rule_set_never_matches() {
        let engine = engine("", true);
        let result = engine
            .evaluate_path(Path::new("/root/a/b.txt"), Path::new("/root"))
            .unwrap();
        assert!(!result.decision.matched);
        assert_eq!(result.decision.rule_index, None);
        assert_eq!(result.decision.rule, None);
    }

    #[test]
    fn path_outside_root_fails_without_touching_disk() {
        let engine = engine("- **/*.tmp\n", true);
        let err = engine
            .evaluate_path(Path::new("/outside/b.tmp"), Path::new("/no/such/root"))
            .unwrap_err();
        assert!(matches!(err, GhostError::PathOutsideRoot { .. }));
    }

    #[test]
    fn hand_built_bad_pattern_fails_with_rule_identity() {
        // The parser validates patterns; a rule set built directly can
        // still carry a bad one, and the error must name it.
        let rules = RuleSet::new(vec![Rule {
            action: RuleAction::Exclude,
            pattern: "**/*.{tmp".to_string(),
            source_line: 3,
            label: None,
        }]);
        let err = MatchEngine::new(rules, true).unwrap_err();
        match err {
            GhostError::InvalidPattern { pattern, line, .. } => {
                assert_eq!(pattern, "**/*.{tmp");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn last_matching_rule_wins() {
        let engine = engine("- **/*.tmp\n- **/keep.tmp\n", true);
        let decision = engine.evaluate_rel("a/keep.tmp");
        assert!(decision.matched);
        assert_eq!(decision.rule_index, Some(1));

        let decision = engine.evaluate_rel("a/other.tmp");
        assert_eq!(decision.rule_index, Some(0));
    }

    #[test]
    fn star_does_not_cross_segments() {
        let engine = engine("- *.tmp\n", true);
        assert!(engine.evaluate_rel("b.tmp").matched);
        assert!(!engine.evaluate_rel("a/b.tmp").matched);
    }

    #[test]
    fn double_star_crosses_zero_or_more_segments() {
        let engine = engine("- **/*.tmp\n", true);
        assert!(engine.evaluate_rel("b.tmp").matched);
        assert!(engine.evaluate_rel("a/b.tmp").matched);
        assert!(engine.evaluate_rel("a/b/c/d.tmp").matched);
    }

    #[test]
    fn pattern_without_leading_double_star_is_anchored() {
        let engine = engine("- build/**\n", true);
        assert!(engine.evaluate_rel("build/out.o").matched);
        assert!(!engine.evaluate_rel("src/build/out.o").matched);
    }

    #[test]
    fn case_sensitivity_toggle() {
        let sensitive = engine("- **/Test.txt\n", true);
        assert!(!sensitive.evaluate_rel("a/test.txt").matched);
        assert!(sensitive.evaluate_rel("a/Test.txt").matched);

        let insensitive = engine("- **/Test.txt\n", false);
        assert!(insensitive.evaluate_rel("a/test.txt").matched);
    }

    #[test]
    fn deep_and_non_ascii_paths_match_by_extension() {
        let engine = engine("- **/*.log\n", true);

        let deep = (0..24).map(|i| format!("d{}", i)).collect::<Vec<_>>().join("/");
        assert!(engine.evaluate_rel(&format!("{}/tail.log", deep)).matched);
        assert!(!engine.evaluate_rel(&format!("{}/tail.txt", deep)).matched);

        assert!(engine.evaluate_rel("dir with spaces/файл 测试.log").matched);
        assert!(!engine.evaluate_rel("dir with spaces/файл 测试.txt").matched);
    }
}
