// Tests for filter-file parsing against real files on disk
// Grammar-only tests live in src/rules.rs; these cover the read layer.

use std::fs;

use ghostsweep::error::GhostError;
use ghostsweep::rules::parse_filter_file;
use ghostsweep::RuleAction;

#[test]
fn test_parse_filter_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let filter = dir.path().join("filter.txt");
    fs::write(&filter, "# label: temp files\n- **/*.tmp\n+ **/*.txt\n").unwrap();

    let rules = parse_filter_file(&filter).unwrap();
    assert_eq!(rules.len(), 1);

    let rule = rules.get(0).unwrap();
    assert_eq!(rule.action, RuleAction::Exclude);
    assert_eq!(rule.pattern, "**/*.tmp");
    assert_eq!(rule.source_line, 2);
    assert_eq!(rule.label.as_deref(), Some("temp files"));
}

#[test]
fn test_parse_filter_file_nonexistent_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_filter_file(&dir.path().join("does_not_exist.txt")).unwrap_err();

    assert!(matches!(err, GhostError::FilterFileRead { .. }));
    assert!(format!("{}", err).contains("Failed to read filter file"));
}

#[test]
fn test_parse_filter_file_invalid_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let filter = dir.path().join("filter.txt");
    fs::write(&filter, b"\xff\xfe\x00\x01").unwrap();

    let err = parse_filter_file(&filter).unwrap_err();
    assert!(matches!(err, GhostError::FilterFileRead { .. }));
    assert!(format!("{}", err).contains("UTF-8"));
}

#[test]
fn test_parse_filter_file_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let filter = dir.path().join("empty.txt");
    fs::write(&filter, "").unwrap();

    assert!(parse_filter_file(&filter).unwrap().is_empty());
}

#[test]
fn test_parse_filter_file_include_only_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let filter = dir.path().join("filter.txt");
    fs::write(&filter, "+ **/*.txt\n+ **/*.md\n").unwrap();

    assert!(parse_filter_file(&filter).unwrap().is_empty());
}

#[test]
fn test_parse_filter_file_malformed_line_names_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let filter = dir.path().join("filter.txt");
    fs::write(&filter, "- fine/**\nnot a rule\n").unwrap();

    let err = parse_filter_file(&filter).unwrap_err();
    match err {
        GhostError::FilterFileParse { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {}", other),
    }
}
