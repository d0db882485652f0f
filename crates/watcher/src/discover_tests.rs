use super::*;
use std::fs;

#[test]
fn discovers_jsonl_files_recursively() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("abc-123.jsonl"), "").unwrap();
    fs::write(dir.path().join("nested").join("def-456.jsonl"), "").unwrap();
    fs::write(dir.path().join("ignored.txt"), "").unwrap();

    let mut found = discover_logs(dir.path());
    found.sort_by(|a, b| a.cli_session_id.as_str().cmp(b.cli_session_id.as_str()));

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].cli_session_id.as_str(), "abc-123");
    assert_eq!(found[1].cli_session_id.as_str(), "def-456");
}

#[test]
fn missing_root_returns_empty() {
    let found = discover_logs(Path::new("/nonexistent/path/does/not/exist"));
    assert!(found.is_empty());
}

#[test]
fn derives_cli_session_id_from_filename() {
    let id = cli_session_id_from_path(Path::new("/tmp/foo/bar-baz.jsonl")).unwrap();
    assert_eq!(id.as_str(), "bar-baz");
}
