use super::*;
use cso_core::CliSessionId;
use std::io::Write as _;

fn user_line(message_id: &str) -> String {
    format!(r#"{{"type":"user","messageId":"{message_id}"}}"#)
}

fn assistant_line(message_id: &str, text: &str, stop_reason: Option<&str>) -> String {
    let stop = match stop_reason {
        Some(r) => format!(r#","stop_reason":"{r}""#),
        None => String::new(),
    };
    format!(
        r#"{{"type":"assistant","messageId":"{message_id}","message":{{"content":[{{"type":"text","text":"{text}"}}]{stop}}}}}"#
    )
}

#[test]
fn first_record_emits_session_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sess.jsonl");
    std::fs::write(&path, format!("{}\n", user_line("m1"))).unwrap();

    let mut stream = LogStream::new(CliSessionId::new("sess"), path, 0);
    let events = stream.poll();

    assert!(matches!(events[0], WatchEvent::SessionStart { .. }));
    assert!(events.iter().any(|e| matches!(e, WatchEvent::CorrelationCandidate { .. })));
    assert!(events.iter().any(|e| matches!(e, WatchEvent::UserPromptSubmit { .. })));
}

#[test]
fn assistant_text_and_end_of_turn() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sess.jsonl");
    std::fs::write(&path, format!("{}\n", assistant_line("m2", "hello", Some("end_turn")))).unwrap();

    let mut stream = LogStream::new(CliSessionId::new("sess"), path, 0);
    let events = stream.poll();

    assert!(events.iter().any(|e| matches!(e, WatchEvent::AssistantFirstResponse { .. })));
    assert!(events.iter().any(|e| matches!(e, WatchEvent::AssistantText { text, .. } if text == "hello")));
    assert!(events.iter().any(|e| matches!(e, WatchEvent::Stop { .. })));
}

#[test]
fn assistant_first_response_only_fires_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sess.jsonl");
    std::fs::write(
        &path,
        format!("{}\n{}\n", assistant_line("m1", "a", None), assistant_line("m2", "b", None)),
    )
    .unwrap();

    let mut stream = LogStream::new(CliSessionId::new("sess"), path, 0);
    let events = stream.poll();

    let first_response_count =
        events.iter().filter(|e| matches!(e, WatchEvent::AssistantFirstResponse { .. })).count();
    assert_eq!(first_response_count, 1);
}

#[test]
fn partial_trailing_line_is_buffered_until_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sess.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{}\n{}", user_line("m1"), r#"{"type":"user","messageId":"m2""#).unwrap();
    drop(file);

    let mut stream = LogStream::new(CliSessionId::new("sess"), path.clone(), 0);
    let events = stream.poll();
    // Only the complete first line is parsed; the partial second line is not.
    assert_eq!(events.iter().filter(|e| matches!(e, WatchEvent::UserPromptSubmit { .. })).count(), 1);

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, r#""}}"#).unwrap();
    drop(file);

    let events = stream.poll();
    assert_eq!(events.iter().filter(|e| matches!(e, WatchEvent::UserPromptSubmit { .. })).count(), 1);
}

#[test]
fn truncation_resets_offset_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sess.jsonl");
    std::fs::write(&path, format!("{}\n{}\n", user_line("m1"), user_line("m2"))).unwrap();

    let mut stream = LogStream::new(CliSessionId::new("sess"), path.clone(), 0);
    stream.poll();

    std::fs::write(&path, format!("{}\n", user_line("m3"))).unwrap();
    let events = stream.poll();

    // Offset is reset to 0 so the truncated-and-rewritten content is re-read,
    // even though `sessionStart` itself only fires once per `LogStream`.
    assert_eq!(events.iter().filter(|e| matches!(e, WatchEvent::UserPromptSubmit { .. })).count(), 1);
}

#[test]
fn start_offset_skips_pre_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sess.jsonl");
    let content = format!("{}\n", user_line("m1"));
    std::fs::write(&path, &content).unwrap();

    let mut stream = LogStream::new(CliSessionId::new("sess"), path.clone(), content.len() as u64);
    let events = stream.poll();
    assert!(events.is_empty());

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "{}", user_line("m2")).unwrap();
    drop(file);

    let events = stream.poll();
    assert!(!events.is_empty());
}
