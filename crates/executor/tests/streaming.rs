#![cfg(unix)]

use execstream_executor::CommandExecutor;
use execstream_protocol::{Event, EventKind, Framer};
use std::time::Duration;

fn texts(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.kind == EventKind::Text)
        .filter_map(|e| e.content.as_text().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_echo_scenario() {
    let executor = CommandExecutor::from_current_dir().unwrap();
    let (framer, sink) = Framer::memory();
    let stream = framer.stream("s1");

    let report = executor
        .run("echo hi", Some(std::path::Path::new(".")), &stream)
        .await;

    assert!(report.succeeded());
    let events = sink.events();
    let texts = texts(&events);
    assert!(texts[0].contains("echo hi"));
    assert!(texts.iter().any(|t| t == "hi"));
    assert!(texts
        .iter()
        .any(|t| t == "Command executed with return code: 0"));

    let last = events.last().unwrap();
    assert!(last.is_end);
    assert_eq!(last.sequence_id, "s1");
    assert_eq!(events.iter().filter(|e| e.is_end).count(), 1);
    assert!(events.iter().all(|e| e.sequence_id == "s1"));
}

#[tokio::test]
async fn test_missing_command_reports_error() {
    let executor = CommandExecutor::from_current_dir().unwrap();
    let (framer, sink) = Framer::memory();

    let report = executor
        .run("nonexistent_command_xyz", None, &framer.stream("s2"))
        .await;

    assert_ne!(report.exit_code, Some(0));
    let events = sink.events();
    let end_index = events.iter().position(|e| e.is_end).unwrap();
    assert_eq!(end_index, events.len() - 1);
    assert!(events[..end_index].iter().any(|e| e.is_failure()));
}

#[tokio::test]
async fn test_stderr_lines_become_error_events() {
    let executor = CommandExecutor::from_current_dir().unwrap();
    let (framer, sink) = Framer::memory();

    executor
        .run("echo out; echo err 1>&2", None, &framer.stream("s3"))
        .await;

    let events = sink.events();
    let stderr: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::Error)
        .collect();
    assert_eq!(stderr.len(), 1);
    assert_eq!(stderr[0].content.as_text(), Some("err"));
    assert!(stderr[0].is_error);
    assert!(texts(&events).iter().any(|t| t == "out"));
}

#[tokio::test]
async fn test_interleaved_streams_do_not_deadlock() {
    let executor = CommandExecutor::from_current_dir().unwrap();
    let (framer, sink) = Framer::memory();
    // Enough output on both pipes to exceed their buffers.
    let command = "i=0; while [ $i -lt 20000 ]; do echo out$i; echo err$i 1>&2; i=$((i+1)); done";

    let report = tokio::time::timeout(
        Duration::from_secs(60),
        executor.run(command, None, &framer.stream("big")),
    )
    .await
    .expect("command drained without deadlock");

    assert_eq!(report.exit_code, Some(0));
    assert_eq!(report.stdout_lines, 20000);
    assert_eq!(report.stderr_lines, 20000);
    assert!(sink.events().last().unwrap().is_end);
}

#[tokio::test]
async fn test_runs_in_project_dir_without_changing_worker_dir() {
    let project = tempfile::tempdir().unwrap();
    let project_path = project.path().canonicalize().unwrap();
    let before = std::env::current_dir().unwrap();

    let executor = CommandExecutor::from_current_dir().unwrap();
    let (framer, sink) = Framer::memory();
    let report = executor
        .run("pwd -P", Some(&project_path), &framer.stream("dir"))
        .await;

    assert_eq!(report.working_dir, project_path);
    let expected = project_path.display().to_string();
    assert!(texts(&sink.events()).iter().any(|t| *t == expected));
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[tokio::test]
async fn test_missing_project_dir_falls_back() {
    let base = tempfile::tempdir().unwrap();
    let base_path = base.path().canonicalize().unwrap();
    let executor = CommandExecutor::new(base_path.clone());
    let (framer, sink) = Framer::memory();

    let report = executor
        .run(
            "pwd -P",
            Some(std::path::Path::new("/no/such/project/dir")),
            &framer.stream("fallback"),
        )
        .await;

    assert_eq!(report.working_dir, base_path);
    let expected = base_path.display().to_string();
    assert!(texts(&sink.events()).iter().any(|t| *t == expected));
}

#[tokio::test]
async fn test_listing_command_gets_one_suggestion() {
    let executor = CommandExecutor::from_current_dir().unwrap();
    let (framer, sink) = Framer::memory();

    let report = executor.run("ls", None, &framer.stream("ls")).await;

    assert!(report.suggestion.is_some());
    let events = sink.events();
    let commands: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::Command)
        .collect();
    assert_eq!(commands.len(), 1);
    let n = events.len();
    assert_eq!(events[n - 2].kind, EventKind::Command);
    assert!(events[n - 1].is_end);
}
