use super::*;
use std::collections::HashMap;
use std::time::Duration;

fn request(program: &str, args: &[&str]) -> SpawnRequest {
    SpawnRequest {
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        working_dir: None,
        env: HashMap::new(),
    }
}

#[tokio::test]
async fn spawn_captures_stdout_and_stderr_tagged_by_stream() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut child = SupervisedChild::spawn(
        request("/bin/sh", &["-c", "echo out-line; echo err-line 1>&2"]),
        tx,
    )
    .unwrap();

    child.wait().await.unwrap();

    let mut saw_stdout = false;
    let mut saw_stderr = false;
    while let Ok(Some(entry)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
        match entry.stream {
            StreamKind::Stdout if entry.line == "out-line" => saw_stdout = true,
            StreamKind::Stderr if entry.line == "err-line" => saw_stderr = true,
            _ => {}
        }
    }
    assert!(saw_stdout, "expected stdout line to be captured");
    assert!(saw_stderr, "expected stderr line to be captured");
}

#[tokio::test]
async fn is_running_reflects_child_lifecycle() {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let mut child = SupervisedChild::spawn(request("/bin/sh", &["-c", "sleep 0.2"]), tx).unwrap();
    assert!(child.is_running());
    child.wait().await.unwrap();
    assert!(!child.is_running());
    assert_eq!(child.exit_code(), Some(0));
}

#[tokio::test]
async fn terminate_reaps_a_process_that_honors_sigterm() {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let mut child = SupervisedChild::spawn(
        request("/bin/sh", &["-c", "trap 'exit 0' TERM; sleep 30"]),
        tx,
    )
    .unwrap();

    let outcome = child
        .terminate(Duration::from_secs(3))
        .await
        .unwrap();
    assert_eq!(outcome, TerminateOutcome::Graceful);
    assert!(!child.is_running());
}

#[tokio::test]
async fn terminate_escalates_to_kill_when_sigterm_is_ignored() {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let mut child = SupervisedChild::spawn(
        request("/bin/sh", &["-c", "trap '' TERM; sleep 30"]),
        tx,
    )
    .unwrap();

    let outcome = child
        .terminate(Duration::from_millis(300))
        .await
        .unwrap();
    assert_eq!(outcome, TerminateOutcome::Killed);
    assert!(!child.is_running());
}
