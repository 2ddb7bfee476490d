use super::*;
use jobcore_core::{LogCursor, TrackingBackend};
use jobcore_trackers::NullTracker;

fn config() -> MonitorLoopConfig {
    MonitorLoopConfig {
        poll_interval: Duration::from_millis(10),
        stall_timeout: Duration::from_millis(30),
        upload_timeout: Duration::from_millis(30),
        model_name: "test-model".to_string(),
        register: false,
        collection: "sft-collection".to_string(),
        registry: "models".to_string(),
        trigger_eval: false,
        eval_server_url: None,
        eval_context: EvalTriggerContext {
            base_model_name: "base".to_string(),
            data_version: None,
            tracking_backend: TrackingBackend::Wandb,
            train_id: "job-1".to_string(),
        },
    }
}

#[test]
fn ticks_for_rounds_up_and_never_returns_zero() {
    assert_eq!(ticks_for(Duration::from_millis(100), Duration::from_millis(30)), 4);
    assert_eq!(ticks_for(Duration::from_millis(30), Duration::from_millis(30)), 1);
    assert_eq!(ticks_for(Duration::from_millis(1), Duration::from_secs(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn no_activity_ever_triggers_a_stall_error() {
    let dir = tempfile::tempdir().unwrap();
    let tailer = LogTailer::new(dir.path().join("trainer_log.jsonl"), LogCursor::new(0));
    let watcher = CheckpointWatcher::new(dir.path());
    let tracker = Arc::new(NullTracker::new());
    let monitor = MonitorLoop::new(config(), tailer, watcher, tracker);

    let (_completed_tx, completed_rx) = watch::channel(false);

    let result = monitor.run(completed_rx).await;
    assert!(matches!(result, Err(MonitorError::Stalled(_))));
}

#[tokio::test(start_paused = true)]
async fn completion_with_no_pending_checkpoints_resolves_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let tailer = LogTailer::new(dir.path().join("trainer_log.jsonl"), LogCursor::new(0));
    let watcher = CheckpointWatcher::new(dir.path());
    let tracker = Arc::new(NullTracker::new());
    let monitor = MonitorLoop::new(config(), tailer, watcher, tracker);

    let (completed_tx, completed_rx) = watch::channel(false);
    completed_tx.send(true).unwrap();

    let result = monitor.run(completed_rx).await;
    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn log_activity_resets_the_stall_counter_and_forwards_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("trainer_log.jsonl");
    std::fs::write(&log_path, "{\"loss\": 0.9}\n").unwrap();
    let tailer = LogTailer::new(log_path.clone(), LogCursor::new(0));
    let watcher = CheckpointWatcher::new(dir.path());
    let tracker = Arc::new(NullTracker::new());
    let init_tracker = tracker.clone();
    init_tracker
        .init_run("job", &std::collections::BTreeMap::new(), None)
        .await
        .unwrap();
    let monitor = MonitorLoop::new(config(), tailer, watcher, tracker.clone());

    let (_completed_tx, completed_rx) = watch::channel(false);
    let result = monitor.run(completed_rx).await;
    assert!(matches!(result, Err(MonitorError::Stalled(_))));

    let calls = tracker.calls();
    assert!(calls.iter().any(|c| matches!(c, jobcore_trackers::RecordedCall::LogMetric { key, .. } if key == "loss")));
}
