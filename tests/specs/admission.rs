// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.7 / §8: admission strategies, queue FIFO ordering and cancellation.

use crate::support::{job_config, Entrypoint, TestDaemon};
use serde_json::Value;
use std::time::Duration;

async fn submit(client: &reqwest::Client, daemon: &TestDaemon, strategy: &str, model: &str) -> (u16, Value) {
    let resp = client
        .post(daemon.url("/jobs"))
        .query(&[("strategy", strategy)])
        .json(&job_config(model))
        .send()
        .await
        .expect("submit request");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("submit response body");
    (status, body)
}

async fn get_job(client: &reqwest::Client, daemon: &TestDaemon, job_id: &str) -> Value {
    client
        .get(daemon.url(&format!("/jobs/{job_id}")))
        .send()
        .await
        .expect("get job")
        .json()
        .await
        .expect("job body")
}

async fn poll_until_terminal(client: &reqwest::Client, daemon: &TestDaemon, job_id: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        let job = get_job(client, daemon, job_id).await;
        let status = job["status"].as_str().unwrap_or_default();
        if matches!(status, "completed" | "failed" | "cancelled") {
            return job;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("job {job_id} did not reach a terminal state in time: {job:?}");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// `strategy=reject` must fail a second submission the instant the first
/// one holds the run token, regardless of how long the child itself runs:
/// the daemon decides admission synchronously inside `submit`, before the
/// worker task (and its subprocess) is even spawned.
#[tokio::test]
async fn reject_strategy_rejects_while_a_job_is_running() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(3)).await;
    let client = reqwest::Client::new();

    let (status_a, body_a) = submit(&client, &daemon, "queue", "alpha").await;
    assert_eq!(status_a, 201);
    assert_eq!(body_a["status"], "started");

    let (status_b, body_b) = submit(&client, &daemon, "reject", "beta").await;
    assert_eq!(status_b, 409, "second submission should be rejected: {body_b:?}");

    let queue = client.get(daemon.url("/queue")).send().await.unwrap().json::<Value>().await.unwrap();
    assert_eq!(queue["holding"], true);
    assert_eq!(queue["queue_length"], 0);
}

/// `strategy=queue` enqueues behind a running job with a 1-based
/// `queue_position`, and the queued job is admitted (and eventually
/// finishes) once the first one vacates the run token.
#[tokio::test]
async fn queue_strategy_runs_jobs_in_fifo_order() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(2)).await;
    let client = reqwest::Client::new();

    let (status_a, body_a) = submit(&client, &daemon, "queue", "alpha").await;
    assert_eq!(status_a, 201);
    assert_eq!(body_a["status"], "started");
    let job_a = body_a["job_id"].as_str().unwrap().to_string();

    let (status_b, body_b) = submit(&client, &daemon, "queue", "beta").await;
    assert_eq!(status_b, 201);
    assert_eq!(body_b["status"], "queued");
    let job_b = body_b["job_id"].as_str().unwrap().to_string();

    let queued_snapshot = get_job(&client, &daemon, &job_b).await;
    assert_eq!(queued_snapshot["queue_position"], 1);

    let finished_a = poll_until_terminal(&client, &daemon, &job_a).await;
    assert_eq!(finished_a["status"], "completed");

    let finished_b = poll_until_terminal(&client, &daemon, &job_b).await;
    assert_eq!(finished_b["status"], "completed");
    assert!(finished_b.get("queue_position").is_none(), "position clears once running");
}

/// Cancelling a queued job removes it from the queue and moves it
/// straight to `cancelled` without ever running.
#[tokio::test]
async fn cancel_removes_a_queued_job() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(5)).await;
    let client = reqwest::Client::new();

    let (_, body_a) = submit(&client, &daemon, "queue", "alpha").await;
    let job_a = body_a["job_id"].as_str().unwrap().to_string();

    let (status_b, body_b) = submit(&client, &daemon, "queue", "beta").await;
    assert_eq!(status_b, 201);
    assert_eq!(body_b["status"], "queued");
    let job_b = body_b["job_id"].as_str().unwrap().to_string();

    let cancel_resp = client.delete(daemon.url(&format!("/jobs/{job_b}"))).send().await.unwrap();
    assert_eq!(cancel_resp.status().as_u16(), 200);

    let cancelled = get_job(&client, &daemon, &job_b).await;
    assert_eq!(cancelled["status"], "cancelled");

    let queue = client.get(daemon.url("/queue")).send().await.unwrap().json::<Value>().await.unwrap();
    assert_eq!(queue["queue_length"], 0);

    // Job A is untouched by B's cancellation and keeps running.
    let still_running = get_job(&client, &daemon, &job_a).await;
    assert_eq!(still_running["status"], "running");
}

/// In-flight cancellation is an explicit open question resolved as
/// "not implemented": the daemon refuses with a descriptive 400 rather
/// than silently no-opping or tearing down the child.
#[tokio::test]
async fn cancel_refuses_a_running_job() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(3)).await;
    let client = reqwest::Client::new();

    let (_, body_a) = submit(&client, &daemon, "queue", "alpha").await;
    let job_a = body_a["job_id"].as_str().unwrap().to_string();

    let cancel_resp = client.delete(daemon.url(&format!("/jobs/{job_a}"))).send().await.unwrap();
    assert_eq!(cancel_resp.status().as_u16(), 400);
    let body: Value = cancel_resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap_or_default().contains("not implemented"));
}

/// Cancelling, fetching or re-cancelling a job id that was never
/// submitted is a 404, not a panic.
#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(1)).await;
    let client = reqwest::Client::new();

    let resp = client.get(daemon.url("/jobs/does-not-exist")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = client.delete(daemon.url("/jobs/does-not-exist")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
