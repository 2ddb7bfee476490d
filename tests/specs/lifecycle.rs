// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.5 / §4.7: a job whose child exits non-zero ends up `failed` with an
//! error message, and the run token is released so the queue keeps moving.

use crate::support::{job_config, Entrypoint, TestDaemon};
use serde_json::Value;
use std::time::Duration;

async fn poll_until_terminal(client: &reqwest::Client, daemon: &TestDaemon, job_id: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        let job: Value = client
            .get(daemon.url(&format!("/jobs/{job_id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
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

#[tokio::test]
async fn a_nonzero_child_exit_fails_the_job_and_frees_the_run_token() {
    let daemon = TestDaemon::spawn(Entrypoint::ExitCode(7)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(daemon.url("/jobs"))
        .query(&[("strategy", "queue")])
        .json(&job_config("alpha"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let finished = poll_until_terminal(&client, &daemon, &job_id).await;
    assert_eq!(finished["status"], "failed");
    assert!(finished["error"].as_str().unwrap_or_default().contains("exit code 7"));

    // The run token was released: a second job can now be admitted
    // immediately instead of queueing.
    let resp = client
        .post(daemon.url("/jobs"))
        .query(&[("strategy", "reject")])
        .json(&job_config("beta"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "started");
}

#[tokio::test]
async fn list_jobs_reflects_every_submission() {
    let daemon = TestDaemon::spawn(Entrypoint::ExitCode(0)).await;
    let client = reqwest::Client::new();

    for name in ["alpha", "beta"] {
        let resp = client
            .post(daemon.url("/jobs"))
            .query(&[("strategy", "queue")])
            .json(&job_config(name))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
    }

    let jobs: Vec<Value> = client.get(daemon.url("/jobs")).send().await.unwrap().json().await.unwrap();
    assert_eq!(jobs.len(), 2);
    let names: Vec<&str> = jobs.iter().map(|j| j["config"]["model_name"].as_str().unwrap()).collect();
    assert!(names.contains(&"alpha"));
    assert!(names.contains(&"beta"));
}
