// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jobcorectl` driven against a real `jobcored` instance, in JSON mode so
//! assertions don't have to parse ANSI-colored table text.

use crate::support::{Entrypoint, TestDaemon};
use assert_cmd::Command;
use serde_json::Value;

fn jobcorectl(daemon: &TestDaemon) -> Command {
    let mut cmd = Command::cargo_bin("jobcorectl").expect("find jobcorectl binary");
    cmd.arg("--daemon-url").arg(&daemon.base_url).arg("--format").arg("json");
    cmd
}

fn parse_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("jobcorectl stdout is valid json")
}

#[tokio::test]
async fn submit_status_and_list_round_trip() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(3)).await;

    let submit_out = jobcorectl(&daemon)
        .args(["submit", "demo-model", "--strategy", "queue"])
        .output()
        .expect("run jobcorectl submit");
    assert!(submit_out.status.success(), "{submit_out:?}");
    let submit_body = parse_stdout(&submit_out);
    assert_eq!(submit_body["status"], "started");
    let job_id = submit_body["job_id"].as_str().unwrap().to_string();

    let status_out = jobcorectl(&daemon).args(["status", &job_id]).output().expect("run jobcorectl status");
    assert!(status_out.status.success());
    let status_body = parse_stdout(&status_out);
    assert_eq!(status_body["config"]["model_name"], "demo-model");

    let list_out = jobcorectl(&daemon).arg("list").output().expect("run jobcorectl list");
    assert!(list_out.status.success());
    let jobs = parse_stdout(&list_out);
    assert_eq!(jobs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn queue_and_cancel_via_cli() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(5)).await;

    jobcorectl(&daemon)
        .args(["submit", "alpha", "--strategy", "queue"])
        .output()
        .expect("submit alpha");

    let submit_beta = jobcorectl(&daemon)
        .args(["submit", "beta", "--strategy", "queue"])
        .output()
        .expect("submit beta");
    let beta_body = parse_stdout(&submit_beta);
    assert_eq!(beta_body["status"], "queued");
    let beta_id = beta_body["job_id"].as_str().unwrap().to_string();

    let queue_out = jobcorectl(&daemon).arg("queue").output().expect("run jobcorectl queue");
    let queue_body = parse_stdout(&queue_out);
    assert_eq!(queue_body["holding"], true);
    assert_eq!(queue_body["queue_length"], 1);

    let cancel_out = jobcorectl(&daemon).args(["cancel", &beta_id]).output().expect("run jobcorectl cancel");
    assert!(cancel_out.status.success(), "{cancel_out:?}");

    let status_out = jobcorectl(&daemon).args(["status", &beta_id]).output().expect("run jobcorectl status");
    let status_body = parse_stdout(&status_out);
    assert_eq!(status_body["status"], "cancelled");
}

#[tokio::test]
async fn status_of_unknown_job_fails_with_nonzero_exit() {
    let daemon = TestDaemon::spawn(Entrypoint::Sleep(1)).await;

    let out = jobcorectl(&daemon).args(["status", "job-does-not-exist"]).output().expect("run jobcorectl status");
    assert!(!out.status.success());
}
