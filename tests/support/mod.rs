// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness shared by the workspace-level spec tests: spawns the real
//! `jobcored` binary against a scratch output directory and a mock
//! tracker backend, and tears it down on drop.

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WANDB_ENTITY: &str = "test-entity";
pub const WANDB_PROJECT: &str = "test-project";

/// What the daemon's single subprocess entrypoint does, for the
/// duration of one [`TestDaemon`] instance.
pub enum Entrypoint {
    /// Sleeps for the given number of seconds, then exits 0.
    Sleep(u64),
    /// Exits immediately with the given status code.
    ExitCode(i32),
}

pub struct TestDaemon {
    child: Child,
    pub base_url: String,
    pub output_root: TempDir,
    // Held for the daemon's lifetime; dropping it tears down the mock server.
    _tracker: MockServer,
}

impl TestDaemon {
    /// Start a `jobcored` instance bound to a free loopback port, wired to
    /// a mock wandb tracker that accepts any run and a subprocess
    /// entrypoint behaving as `kind` describes.
    pub async fn spawn(kind: Entrypoint) -> Self {
        let tracker = mock_wandb_server().await;
        let output_root = TempDir::new().expect("tempdir");
        let script_path = write_entrypoint_script(&output_root, kind);
        let port = free_port();
        let base_url = format!("http://127.0.0.1:{port}");

        let child = Command::new(jobcored_bin())
            .env("JOBCORE_BIND_ADDR", format!("127.0.0.1:{port}"))
            .env("JOBCORE_OUTPUT_ROOT", output_root.path())
            .env("JOBCORE_PYTHON_BIN", "/bin/sh")
            .env("JOBCORE_TRAIN_ENTRYPOINT", &script_path)
            .env("JOBCORE_MONITOR_INTERVAL_SECS", "1")
            .env("JOBCORE_STALL_TIMEOUT_SECS", "30")
            .env("JOBCORE_UPLOAD_TIMEOUT_SECS", "10")
            .env("JOBCORE_MAX_WAIT_SECS", "10")
            .env("TRACKING_BACKEND", "wandb")
            .env("WANDB_API_KEY", "test-key")
            .env("WANDB_ENTITY", WANDB_ENTITY)
            .env("WANDB_PROJECT", WANDB_PROJECT)
            .env("WANDB_BASE_URL", tracker.uri())
            .env("RUST_LOG", "error")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn jobcored");

        let daemon = Self { child, base_url, output_root, _tracker: tracker };
        daemon.wait_ready().await;
        daemon
    }

    async fn wait_ready(&self) {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            if client.get(format!("{}/queue", self.base_url)).send().await.is_ok() {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("jobcored did not become ready within the deadline");
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn jobcored_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("jobcored")
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local_addr").port()
}

fn write_entrypoint_script(root: &TempDir, kind: Entrypoint) -> PathBuf {
    let body = match kind {
        Entrypoint::Sleep(secs) => format!("#!/bin/sh\nsleep {secs}\nexit 0\n"),
        Entrypoint::ExitCode(code) => format!("#!/bin/sh\nexit {code}\n"),
    };
    let script_path = root.path().join("entrypoint.sh");
    std::fs::write(&script_path, body).expect("write entrypoint script");
    script_path
}

/// Mount the two wandb endpoints the daemon actually calls when a job
/// runs to completion: run creation and run finish. No credentials are
/// checked; any bearer token is accepted.
async fn mock_wandb_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(format!("^/{WANDB_ENTITY}/{WANDB_PROJECT}/runs/.*/finish$")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    server
}

pub fn job_config(model_name: &str) -> serde_json::Value {
    serde_json::json!({ "model_name": model_name })
}
