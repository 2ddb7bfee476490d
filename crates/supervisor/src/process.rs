// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-group based subprocess supervision (§4.5 C5).
//!
//! The child is spawned as the leader of its own process group so that
//! `terminate`/`kill` reach any grandchildren it forks (common for
//! training scripts that shell out to `torchrun` or similar). Only
//! implemented for Unix; there is no Windows process-group equivalent
//! in scope.

use crate::error::SupervisorError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub stream: StreamKind,
    pub line: String,
}

/// What happened to the child during `terminate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateOutcome {
    /// Exited on its own before the grace period elapsed.
    Graceful,
    /// Still alive after the grace period; `kill` was used to reap it.
    Killed,
}

pub struct SpawnRequest {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

pub struct SupervisedChild {
    child: tokio::process::Child,
    pgid: Pid,
    pumps: Vec<JoinHandle<()>>,
}

impl SupervisedChild {
    /// Spawn `request` as a new process group leader, piping stdout/stderr
    /// line-by-line onto `log_tx` tagged with their origin stream.
    pub fn spawn(
        request: SpawnRequest,
        log_tx: mpsc::UnboundedSender<LogLine>,
    ) -> Result<Self, SupervisorError> {
        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(&request.env)
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }
        // Make the child the leader of its own process group (pgid == pid)
        // so `terminate`/`kill` can signal the whole group, not just the
        // one pid, without reaching for an unsafe `pre_exec` hook.
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| SupervisorError::Spawn("child exited before pid was observed".into()))?;
        let pgid = Pid::from_raw(pid as i32);

        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(stdout, StreamKind::Stdout, log_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, StreamKind::Stderr, log_tx));
        }

        Ok(Self { child, pgid, pumps })
    }

    /// Non-blocking check; does not reap a zombie unless it has already exited.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn exit_code(&mut self) -> Option<i32> {
        match self.child.try_wait() {
            Ok(Some(status)) => status.code(),
            _ => None,
        }
    }

    pub async fn wait(&mut self) -> Result<std::process::ExitStatus, SupervisorError> {
        self.child
            .wait()
            .await
            .map_err(|e| SupervisorError::Wait(e.to_string()))
    }

    /// Send SIGTERM to the whole process group, then wait up to `grace`
    /// for exit before escalating to `kill`.
    pub async fn terminate(&mut self, grace: Duration) -> Result<TerminateOutcome, SupervisorError> {
        self.signal_group(Signal::SIGTERM)?;
        if tokio::time::timeout(grace, self.wait()).await.is_ok() {
            return Ok(TerminateOutcome::Graceful);
        }
        self.kill().await?;
        Ok(TerminateOutcome::Killed)
    }

    /// Send SIGKILL to the whole process group and reap it.
    pub async fn kill(&mut self) -> Result<(), SupervisorError> {
        let _ = self.signal_group(Signal::SIGKILL);
        let _ = self.wait().await;
        Ok(())
    }

    fn signal_group(&self, sig: Signal) -> Result<(), SupervisorError> {
        signal::killpg(self.pgid, sig).map_err(|source| SupervisorError::Signal {
            pgid: self.pgid.as_raw(),
            source,
        })
    }
}

impl Drop for SupervisedChild {
    fn drop(&mut self) {
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

fn spawn_pump<R>(
    reader: R,
    stream: StreamKind,
    tx: mpsc::UnboundedSender<LogLine>,
) -> JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(LogLine { stream, line }).is_err() {
                break;
            }
        }
    })
}
