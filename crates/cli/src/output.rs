// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::{JobSnapshot, QueueState, SubmitResponse};
use crate::color;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render `epoch_secs` as time elapsed since now (e.g. "5s", "2m", "1h").
pub fn format_elapsed(epoch_secs: u64) -> String {
    if epoch_secs == 0 {
        return "-".to_string();
    }
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let elapsed = now.saturating_sub(epoch_secs);
    match elapsed {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

pub fn print_submit(response: &SubmitResponse, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(response);
    }
    println!(
        "{} {}  {}",
        color::state(&response.status),
        color::header(&response.job_id),
        response.message,
    );
    Ok(())
}

pub fn print_job(job: &JobSnapshot, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(job);
    }
    println!("{}  {}", color::header(&job.job_id), color::state(&job.status));
    println!("  model        {}", job.config.model_name);
    println!("  enqueued     {} ago", format_elapsed(job.start_time));
    if let Some(end_time) = job.end_time {
        println!("  ended        {} ago", format_elapsed(end_time));
    }
    if let Some(pos) = job.queue_position {
        println!("  queue pos    {pos}");
    }
    if let Some(url) = &job.tracking_url {
        println!("  tracking_url {}", color::muted(url));
    }
    if let Some(path) = &job.output_path {
        println!("  output_path  {path}");
    }
    if let Some(error) = &job.error {
        println!("  error        {error}");
    }
    Ok(())
}

pub fn print_jobs(jobs: &[JobSnapshot], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(jobs);
    }
    if jobs.is_empty() {
        println!("no jobs");
        return Ok(());
    }
    println!(
        "{:<27} {:<10} {:<24} {:<8} {}",
        color::header("JOB ID"),
        color::header("STATUS"),
        color::header("MODEL"),
        color::header("AGE"),
        color::header("TRACKING")
    );
    for job in jobs {
        println!(
            "{:<27} {:<10} {:<24} {:<8} {}",
            job.job_id,
            color::state(&job.status),
            job.config.model_name,
            format_elapsed(job.start_time),
            job.tracking_url.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub fn print_queue(queue: &QueueState, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(queue);
    }
    println!(
        "holding: {}   queue_length: {}",
        if queue.holding { color::state("running") } else { color::muted("idle") },
        queue.queue_length,
    );
    for (idx, id) in queue.queued_ids.iter().enumerate() {
        println!("  {}. {id}", idx + 1);
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
