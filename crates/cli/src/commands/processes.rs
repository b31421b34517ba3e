//! `kill` and `status`: act on the running ffmpeg processes directly.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::json;

use ffshepherd_core::Config;

use super::governor;

pub async fn kill(config: &Config) -> Result<ExitCode> {
    let name = &config.governor.process_name;
    let count = governor(config)
        .kill_all(name)
        .await
        .with_context(|| format!("Failed to kill {} processes", name))?;
    println!("Killed {} {} processes", count, name);
    Ok(ExitCode::SUCCESS)
}

pub async fn status(config: &Config, json: bool) -> Result<ExitCode> {
    let governor = governor(config);
    let processes = governor
        .processes()
        .await
        .context("Failed to list processes")?;
    let max = config.governor.max_processes;
    let free = processes.len() < max;

    if json {
        let out = json!({
            "process_name": config.governor.process_name,
            "max_processes": max,
            "slot_free": free,
            "processes": processes,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{} {} processes running (limit {}), slot {}",
        processes.len(),
        config.governor.process_name,
        max,
        if free { "free" } else { "not free" }
    );
    for record in &processes {
        println!(
            "  {:>7}  {}  {}",
            record.pid,
            record.start_time.format("%Y-%m-%d %H:%M:%S"),
            record.executable_name
        );
    }
    Ok(ExitCode::SUCCESS)
}
