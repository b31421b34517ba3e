//! `restore`, `cleanup` and `replace-converted`: file level recovery.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::warn;

use ffshepherd_core::{BackupManager, Config, RestoreReport};

use super::confirm;

pub async fn restore(
    config: &Config,
    input_dir: &Path,
    purge: bool,
    yes: bool,
) -> Result<ExitCode> {
    let manager = BackupManager::new();
    let backup_dir = input_dir.join(&config.pipeline.backup_dir_name);

    let report = restore_from(&manager, &backup_dir, input_dir).await?;

    if purge
        && report.failed.is_empty()
        && confirm(&format!("Delete backup folder {}?", backup_dir.display()), yes)?
    {
        manager
            .purge_backups(&backup_dir)
            .await
            .context("Failed to delete backups")?;
        println!("Deleted {}", backup_dir.display());
    }

    Ok(if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Asks about each recovery step in turn: restore, delete backups, delete temp.
pub async fn cleanup(
    config: &Config,
    input_dir: &Path,
    temp_dir: &Path,
    yes: bool,
) -> Result<ExitCode> {
    let manager = BackupManager::new();
    let backup_dir = input_dir.join(&config.pipeline.backup_dir_name);
    let mut clean = true;

    if confirm("Restore original files from backup?", yes)? {
        let report = restore_from(&manager, &backup_dir, input_dir).await?;
        clean &= report.failed.is_empty();
    }

    if confirm(&format!("Delete backup folder {}?", backup_dir.display()), yes)?
        && manager.purge_backups(&backup_dir).await?
    {
        println!("Deleted {}", backup_dir.display());
    }

    if confirm(&format!("Delete temp folder {}?", temp_dir.display()), yes)?
        && manager.purge_temp(temp_dir).await?
    {
        println!("Deleted {}", temp_dir.display());
    }

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn replace_converted(dir: &Path, marker: &str) -> Result<ExitCode> {
    let report = BackupManager::new()
        .replace_converted(dir, marker)
        .await
        .with_context(|| format!("Failed to scan {:?}", dir))?;

    for path in &report.missing_original {
        println!("  no original for {}", path.display());
    }
    for failure in &report.failed {
        warn!(file = %failure.path.display(), "Replace failed: {}", failure.error);
    }
    println!(
        "{} converted files found, {} replaced",
        report.found,
        report.replaced.len()
    );

    Ok(if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn restore_from(
    manager: &BackupManager,
    backup_dir: &Path,
    target_dir: &Path,
) -> Result<RestoreReport> {
    let report = manager
        .restore_all(backup_dir, target_dir)
        .await
        .with_context(|| format!("Failed to restore from {:?}", backup_dir))?;

    for failure in &report.failed {
        warn!(file = %failure.path.display(), "Restore failed: {}", failure.error);
    }
    println!("Restored {} files", report.restored_count());
    Ok(report)
}
