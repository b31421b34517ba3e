//! File system backup manager implementation.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use crate::metrics;

use super::error::BackupError;
use super::types::{BackupEntry, FileFailure, ReplaceReport, RestoreReport};

const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;
const STAGING_SUFFIX: &str = ".partial";

/// Backs up originals, swaps in new content and restores on demand.
///
/// Every write lands in a hidden sibling staging file first and is renamed
/// into place, so a destination is never left half-written.
#[derive(Debug, Clone)]
pub struct BackupManager {
    buffer_size: usize,
    verify: bool,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BackupManager {
    /// Creates a manager that verifies backups by SHA-256.
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            verify: true,
        }
    }

    /// Enables or disables checksum verification of backups.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Sets the copy buffer size.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(4096);
        self
    }

    /// Copies `path` into `backup_dir` under the same name.
    ///
    /// An existing backup of the same name is overwritten (last backup wins).
    pub async fn backup(&self, path: &Path, backup_dir: &Path) -> Result<BackupEntry, BackupError> {
        let result = self.backup_inner(path, backup_dir).await;
        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::BACKUPS_TOTAL.with_label_values(&[label]).inc();
        result
    }

    async fn backup_inner(
        &self,
        path: &Path,
        backup_dir: &Path,
    ) -> Result<BackupEntry, BackupError> {
        let name = file_name(path)?;
        fs::create_dir_all(backup_dir)
            .await
            .map_err(|e| BackupError::DirectoryCreationFailed {
                path: backup_dir.to_path_buf(),
                source: e,
            })?;

        let destination = backup_dir.join(name);
        let (size_bytes, checksum) = self.copy_into_place(path, &destination, self.verify).await?;

        if let Some(ref expected) = checksum {
            let actual = self.sha256_file(&destination).await?;
            if &actual != expected {
                let _ = fs::remove_file(&destination).await;
                return Err(BackupError::ChecksumMismatch {
                    path: destination,
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        debug!(file = %path.display(), backup = %destination.display(), "Backed up original");
        Ok(BackupEntry {
            original: path.to_path_buf(),
            backup: destination,
            size_bytes,
            checksum,
        })
    }

    /// Overwrites `original_path` with the content of `new_content_path`,
    /// carrying over the new content's timestamps and permissions.
    ///
    /// Returns the number of bytes written.
    pub async fn replace(
        &self,
        original_path: &Path,
        new_content_path: &Path,
    ) -> Result<u64, BackupError> {
        let (size, _) = self
            .copy_into_place(new_content_path, original_path, false)
            .await?;
        debug!(file = %original_path.display(), "Replaced file content");
        Ok(size)
    }

    /// Copies every file in `backup_dir` over its same-named counterpart in
    /// `target_dir`.
    ///
    /// Per-file failures are recorded and do not stop the remaining restores.
    /// A missing or empty backup directory yields an empty report and no writes.
    pub async fn restore_all(
        &self,
        backup_dir: &Path,
        target_dir: &Path,
    ) -> Result<RestoreReport, BackupError> {
        let mut report = RestoreReport::default();
        let backups = match list_files(backup_dir).await? {
            Some(files) => files,
            None => {
                info!(dir = %backup_dir.display(), "No backup directory found");
                return Ok(report);
            }
        };

        for backup in backups {
            let Some(name) = backup.file_name() else {
                continue;
            };
            let target = target_dir.join(name);
            match self.copy_into_place(&backup, &target, false).await {
                Ok(_) => {
                    info!(file = %target.display(), "Restored original file");
                    metrics::RESTORES_TOTAL.with_label_values(&["success"]).inc();
                    report.restored.push(target);
                }
                Err(e) => {
                    warn!(file = %backup.display(), "Failed to restore file: {}", e);
                    metrics::RESTORES_TOTAL.with_label_values(&["failed"]).inc();
                    report.failed.push(FileFailure {
                        path: backup,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            restored = report.restored.len(),
            failed = report.failed.len(),
            "Restore finished"
        );
        Ok(report)
    }

    /// Deletes the backup directory and everything in it.
    ///
    /// Returns false when there was nothing to delete.
    pub async fn purge_backups(&self, backup_dir: &Path) -> Result<bool, BackupError> {
        remove_dir_if_exists(backup_dir).await
    }

    /// Deletes the temp directory used for converted outputs.
    pub async fn purge_temp(&self, temp_dir: &Path) -> Result<bool, BackupError> {
        remove_dir_if_exists(temp_dir).await
    }

    /// For every `X{marker}.mp4` in `dir` whose `X.mp4` exists, replaces
    /// `X.mp4` with it and deletes the converted file.
    ///
    /// The marker match ignores case.
    pub async fn replace_converted(
        &self,
        dir: &Path,
        marker: &str,
    ) -> Result<ReplaceReport, BackupError> {
        let files = list_files(dir).await?.ok_or_else(|| BackupError::SourceNotFound {
            path: dir.to_path_buf(),
        })?;

        let suffix = format!("{}.mp4", marker).to_lowercase();
        let mut report = ReplaceReport::default();

        for converted in files {
            let Some(original_name) = original_name_for(&converted, &suffix) else {
                continue;
            };
            report.found += 1;

            let original = dir.join(original_name);
            if !fs::try_exists(&original).await.unwrap_or(false) {
                warn!(file = %converted.display(), "Original file not found");
                report.missing_original.push(converted);
                continue;
            }

            match self.swap_converted(&original, &converted).await {
                Ok(()) => {
                    info!(file = %original.display(), "Replaced with converted file");
                    report.replaced.push(original);
                }
                Err(e) => {
                    warn!(file = %converted.display(), "Failed to replace file: {}", e);
                    report.failed.push(FileFailure {
                        path: converted,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            found = report.found,
            replaced = report.replaced.len(),
            "Replaced converted files"
        );
        Ok(report)
    }

    async fn swap_converted(&self, original: &Path, converted: &Path) -> Result<(), BackupError> {
        self.replace(original, converted).await?;
        fs::remove_file(converted)
            .await
            .map_err(|e| BackupError::remove_failed(converted.to_path_buf(), e))
    }

    /// Copies `source` to a staging sibling of `destination`, then renames it
    /// over `destination`. The staging file is removed on failure.
    async fn copy_into_place(
        &self,
        source: &Path,
        destination: &Path,
        calculate_checksum: bool,
    ) -> Result<(u64, Option<String>), BackupError> {
        let staging = staging_path(destination)?;

        let staged = async {
            let copied = self.copy_file(source, &staging, calculate_checksum).await?;
            preserve_metadata(source, &staging).await;
            fs::rename(&staging, destination)
                .await
                .map_err(|e| BackupError::MoveFailed {
                    source: staging.clone(),
                    destination: destination.to_path_buf(),
                    error: e,
                })?;
            Ok::<_, BackupError>(copied)
        };

        match staged.await {
            Ok(copied) => Ok(copied),
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                Err(e)
            }
        }
    }

    /// Copies a file with optional checksum calculation.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        calculate_checksum: bool,
    ) -> Result<(u64, Option<String>), BackupError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackupError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                BackupError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            BackupError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);
        let mut hasher = calculate_checksum.then(Sha256::new);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                BackupError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;
            if bytes_read == 0 {
                break;
            }

            if let Some(ref mut h) = hasher {
                h.update(&buffer[..bytes_read]);
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                BackupError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;
            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            BackupError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        writer.get_ref().sync_all().await.map_err(|e| {
            BackupError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok((total_bytes, hasher.map(|h| format!("{:x}", h.finalize()))))
    }

    /// SHA-256 of a file's content, hex encoded.
    async fn sha256_file(&self, path: &Path) -> Result<String, BackupError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut hasher = Sha256::new();
        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr, BackupError> {
    path.file_name().ok_or_else(|| BackupError::InvalidPath {
        path: path.to_path_buf(),
    })
}

fn staging_path(destination: &Path) -> Result<PathBuf, BackupError> {
    let name = file_name(destination)?;
    let staged = format!(".{}{}", name.to_string_lossy(), STAGING_SUFFIX);
    Ok(destination.with_file_name(staged))
}

fn is_staging_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| {
            let n = n.to_string_lossy();
            n.starts_with('.') && n.ends_with(STAGING_SUFFIX)
        })
        .unwrap_or(false)
}

/// Maps `X{marker}.mp4` to `X.mp4`; `suffix` is lowercase.
fn original_name_for(converted: &Path, suffix: &str) -> Option<String> {
    let name = converted.file_name()?.to_str()?;
    if name.len() <= suffix.len() || !name.to_lowercase().ends_with(suffix) {
        return None;
    }
    let cut = name.len() - suffix.len();
    if !name.is_char_boundary(cut) {
        return None;
    }
    Some(format!("{}.mp4", &name[..cut]))
}

/// Regular files directly inside `dir`, sorted by name; `None` if `dir` is
/// missing. Leftover staging files are skipped.
async fn list_files(dir: &Path) -> Result<Option<Vec<PathBuf>>, BackupError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BackupError::Io(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match entry.file_type().await {
            Ok(ft) if ft.is_file() && !is_staging_file(&path) => files.push(path),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), "Skipping unreadable entry: {}", e),
        }
    }
    files.sort();
    Ok(Some(files))
}

async fn remove_dir_if_exists(dir: &Path) -> Result<bool, BackupError> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {
            info!(dir = %dir.display(), "Deleted directory");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BackupError::remove_failed(dir.to_path_buf(), e)),
    }
}

/// Best-effort copy of timestamps and permissions from `from` to `to`.
async fn preserve_metadata(from: &Path, to: &Path) {
    let meta = match fs::metadata(from).await {
        Ok(meta) => meta,
        Err(e) => {
            debug!(path = %from.display(), "Cannot read metadata: {}", e);
            return;
        }
    };

    let mut times = std::fs::FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    let target = to.to_path_buf();
    let set_times = tokio::task::spawn_blocking(move || {
        std::fs::OpenOptions::new()
            .write(true)
            .open(&target)?
            .set_times(times)
    })
    .await
    .map_err(std::io::Error::other)
    .and_then(|r| r);
    if let Err(e) = set_times {
        debug!(path = %to.display(), "Cannot preserve timestamps: {}", e);
    }

    if let Err(e) = fs::set_permissions(to, meta.permissions()).await {
        debug!(path = %to.display(), "Cannot preserve permissions: {}", e);
    }
}
