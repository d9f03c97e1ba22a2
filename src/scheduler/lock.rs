//! Single-instance guard: a JSON lock file in the output directory holding the
//! owner's PID and acquisition time. Removed when the guard is dropped.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const LOCK_FILE_NAME: &str = "pipeline.lock";

/// A lock older than this (3 hours) is treated as left behind by a crash.
pub const MAX_LOCK_AGE_SECS: u64 = 3 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    /// Unix epoch seconds.
    pub acquired_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl LockInfo {
    fn current() -> Self {
        LockInfo {
            pid: process::id(),
            acquired_at: now_secs(),
        }
    }

    pub fn age_secs(&self) -> u64 {
        now_secs().saturating_sub(self.acquired_at)
    }

    pub fn is_stale(&self) -> bool {
        self.age_secs() > MAX_LOCK_AGE_SECS
    }
}

/// Held for the duration of one pipeline run.
#[derive(Debug)]
pub struct InstanceGuard {
    path: PathBuf,
}

impl InstanceGuard {
    pub fn acquire(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE_NAME);

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<LockInfo>(&content) {
                Ok(holder) if holder.is_stale() => {
                    log::warn!(
                        "Lock antigo removido (pid {}, {} s)",
                        holder.pid,
                        holder.age_secs()
                    );
                    fs::remove_file(&path)?;
                }
                Ok(holder) => {
                    return Err(AppError::AlreadyRunning(format!(
                        "pid {} há {} s",
                        holder.pid,
                        holder.age_secs()
                    )));
                }
                Err(e) => {
                    log::warn!("Lock corrompido removido: {}", e);
                    fs::remove_file(&path)?;
                }
            }
        }

        let info = LockInfo::current();
        let content = serde_json::to_string_pretty(&info)?;
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::AlreadyRunning(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        log::debug!("Lock adquirido: {} (pid {})", path.display(), info.pid);
        Ok(InstanceGuard { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Falha ao remover lock {}: {}", self.path.display(), e);
        }
    }
}
