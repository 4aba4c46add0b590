use super::error::EngineError;
use crate::core::error::WorkspaceError;
use crate::core::job::Job;
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

pub const LOCK_FILE: &str = ".mdsweep.lock";

/// Exclusive lock on one job, held for as long as a controller works on it.
///
/// The lock is an OS file lock on `.mdsweep.lock`, so it is released by the kernel when the
/// holding process exits for any reason. The file itself stays behind and only records the
/// last holder; its presence alone never blocks a later controller.
#[derive(Debug)]
pub struct JobLock {
    file: File,
}

impl JobLock {
    pub fn acquire(job: &Job) -> Result<Self, EngineError> {
        let path = job.path_of(LOCK_FILE);
        let io_error = |source: io::Error| -> EngineError {
            WorkspaceError::Io {
                path: path.to_string_lossy().to_string(),
                source,
            }
            .into()
        };

        let mut file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error)?;

        if let Err(e) = file.try_lock_exclusive() {
            if !is_contended(&e) {
                return Err(io_error(e));
            }
            return Err(EngineError::JobLocked {
                job_id: job.id().to_string(),
                holder: read_holder(&path),
            });
        }

        let payload = format!(
            "{{\"pid\":{},\"acquired_at\":\"{}\"}}\n",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        file.set_len(0).map_err(io_error)?;
        file.write_all(payload.as_bytes()).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        Ok(Self { file })
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn read_holder(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown holder".to_string())
}

impl Drop for JobLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
