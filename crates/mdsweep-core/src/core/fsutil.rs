use super::error::WorkspaceError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WorkspaceError + '_ {
    move |source| WorkspaceError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

pub(crate) fn ensure_dir(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(io_error(path))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, WorkspaceError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| WorkspaceError::Json {
        path: path.to_string_lossy().to_string(),
        source,
    })
}

/// Like [`read_json`], but a missing file yields `None`.
pub(crate) fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, WorkspaceError> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| WorkspaceError::Json {
                path: path.to_string_lossy().to_string(),
                source,
            }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Writes `bytes` to a sibling temp file, syncs it, and renames it over `path`, so readers
/// only ever observe the old or the new content.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("tmpfile");
    let tmp = path.with_file_name(format!(
        ".{}.tmp.{}.{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_micros()
    ));

    let mut file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
    file.write_all(bytes).map_err(io_error(&tmp))?;
    file.sync_all().map_err(io_error(&tmp))?;
    fs::rename(&tmp, path).map_err(io_error(path))?;
    Ok(())
}

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), WorkspaceError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| WorkspaceError::Json {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    bytes.push(b'\n');
    atomic_write(path, &bytes)
}
