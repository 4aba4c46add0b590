use super::document::JobDocument;
use super::error::WorkspaceError;
use super::fsutil;
use super::statepoint::{JobId, StatePoint};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const STATEPOINT_FILE: &str = "statepoint.json";
pub const DOCUMENT_FILE: &str = "document.json";

pub const TRAJECTORY_FILE: &str = "trajectory.gsd";
pub const LOG_FILE: &str = "log.txt";
pub const FORCEFIELD_FILE: &str = "forcefield.pickle";
pub const INIT_SNAPSHOT_FILE: &str = "init.gsd";
pub const RESTART_SNAPSHOT_FILE: &str = "restart.gsd";
pub const RELABELED_TRAJECTORY_FILE: &str = "new_traj.gsd";

/// A handle to the workspace directory of one state point.
///
/// Handles are cheap; nothing is read from disk until [`Job::document`] is called.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    statepoint: StatePoint,
    path: PathBuf,
}

impl Job {
    pub(crate) fn new(statepoint: StatePoint, workspace_dir: &Path) -> Self {
        let id = statepoint.id();
        let path = workspace_dir.join(id.as_str());
        Self {
            id,
            statepoint,
            path,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn statepoint(&self) -> &StatePoint {
        &self.statepoint
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }

    pub fn exists(&self) -> bool {
        self.path_of(STATEPOINT_FILE).is_file()
    }

    pub fn has_document(&self) -> bool {
        self.path_of(DOCUMENT_FILE).is_file()
    }

    /// Loads the job document; a job without a document file reads as the default document.
    pub fn document(&self) -> Result<JobDocument, WorkspaceError> {
        Ok(fsutil::read_json_opt(&self.path_of(DOCUMENT_FILE))?.unwrap_or_default())
    }

    pub fn write_document(&self, document: &JobDocument) -> Result<(), WorkspaceError> {
        fsutil::write_json_atomic(&self.path_of(DOCUMENT_FILE), document)
    }

    /// Read-modify-write of the job document.
    ///
    /// Assumes a single writer per job; the write itself is atomic, so a crash leaves either
    /// the previous or the updated document on disk.
    pub fn update_document<R>(
        &self,
        f: impl FnOnce(&mut JobDocument) -> R,
    ) -> Result<R, WorkspaceError> {
        let mut document = self.document()?;
        let result = f(&mut document);
        self.write_document(&document)?;
        Ok(result)
    }

    /// Makes sure the document exists and carries both completion flags, defaulting absent
    /// flags to `false`. Flags already present are never changed. Returns whether the
    /// document was written.
    pub fn ensure_document(&self) -> Result<bool, WorkspaceError> {
        let path = self.path_of(DOCUMENT_FILE);
        let Some(raw) = fsutil::read_json_opt::<Value>(&path)? else {
            self.write_document(&JobDocument::default())?;
            return Ok(true);
        };

        let has_flags = raw.get("nvt_done").is_some() && raw.get("sample_done").is_some();
        let document: JobDocument =
            serde_json::from_value(raw).map_err(|source| WorkspaceError::Json {
                path: path.to_string_lossy().to_string(),
                source,
            })?;
        if has_flags {
            return Ok(false);
        }
        self.write_document(&document)?;
        Ok(true)
    }

    pub(crate) fn write_statepoint(&self) -> Result<(), WorkspaceError> {
        fsutil::write_json_atomic(&self.path_of(STATEPOINT_FILE), &self.statepoint)
    }
}
