use super::error::WorkspaceError;
use super::fsutil;
use super::job::{Job, STATEPOINT_FILE};
use super::statepoint::{JobId, StatePoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PROJECT_FILE: &str = "project.json";
pub const STATEPOINT_SUMMARY_FILE: &str = "statepoints.json";
pub const WORKSPACE_DIR: &str = "workspace";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectRecord {
    name: String,
    schema_version: u32,
}

/// A project root: an identity record, a state-point summary, and one workspace
/// sub-directory per job, named by the job id.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    name: String,
}

impl Project {
    /// Creates the project at `root`, or reopens it if it already exists under the same name.
    pub fn init(root: &Path, name: &str) -> Result<Self, WorkspaceError> {
        let record_path = root.join(PROJECT_FILE);
        if let Some(record) = fsutil::read_json_opt::<ProjectRecord>(&record_path)? {
            if record.name != name {
                return Err(WorkspaceError::NameMismatch {
                    path: root.to_string_lossy().to_string(),
                    expected: name.to_string(),
                    found: record.name,
                });
            }
            debug!("Reusing existing project '{}' at {:?}", name, root);
        } else {
            fsutil::write_json_atomic(
                &record_path,
                &ProjectRecord {
                    name: name.to_string(),
                    schema_version: SCHEMA_VERSION,
                },
            )?;
            debug!("Created project '{}' at {:?}", name, root);
        }

        fsutil::ensure_dir(&root.join(WORKSPACE_DIR))?;
        Ok(Self {
            root: root.to_path_buf(),
            name: name.to_string(),
        })
    }

    pub fn open(root: &Path) -> Result<Self, WorkspaceError> {
        let record = fsutil::read_json_opt::<ProjectRecord>(&root.join(PROJECT_FILE))?
            .ok_or_else(|| WorkspaceError::NotAProject(root.to_string_lossy().to_string()))?;
        Ok(Self {
            root: root.to_path_buf(),
            name: record.name,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Returns the handle of the job for `statepoint` without touching the disk.
    pub fn open_job(&self, statepoint: StatePoint) -> Job {
        Job::new(statepoint, &self.workspace_dir())
    }

    /// Creates the job workspace and state-point record if absent. The job document is never
    /// touched. Returns the job and whether it was newly created.
    pub fn init_job(&self, statepoint: StatePoint) -> Result<(Job, bool), WorkspaceError> {
        let job = self.open_job(statepoint);
        if job.exists() {
            return Ok((job, false));
        }
        fsutil::ensure_dir(job.path())?;
        job.write_statepoint()?;
        Ok((job, true))
    }

    /// All jobs in the workspace, sorted by id.
    ///
    /// Every stored state point must hash to the name of its directory; a mismatch means the
    /// record was edited by hand and is reported as [`WorkspaceError::CorruptJob`].
    pub fn jobs(&self) -> Result<Vec<Job>, WorkspaceError> {
        let workspace = self.workspace_dir();
        let entries = match fs::read_dir(&workspace) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(fsutil::io_error(&workspace)(e)),
        };

        let mut jobs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(fsutil::io_error(&workspace))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            let Some(dir_id) = JobId::parse(&dir_name) else {
                warn!("Ignoring unexpected directory in workspace: {:?}", path);
                continue;
            };

            let statepoint_path = path.join(STATEPOINT_FILE);
            if !statepoint_path.is_file() {
                return Err(WorkspaceError::CorruptJob {
                    id: dir_name,
                    reason: format!("missing {}", STATEPOINT_FILE),
                });
            }
            let statepoint: StatePoint = fsutil::read_json(&statepoint_path)?;
            let job = self.open_job(statepoint);
            if *job.id() != dir_id {
                return Err(WorkspaceError::CorruptJob {
                    id: dir_name,
                    reason: format!("state point hashes to {}", job.id()),
                });
            }
            jobs.push(job);
        }

        jobs.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(jobs)
    }

    /// Resolves a full id or a unique id prefix to a job.
    pub fn find_job(&self, prefix: &str) -> Result<Job, WorkspaceError> {
        let mut matches: Vec<Job> = self
            .jobs()?
            .into_iter()
            .filter(|job| !prefix.is_empty() && job.id().as_str().starts_with(prefix))
            .collect();
        match matches.len() {
            0 => Err(WorkspaceError::JobNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(WorkspaceError::AmbiguousJobId {
                prefix: prefix.to_string(),
                matches: n,
            }),
        }
    }

    /// Jobs selected by id or id prefix; an empty selection means every job.
    pub fn select_jobs(&self, ids: &[String]) -> Result<Vec<Job>, WorkspaceError> {
        if ids.is_empty() {
            return self.jobs();
        }
        let mut selected: Vec<Job> = ids
            .iter()
            .map(|id| self.find_job(id))
            .collect::<Result<_, _>>()?;
        selected.sort_by(|a, b| a.id().cmp(b.id()));
        selected.dedup_by(|a, b| a.id() == b.id());
        Ok(selected)
    }

    /// Writes the `{id: statepoint}` summary of the whole workspace. Returns the job count.
    pub fn write_statepoint_summary(&self) -> Result<usize, WorkspaceError> {
        let summary: BTreeMap<String, StatePoint> = self
            .jobs()?
            .into_iter()
            .map(|job| (job.id().to_string(), job.statepoint().clone()))
            .collect();
        fsutil::write_json_atomic(&self.root.join(STATEPOINT_SUMMARY_FILE), &summary)?;
        Ok(summary.len())
    }
}
