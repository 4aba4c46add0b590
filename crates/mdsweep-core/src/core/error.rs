use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("No project found at '{0}' (missing project.json). Run 'mdsweep init' first.")]
    NotAProject(String),
    #[error("Project at '{path}' is named '{found}', not '{expected}'")]
    NameMismatch {
        path: String,
        expected: String,
        found: String,
    },
    #[error("Job '{id}' is corrupt: {reason}")]
    CorruptJob { id: String, reason: String },
    #[error("No job matches id '{0}'")]
    JobNotFound(String),
    #[error("Job id prefix '{prefix}' is ambiguous ({matches} matching jobs)")]
    AmbiguousJobId { prefix: String, matches: usize },
}
