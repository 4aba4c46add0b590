use crate::core::error::WorkspaceError;
use crate::core::fsutil;
use crate::core::project::Project;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::flow::environment::EnvironmentProfile;
use crate::flow::graph::FlowGraph;
use crate::flow::template::{DEFAULT_SLURM_TEMPLATE, render, shell_quote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, instrument, warn};

pub const TEMPLATES_DIR: &str = "templates";
pub const SUBMISSIONS_DIR: &str = "submissions";

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub job_ids: Vec<String>,
    pub operations: Vec<String>,
    /// Render the scripts but do not hand them to the scheduler.
    pub pretend: bool,
    /// Submit again even when the operation already has a submission record.
    pub force: bool,
    /// Overrides the partition of the environment profile.
    pub partition: Option<String>,
    /// The `mdsweep` executable the batch job calls back into.
    pub binary: PathBuf,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            job_ids: Vec::new(),
            operations: Vec::new(),
            pretend: false,
            force: false,
            partition: None,
            binary: PathBuf::from("mdsweep"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub job_id: String,
    pub operation: String,
    pub script: PathBuf,
    pub submitted: bool,
    pub scheduler_output: Option<String>,
}

/// Persisted next to the script once the scheduler accepted it. Its presence marks the
/// (operation, job) pair as queued or running, so a later `submit` leaves it alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub job_id: String,
    pub operation: String,
    pub environment: String,
    pub scheduler_output: String,
    pub submitted_at: DateTime<Utc>,
}

/// An eligible operation skipped because it was submitted earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSubmission {
    pub job_id: String,
    pub operation: String,
    pub record: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitSummary {
    pub submissions: Vec<Submission>,
    pub already_submitted: Vec<PendingSubmission>,
}

fn record_path(submissions_dir: &Path, operation: &str, job_id: &str) -> PathBuf {
    submissions_dir.join(format!("{}-{}.submitted.json", operation, job_id))
}

fn load_template(project: &Project, environment: &EnvironmentProfile) -> Result<String, WorkspaceError> {
    if let Some(name) = environment.template() {
        let path = project.root().join(TEMPLATES_DIR).join(name);
        if path.is_file() {
            debug!("Using submission template {:?}", &path);
            return fs::read_to_string(&path).map_err(fsutil::io_error(&path));
        }
        debug!("Template {:?} not found; using the built-in SLURM template", &path);
    }
    Ok(DEFAULT_SLURM_TEMPLATE.to_string())
}

fn hand_to_scheduler(
    scheduler: &str,
    script: &Path,
    root: &Path,
) -> Result<String, EngineError> {
    let mut parts = scheduler.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| EngineError::Submission("empty scheduler command".to_string()))?;
    let output = Command::new(program)
        .args(parts)
        .arg(script)
        .current_dir(root)
        .output()
        .map_err(|e| EngineError::Submission(format!("failed to launch '{}': {}", scheduler, e)))?;

    if !output.status.success() {
        return Err(EngineError::Submission(format!(
            "'{}' exited with {}: {}",
            scheduler,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Renders one batch script per job for its next eligible operation and submits it.
///
/// Only the first eligible operation of each job is submitted; downstream operations become
/// eligible once it completes, and are picked up by a later submission. An operation with a
/// submission record is skipped unless `force` is set, so repeated invocations do not queue
/// duplicates. After a queued run fails, resubmit it with `force`.
#[instrument(skip_all, name = "submit_workflow", fields(environment = environment.name()))]
pub fn run(
    project: &Project,
    graph: &FlowGraph,
    environment: &EnvironmentProfile,
    options: &SubmitOptions,
    reporter: &ProgressReporter,
) -> Result<SubmitSummary, EngineError> {
    for name in &options.operations {
        if graph.operation(name).is_none() {
            return Err(EngineError::UnknownOperation(name.clone()));
        }
    }
    let scheduler = match (environment.scheduler_command(), options.pretend) {
        (Some(command), _) => Some(command),
        (None, true) => None,
        (None, false) => {
            return Err(EngineError::Submission(format!(
                "environment '{}' does not support submission; use --env or --pretend",
                environment.name()
            )));
        }
    };
    let partition = options
        .partition
        .as_deref()
        .or(environment.partition())
        .unwrap_or_default()
        .to_string();

    let template = load_template(project, environment)?;
    let jobs = project.select_jobs(&options.job_ids)?;
    let submissions_dir = project.root().join(SUBMISSIONS_DIR);
    let root = shell_quote(&project.root().to_string_lossy());
    let binary = shell_quote(&options.binary.to_string_lossy());

    reporter.report(Progress::PhaseStart {
        name: "Submitting operations",
    });
    reporter.report(Progress::TaskStart {
        total_steps: jobs.len() as u64,
    });

    let mut summary = SubmitSummary::default();
    for job in &jobs {
        let document = job.document()?;
        let next = graph.eligible_operations(&document).into_iter().find(|op| {
            options.operations.is_empty() || options.operations.iter().any(|n| n == op.name())
        });
        let Some(operation) = next else {
            reporter.report(Progress::TaskIncrement);
            continue;
        };

        let job_id = job.id().to_string();
        let record = record_path(&submissions_dir, operation.name(), &job_id);
        if !options.force && record.is_file() {
            match fsutil::read_json::<SubmissionRecord>(&record) {
                Ok(previous) => debug!(
                    job_id = %job.id().short(),
                    "'{}' already submitted at {}: {}",
                    operation.name(),
                    previous.submitted_at,
                    previous.scheduler_output
                ),
                Err(e) => warn!("Unreadable submission record, treating it as pending: {}", e),
            }
            info!(job_id = %job.id().short(), "Skipping '{}': already submitted", operation.name());
            summary.already_submitted.push(PendingSubmission {
                job_id,
                operation: operation.name().to_string(),
                record,
            });
            reporter.report(Progress::TaskIncrement);
            continue;
        }

        let directives = operation.directives();
        let command = format!(
            "{} --project {} run -o {} -i {}",
            binary,
            root,
            operation.name(),
            job_id
        );
        let vars: HashMap<&str, String> = HashMap::from([
            ("job_name", format!("{}-{}", operation.name(), job.id().short())),
            ("partition", partition.clone()),
            ("ngpu", directives.ngpu.to_string()),
            ("executable", directives.executable.clone()),
            ("project_root", root.clone()),
            ("command", command),
        ]);
        let script_body = render(&template, &vars)?;
        let script = submissions_dir.join(format!("{}-{}.sh", operation.name(), job_id));
        fsutil::atomic_write(&script, script_body.as_bytes())?;

        let scheduler_output = match scheduler {
            Some(command) if !options.pretend => {
                let output = hand_to_scheduler(command, &script, project.root())?;
                info!(job_id = %job.id().short(), "Submitted '{}': {}", operation.name(), output);
                fsutil::write_json_atomic(
                    &record,
                    &SubmissionRecord {
                        job_id: job_id.clone(),
                        operation: operation.name().to_string(),
                        environment: environment.name().to_string(),
                        scheduler_output: output.clone(),
                        submitted_at: Utc::now(),
                    },
                )?;
                Some(output)
            }
            _ => {
                info!(job_id = %job.id().short(), "Rendered '{}' to {:?}", operation.name(), &script);
                None
            }
        };

        summary.submissions.push(Submission {
            job_id,
            operation: operation.name().to_string(),
            script,
            submitted: scheduler_output.is_some(),
            scheduler_output,
        });
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::ParameterGrid;
    use crate::workflows::init;
    use crate::workflows::project::tests::MockEngine;
    use crate::workflows::project::{NVT, ProjectDirectives, SAMPLE, md_project};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn setup() -> (TempDir, Project, FlowGraph) {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path(), "md").unwrap();
        init::run(
            &project,
            &ParameterGrid::new().with("lengths", [20, 30]),
            &ProgressReporter::new(),
        )
        .unwrap();
        let graph = md_project(Arc::new(MockEngine::default()), ProjectDirectives::default())
            .unwrap();
        (dir, project, graph)
    }

    fn fry() -> EnvironmentProfile {
        EnvironmentProfile::cluster("fry", "fry", "fry.sh", "batch").unwrap()
    }

    fn pretend() -> SubmitOptions {
        SubmitOptions {
            pretend: true,
            ..Default::default()
        }
    }

    #[test]
    fn pretend_renders_one_script_per_job() {
        let (_dir, project, graph) = setup();
        let submissions = run(&project, &graph, &fry(), &pretend(), &ProgressReporter::new())
            .unwrap()
            .submissions;

        assert_eq!(submissions.len(), 2);
        for submission in &submissions {
            assert_eq!(submission.operation, NVT);
            assert!(!submission.submitted);
            let script = fs::read_to_string(&submission.script).unwrap();
            assert!(script.contains("#SBATCH --partition=batch"));
            assert!(script.contains("#SBATCH --gres=gpu:1"));
            assert!(script.contains(&format!("run -o nvt -i {}", submission.job_id)));
            assert!(
                submission
                    .script
                    .ends_with(format!("nvt-{}.sh", submission.job_id))
            );
        }
    }

    #[test]
    fn only_the_next_eligible_operation_is_submitted() {
        let (_dir, project, graph) = setup();
        let jobs = project.jobs().unwrap();
        jobs[0].update_document(|doc| doc.nvt_done = true).unwrap();
        jobs[1]
            .update_document(|doc| {
                doc.nvt_done = true;
                doc.sample_done = true;
            })
            .unwrap();

        let submissions = run(&project, &graph, &fry(), &pretend(), &ProgressReporter::new())
            .unwrap()
            .submissions;
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].operation, SAMPLE);
        let script = fs::read_to_string(&submissions[0].script).unwrap();
        assert!(script.contains("#SBATCH --gres=gpu:0"));
    }

    #[test]
    fn partition_override_wins() {
        let (_dir, project, graph) = setup();
        let options = SubmitOptions {
            partition: Some("gpu-long".to_string()),
            ..pretend()
        };
        let submissions = run(&project, &graph, &fry(), &options, &ProgressReporter::new())
            .unwrap()
            .submissions;
        let script = fs::read_to_string(&submissions[0].script).unwrap();
        assert!(script.contains("#SBATCH --partition=gpu-long"));
    }

    #[test]
    fn project_template_replaces_the_builtin_one() {
        let (dir, project, graph) = setup();
        let templates = dir.path().join(TEMPLATES_DIR);
        fs::create_dir_all(&templates).unwrap();
        fs::write(
            templates.join("fry.sh"),
            "#!/bin/bash\n# {{ job_name }} on {{ partition }}\n{{ command }}\n",
        )
        .unwrap();

        let submissions = run(&project, &graph, &fry(), &pretend(), &ProgressReporter::new())
            .unwrap()
            .submissions;
        let script = fs::read_to_string(&submissions[0].script).unwrap();
        assert!(script.starts_with("#!/bin/bash\n# nvt-"));
        assert!(!script.contains("SBATCH"));
    }

    #[test]
    fn unknown_placeholder_in_template_is_an_error() {
        let (dir, project, graph) = setup();
        let templates = dir.path().join(TEMPLATES_DIR);
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("fry.sh"), "{{ walltime }}\n").unwrap();

        let result = run(&project, &graph, &fry(), &pretend(), &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Flow(_))));
    }

    #[test]
    fn local_environment_refuses_to_submit() {
        let (_dir, project, graph) = setup();
        let result = run(
            &project,
            &graph,
            &EnvironmentProfile::local(),
            &SubmitOptions::default(),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Submission(_))));
        assert!(!project.root().join(SUBMISSIONS_DIR).exists());
    }

    #[cfg(unix)]
    #[test]
    fn scripts_are_handed_to_the_scheduler() {
        let (_dir, project, graph) = setup();
        let environment = fry().with_scheduler_command("echo Submitted batch job");
        let submissions = run(
            &project,
            &graph,
            &environment,
            &SubmitOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap()
        .submissions;

        assert_eq!(submissions.len(), 2);
        for submission in &submissions {
            assert!(submission.submitted);
            let output = submission.scheduler_output.as_deref().unwrap();
            assert!(output.starts_with("Submitted batch job"));
            assert!(output.ends_with(".sh"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn repeated_submit_skips_queued_operations() {
        let (_dir, project, graph) = setup();
        let environment = fry().with_scheduler_command("echo Submitted batch job");
        let submit = |options: &SubmitOptions| {
            run(&project, &graph, &environment, options, &ProgressReporter::new()).unwrap()
        };

        let first = submit(&SubmitOptions::default());
        assert_eq!(first.submissions.len(), 2);
        for submission in &first.submissions {
            let record: SubmissionRecord = fsutil::read_json(&record_path(
                &project.root().join(SUBMISSIONS_DIR),
                NVT,
                &submission.job_id,
            ))
            .unwrap();
            assert_eq!(record.operation, NVT);
            assert_eq!(record.environment, "fry");
            assert!(record.scheduler_output.starts_with("Submitted batch job"));
        }

        let second = submit(&SubmitOptions::default());
        assert!(second.submissions.is_empty());
        assert_eq!(second.already_submitted.len(), 2);
        assert!(second.already_submitted.iter().all(|p| p.operation == NVT));

        let pretended = submit(&pretend());
        assert!(pretended.submissions.is_empty());
        assert_eq!(pretended.already_submitted.len(), 2);

        let forced = submit(&SubmitOptions {
            force: true,
            ..Default::default()
        });
        assert_eq!(forced.submissions.len(), 2);
        assert!(forced.already_submitted.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn completed_operation_does_not_block_the_next_one() {
        let (_dir, project, graph) = setup();
        let environment = fry().with_scheduler_command("echo Submitted batch job");
        run(
            &project,
            &graph,
            &environment,
            &SubmitOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        for job in project.jobs().unwrap() {
            job.update_document(|doc| doc.nvt_done = true).unwrap();
        }

        let summary = run(
            &project,
            &graph,
            &environment,
            &SubmitOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(summary.submissions.len(), 2);
        assert!(summary.submissions.iter().all(|s| s.operation == SAMPLE));
        assert!(summary.already_submitted.is_empty());
    }

    #[test]
    fn paths_with_spaces_are_quoted_in_scripts() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("my sweep");
        let project = Project::init(&root, "md").unwrap();
        init::run(
            &project,
            &ParameterGrid::new().with("lengths", [20]),
            &ProgressReporter::new(),
        )
        .unwrap();
        let graph = md_project(Arc::new(MockEngine::default()), ProjectDirectives::default())
            .unwrap();
        let options = SubmitOptions {
            binary: PathBuf::from("/opt/md tools/mdsweep"),
            ..pretend()
        };

        let submissions = run(&project, &graph, &fry(), &options, &ProgressReporter::new())
            .unwrap()
            .submissions;
        let script = fs::read_to_string(&submissions[0].script).unwrap();
        let quoted_root = format!("'{}'", root.display());
        assert!(script.contains(&format!("cd {}\n", quoted_root)));
        assert!(script.contains(&format!(
            "'/opt/md tools/mdsweep' --project {} run -o nvt",
            quoted_root
        )));
    }

    #[cfg(unix)]
    #[test]
    fn scheduler_failure_is_reported() {
        let (_dir, project, graph) = setup();
        let environment = fry().with_scheduler_command("false");
        let result = run(
            &project,
            &graph,
            &environment,
            &SubmitOptions::default(),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Submission(_))));
    }
}
