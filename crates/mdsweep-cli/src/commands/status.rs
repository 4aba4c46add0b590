use crate::cli::StatusArgs;
use crate::config::models::AppConfig;
use crate::error::{CliError, Result};
use mdsweep::workflows::status::StatusReport;
use mdsweep::workflows;
use tracing::info;

const ID_WIDTH: usize = 8;

pub async fn run(args: StatusArgs, config: &AppConfig) -> Result<()> {
    let (project, graph) = super::open_project(config)?;

    info!("Collecting status of project '{}'", project.name());
    let report =
        tokio::task::block_in_place(|| workflows::status::run(&project, &graph, &args.jobs))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Other(e.into()))?;
        println!("{}", json);
    } else {
        print!("{}", render_overview(&report));
        if args.detailed {
            print!("{}", render_jobs(&report));
        }
    }
    Ok(())
}

fn render_overview(report: &StatusReport) -> String {
    let mut out = format!(
        "Project '{}': {} job(s), {} with nothing left to run.\n",
        report.project,
        report.total(),
        report.completed()
    );
    out.push_str("\nLabels:\n");
    for (label, count) in &report.label_counts {
        out.push_str(&format!("  {:<16} {:>5}/{}\n", label, count, report.total()));
    }
    out.push_str("\nEligible operations:\n");
    for (operation, count) in &report.eligible_counts {
        out.push_str(&format!("  {:<16} {:>5}\n", operation, count));
    }
    out
}

fn render_jobs(report: &StatusReport) -> String {
    let mut out = format!("\n{:<10}{:<24}{:<16}{}\n", "JOB", "LABELS", "ELIGIBLE", "STATE POINT");
    for job in &report.jobs {
        let id = job.id.get(..ID_WIDTH).unwrap_or(&job.id);
        out.push_str(&format!(
            "{:<10}{:<24}{:<16}{}\n",
            id,
            job.labels.join(","),
            job.eligible.join(","),
            job.statepoint
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use mdsweep::workflows::status::JobStatus;

    fn report() -> StatusReport {
        let mut label_counts = IndexMap::new();
        label_counts.insert("nvt_done", 1);
        label_counts.insert("sample_done", 0);
        let mut eligible_counts = IndexMap::new();
        eligible_counts.insert("nvt", 1);
        eligible_counts.insert("sample", 1);
        StatusReport {
            project: "pps".to_string(),
            jobs: vec![
                JobStatus {
                    id: "0123456789abcdef0123456789abcdef".to_string(),
                    statepoint: "lengths=20".to_string(),
                    labels: vec!["nvt_done"],
                    eligible: vec!["sample"],
                },
                JobStatus {
                    id: "fedcba9876543210fedcba9876543210".to_string(),
                    statepoint: "lengths=30".to_string(),
                    labels: vec![],
                    eligible: vec!["nvt"],
                },
            ],
            label_counts,
            eligible_counts,
        }
    }

    #[test]
    fn overview_lists_counts_in_graph_order() {
        let overview = render_overview(&report());
        assert!(overview.starts_with("Project 'pps': 2 job(s), 0 with nothing left to run."));
        let nvt = overview.find("nvt_done").unwrap();
        let sample = overview.find("sample_done").unwrap();
        assert!(nvt < sample);
        assert!(overview.contains("1/2"));
    }

    #[test]
    fn job_rows_use_short_ids() {
        let rows = render_jobs(&report());
        assert!(rows.contains("01234567  nvt_done"));
        assert!(rows.contains("fedcba98"));
        assert!(!rows.contains("fedcba9876543210"));
        assert!(rows.contains("lengths=30"));
    }
}
