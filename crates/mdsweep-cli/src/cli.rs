use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "mdsweep CLI - Initialize, run, and submit parameter sweeps of molecular-dynamics simulations.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel status evaluation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Root directory of the project (holds project.json, mdsweep.toml and workspace/).
    #[arg(
        short = 'p',
        long,
        global = true,
        value_name = "DIR",
        default_value = ".",
        env = "MDSWEEP_PROJECT"
    )]
    pub project: PathBuf,

    /// Set a specific configuration value, overriding mdsweep.toml.
    /// Can be used multiple times. Example: -S relabel.beads-from-center=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the workspace, or extend it with new state points of the parameter grid.
    Init(InitArgs),
    /// Show which labels hold and which operations are eligible for every job.
    Status(StatusArgs),
    /// Execute eligible operations locally.
    Run(RunArgs),
    /// Render batch scripts for eligible operations and submit them to a cluster scheduler.
    Submit(SubmitArgs),
    /// Write a copy of a job's trajectory with the center beads of each molecule relabeled.
    Relabel(RelabelArgs),
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Project name. Defaults to `name` in mdsweep.toml, then to the directory name.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

/// Arguments for the `status` subcommand.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Restrict the report to these job ids (or unique id prefixes).
    #[arg(short = 'i', long = "job", value_name = "ID")]
    pub jobs: Vec<String>,

    /// Print one row per job in addition to the overview.
    #[arg(short, long)]
    pub detailed: bool,

    /// Print the report as JSON instead of a table.
    #[arg(long, conflicts_with = "detailed")]
    pub json: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Only execute these operations.
    #[arg(short = 'o', long = "operation", value_name = "NAME")]
    pub operations: Vec<String>,

    /// Only consider these job ids (or unique id prefixes).
    #[arg(short = 'i', long = "job", value_name = "ID")]
    pub jobs: Vec<String>,

    /// Stop after executing this many operations.
    #[arg(short = 'n', long = "max-operations", value_name = "INT")]
    pub max_operations: Option<usize>,
}

/// Arguments for the `submit` subcommand.
#[derive(Args, Debug, Default)]
pub struct SubmitArgs {
    /// Only submit these operations.
    #[arg(short = 'o', long = "operation", value_name = "NAME")]
    pub operations: Vec<String>,

    /// Only consider these job ids (or unique id prefixes).
    #[arg(short = 'i', long = "job", value_name = "ID")]
    pub jobs: Vec<String>,

    /// Force an environment profile instead of matching the host name.
    #[arg(long = "env", value_name = "NAME")]
    pub environment: Option<String>,

    /// Host name used for environment matching.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Override the partition of the environment profile.
    #[arg(long, value_name = "PARTITION")]
    pub partition: Option<String>,

    /// Render the scripts without handing them to the scheduler.
    #[arg(long)]
    pub pretend: bool,

    /// Submit operations again even if an earlier submission is on record.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `relabel` subcommand.
#[derive(Args, Debug, Default)]
pub struct RelabelArgs {
    /// The job whose trajectory is relabeled (id or unique id prefix).
    #[arg(short = 'i', long = "job", required = true, value_name = "ID")]
    pub job: String,

    /// Number of beads on each side of a molecule's center that receive the new type.
    #[arg(short = 'k', long, value_name = "INT")]
    pub beads_from_center: Option<usize>,

    /// First frame to relabel.
    #[arg(long, value_name = "INT")]
    pub start: Option<usize>,

    /// Frame to stop before. Defaults to the end of the trajectory.
    #[arg(long, value_name = "INT")]
    pub stop: Option<usize>,

    /// Step between relabeled frames.
    #[arg(long, value_name = "INT")]
    pub stride: Option<usize>,

    /// Name of the particle type assigned to the center beads.
    #[arg(short = 't', long, value_name = "NAME")]
    pub new_type: Option<String>,
}
