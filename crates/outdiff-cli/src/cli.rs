use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "outdiff",
    about = "Diff the output of an export plugin against its version at a git reference",
    version
)]
pub struct Cli {
    /// Key of the plugin in the working tree
    #[arg(long = "current-plugin", short = 'p')]
    pub current_plugin: String,

    /// Key of the plugin at the reference [default: the current plugin]
    #[arg(long = "compare-plugin", short = 'c')]
    pub compare_plugin: Option<String>,

    /// Git reference to compare against, e.g. `master`, `HEAD~1` or a commit
    #[arg(long = "ref", short = 'r', default_value = "HEAD")]
    pub reference: String,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repository root holding the plugins and fixtures
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Disposable workspace directory [default: <repo>/tmp]
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Export timestamp handed to both plugins (RFC 3339)
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,

    /// Remove the workspace after a successful run
    #[arg(long)]
    pub cleanup_on_success: bool,

    /// Remove the workspace after a failed run
    #[arg(long)]
    pub cleanup_on_failure: bool,

    /// Unchanged lines shown around each change
    #[arg(long = "context", short = 'U')]
    pub context_lines: Option<usize>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Fixture files to export, as `<group>/<item>.json` paths
    #[arg(required = true)]
    pub fixtures: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
