use anyhow::Context;
use colored::Colorize;
use outdiff_diff::NullObserver;
use outdiff_pipeline::{ConsoleObserver, Pipeline, PipelineConfig, PipelineError, PipelineRequest};
use outdiff_types::DiffReport;
use tracing::debug;

use crate::cli::{Cli, OutputFormat};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let request = build_request(&cli);
    let pipeline = Pipeline::new(config);

    let result = match cli.format {
        OutputFormat::Text => pipeline.run(&request, &mut ConsoleObserver::stdout()),
        OutputFormat::Json => pipeline.run(&request, &mut NullObserver),
    };
    let report = result.map_err(|e| report_failure(&request, e))?;

    match cli.format {
        OutputFormat::Text => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Layer command-line flags over the configuration file (or defaults).
fn build_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(repo) = &cli.repo {
        config.repo_root = repo.clone();
    }
    if let Some(workspace) = &cli.workspace {
        config.workspace_root = Some(workspace.clone());
    }
    if let Some(date) = cli.date {
        config.date = Some(date);
    }
    if let Some(context) = cli.context_lines {
        config.context_lines = context;
    }
    config.cleanup.on_success |= cli.cleanup_on_success;
    config.cleanup.on_failure |= cli.cleanup_on_failure;
    config.validate()?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn build_request(cli: &Cli) -> PipelineRequest {
    let request = PipelineRequest::new(&cli.current_plugin, &cli.reference, cli.fixtures.iter().cloned());
    match &cli.compare_plugin {
        Some(key) => request.with_compare_plugin(key),
        None => request,
    }
}

fn report_failure(request: &PipelineRequest, error: PipelineError) -> anyhow::Error {
    eprintln!("{} {}", "[Error]".red(), format!("{}", error.kind()).bold());
    anyhow::Error::new(error).context(format!(
        "diffing plugin '{}' against '{}' at {}",
        request.current_plugin, request.compare_plugin, request.reference
    ))
}

fn print_summary(report: &DiffReport) {
    println!("{}", summary_line(report));
}

fn summary_line(report: &DiffReport) -> String {
    if report.is_empty() {
        return format!("{} No differences.", "✓".green().bold());
    }
    format!(
        "{} differences: {} removed, {} added, {} changed",
        report.total().to_string().bold(),
        report.removed_files.len().to_string().red(),
        report.added_files.len().to_string().green(),
        report.changed_files.len().to_string().yellow()
    )
}
