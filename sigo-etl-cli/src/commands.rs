//! Subcommand handlers.

use crate::{Cli, Commands, ConfigAction, RunArgs};
use anyhow::Context;
use sigo_etl_core::{
    EtlConfig, EtlError, JsonFileOccurrenceSource, Pipeline, RunReport, load_config, run_pipeline,
};
use std::path::Path;
use tracing::{debug, info};

pub(crate) async fn handle(cli: Cli) -> anyhow::Result<()> {
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| cli.workspace.clone());

    let mut config = load_config(Some(&workspace), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    anchor_output_dir(&mut config, &workspace);

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(config, args, cli.quiet).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            let rendered = toml::to_string_pretty(&config.redacted())
                .context("rendering configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

/// A relative output dir from configuration is relative to the workspace.
fn anchor_output_dir(config: &mut EtlConfig, workspace: &Path) {
    if config.output.dir.is_relative() {
        config.output.dir = workspace.join(&config.output.dir);
    }
}

/// Apply command-line flags on top of the loaded configuration.
/// Returns the settings that were overridden.
fn apply_overrides(config: &mut EtlConfig, args: &RunArgs) -> Vec<&'static str> {
    let mut applied = Vec::new();
    if let Some(endpoint) = &args.endpoint {
        config.source.endpoint = endpoint.clone();
        applied.push("source.endpoint");
    }
    if let Some(token) = &args.token {
        config.source.token = Some(token.clone());
        applied.push("source.token");
    }
    if let Some(output) = &args.output {
        config.output.dir = output.clone();
        applied.push("output.dir");
    }
    if let Some(timeout) = args.timeout {
        config.source.timeout_secs = timeout;
        applied.push("source.timeout_secs");
    }
    if args.no_summary {
        config.output.write_summary = false;
        applied.push("output.write_summary");
    }
    applied
}

async fn run(mut config: EtlConfig, args: RunArgs, quiet: bool) -> anyhow::Result<()> {
    let overrides = apply_overrides(&mut config, &args);
    if !overrides.is_empty() {
        debug!(?overrides, "Applied command-line overrides");
    }

    let result = match &args.input {
        Some(path) => {
            info!(input = %path.display(), "Replaying saved response");
            replay(&config, path).await
        }
        None => {
            info!(endpoint = %config.source.endpoint, "Fetching from API");
            run_pipeline(&config).await
        }
    };
    let report = result.map_err(|e| anyhow::anyhow!("{} stage failed: {}", e.stage(), e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print!("{}", render_report(&report));
    }
    Ok(())
}

async fn replay(config: &EtlConfig, input: &Path) -> Result<RunReport, EtlError> {
    config.validate()?;
    Pipeline::new(
        Box::new(JsonFileOccurrenceSource::new(input)),
        config.output.clone(),
    )
    .run()
    .await
}

fn render_report(report: &RunReport) -> String {
    let mut out = format!(
        "ETL completed: {} occurrences from {} ({})\n  categories: {}\n  applicant roles: {}\n",
        report.rows,
        report.source.location,
        report.source.source_type,
        report.categories,
        report.applicant_roles,
    );
    for path in [
        &report.files.dim_categoria,
        &report.files.dim_applicant_role,
        &report.files.fato_ocorrencia,
    ] {
        out.push_str(&format!("  wrote {}\n", path.display()));
    }
    if let Some(path) = &report.summary_file {
        out.push_str(&format!("  wrote {}\n", path.display()));
    }
    out
}
