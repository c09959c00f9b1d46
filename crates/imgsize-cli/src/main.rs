use anyhow::{Context, Result};
use clap::Parser;
use imgsize_cli::{
    collect_files, Cli, Commands, Config, ConfigCommands, Exit, OutputFormatter, ProgressReporter,
};
use imgsize_core::{Analyzer, BatchProcessor, BatchStatus};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also come through here
            return if e.use_stderr() {
                Exit::Usage.into()
            } else {
                Exit::Success.into()
            };
        }
    };

    init_logging(cli.verbose);

    // Load config
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default config: {:#}", e);
        Config::default()
    });

    // Override config with CLI flags
    if cli.no_color {
        config.colored_output = false;
    }
    if cli.no_progress {
        config.show_progress = false;
    }
    if cli.jobs > 0 {
        config.parallel_jobs = cli.jobs;
    }

    let formatter = OutputFormatter::new(config.colored_output);
    let progress = ProgressReporter::new(config.show_progress);

    let outcome = match cli.command {
        Commands::Analyze {
            files,
            json,
            dir,
            recursive,
        } => {
            let json = json || config.json_output;
            handle_analyze(&files, dir, recursive, json, &config, &formatter, &progress)
        }

        Commands::Config { action } => handle_config(action, &formatter).map(|_| Exit::Success),
    };

    match outcome {
        Ok(exit) => exit.into(),
        Err(e) => {
            formatter.error(&format!("{:#}", e));
            Exit::for_error(&e).into()
        }
    }
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_logging(verbose: bool) {
    let log_level = if verbose {
        "imgsize=debug"
    } else {
        "imgsize=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn handle_analyze(
    args: &[String],
    dir: Option<PathBuf>,
    recursive: bool,
    json: bool,
    config: &Config,
    formatter: &OutputFormatter,
    progress: &ProgressReporter,
) -> Result<Exit> {
    let files = collect_files(args, dir.as_deref(), recursive)?;

    match files.as_slice() {
        [] => {
            formatter.error("No supported image files found");
            Ok(Exit::FileNotFound)
        }
        [path] => analyze_single(path, json, formatter),
        _ => analyze_batch(&files, json, config, formatter, progress),
    }
}

fn analyze_single(path: &Path, json: bool, formatter: &OutputFormatter) -> Result<Exit> {
    let result = Analyzer::new()
        .analyze_path(path)
        .with_context(|| format!("Failed to analyze {}", path.display()));

    match result {
        Ok(metadata) => {
            if json {
                OutputFormatter::print_json(&metadata)?;
            } else {
                formatter.print_metadata(&metadata);
            }
            Ok(Exit::Success)
        }
        Err(e) => {
            let exit = Exit::for_error(&e);
            if json {
                OutputFormatter::print_json(&serde_json::json!({
                    "error": format!("{:#}", e),
                    "exit_code": exit.code(),
                }))?;
            } else {
                formatter.error(&format!("{:#}", e));
            }
            Ok(exit)
        }
    }
}

fn analyze_batch(
    files: &[PathBuf],
    json: bool,
    config: &Config,
    formatter: &OutputFormatter,
    progress: &ProgressReporter,
) -> Result<Exit> {
    if !json {
        formatter.info(&format!("Found {} files to analyze", files.len()));
    }

    let processor = BatchProcessor::new(config.parallel_jobs);
    let pb = progress.create_bar(files.len() as u64, "Analyzing...");

    let report = processor.process_with_progress(files, |_, _| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;

    if report.status() == BatchStatus::Complete {
        ProgressReporter::finish_bar(&pb, "Batch complete");
    } else {
        ProgressReporter::finish_bar_error(
            &pb,
            &format!("{} files failed", report.summary.failed_files),
        );
    }

    if json {
        OutputFormatter::print_json(&report)?;
    } else {
        formatter.print_batch(&report);
    }

    Ok(Exit::for_batch(report.status()))
}

fn handle_config(action: ConfigCommands, formatter: &OutputFormatter) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let config = Config::load()?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }

        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            formatter.success(&format!("Set {} = {}", key, value));
        }

        ConfigCommands::Reset => {
            Config::reset()?;
            formatter.success("Configuration reset to defaults");
        }

        ConfigCommands::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
