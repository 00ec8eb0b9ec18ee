// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tomomesh CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tomomesh::cli::Reporter;
use tomomesh::config::DEFAULT_CONFIG_FILE;
use tomomesh::{
    analyze, import_obj, ConsoleProgress, Pipeline, ProgressSink, ReconConfig, ResizeFilter,
    SilentProgress,
};

#[derive(Parser)]
#[command(name = "tomomesh")]
#[command(about = "Surface mesh reconstruction from tomography slice stacks", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics of an existing OBJ mesh
    Inspect {
        /// OBJ file
        mesh: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct RunArgs {
    /// Directory containing the image sequence
    #[arg(value_name = "INPUT_DIR")]
    input: Option<PathBuf>,

    /// Output OBJ file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// First slice to include
    #[arg(long)]
    start: Option<usize>,

    /// Number of slices to include (0 = all remaining)
    #[arg(long)]
    count: Option<usize>,

    /// Resize factor applied to every slice
    #[arg(short, long)]
    resolution: Option<f32>,

    /// Threshold of the extracted surface
    #[arg(short, long)]
    iso_level: Option<f32>,

    /// Surround the stack with zero-valued slices and borders
    #[arg(long, overrides_with = "no_padding")]
    padding: bool,

    /// Disable zero padding
    #[arg(long, overrides_with = "padding")]
    no_padding: bool,

    /// Resize filter (nearest, bilinear)
    #[arg(long, value_name = "FILTER")]
    filter: Option<ResizeFilter>,

    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Configuration file (defaults to ./tomomesh.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the run report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Write the effective configuration as TOML
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,
}

impl RunArgs {
    fn padding(&self) -> Option<bool> {
        if self.no_padding {
            Some(false)
        } else if self.padding {
            Some(true)
        } else {
            None
        }
    }

    /// Defaults < config file < environment < flags
    fn resolve_config(&self) -> Result<ReconConfig> {
        let mut config = match &self.config {
            Some(path) => ReconConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
                .with_env_overrides()?,
            None => ReconConfig::load()
                .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?,
        };

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(iso_level) = self.iso_level {
            config.iso_level = iso_level;
        }
        if let Some(padding) = self.padding() {
            config.padding = padding;
        }
        if let Some(filter) = self.filter {
            config.resize_filter = filter;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }

        Ok(config.validate()?)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Inspect { mesh }) => inspect_command(mesh, cli.quiet),
        Some(Commands::Version) => {
            println!("tomomesh v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => reconstruct_command(&cli.run, cli.quiet),
    }
}

fn reconstruct_command(args: &RunArgs, quiet: bool) -> Result<()> {
    let config = args.resolve_config()?;

    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        if !quiet {
            Reporter::report_info(&format!("Configuration saved to {}", path.display()));
        }
    }

    if !quiet {
        Reporter::report_config(&config);
    }

    let console = ConsoleProgress::new();
    let progress: &dyn ProgressSink = if quiet { &SilentProgress } else { &console };
    let report = Pipeline::new(&config, progress)
        .run()
        .context("Reconstruction failed")?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    if !quiet {
        Reporter::report_reconstruction(&report);
        if report.triangle_count == 0 {
            Reporter::report_warning(&format!(
                "No surface found at iso level {}",
                report.iso_level
            ));
        } else {
            Reporter::success(&format!(
                "Wrote {} triangles to {}",
                report.triangle_count,
                report.output.display()
            ));
        }
    }

    Ok(())
}

fn inspect_command(path: &Path, quiet: bool) -> Result<()> {
    let mesh = import_obj(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let stats = analyze(&mesh);

    if quiet {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        Reporter::report_stats(&path.display().to_string(), &stats);
    }
    Ok(())
}
