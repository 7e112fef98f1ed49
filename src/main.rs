mod commands;
mod logging;
mod reporter;

use std::fs;
use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ProcessArgs, RootArgs, ScanArgs, ToolArgs};
use console::style;
use dotenv::dotenv;
use photo_stats::config::{load_configuration, AppConfig};
use photo_stats::{export, render_charts, ExifTool, PngChartWriter, Renderer, StatsEngine};
use reporter::CliReporter;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Process(process_args)) => run_process(config, &process_args),
        Some(Commands::Scan(scan_args)) => run_scan(config, &scan_args),
        Some(Commands::CheckTool(tool_args)) => run_check_tool(config, &tool_args),
        Some(Commands::PrintConfig) => print_config(&config),
        None => Cli::command()
            .print_long_help()
            .context("printing help"),
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn apply_roots(config: &mut AppConfig, roots: &RootArgs) {
    if !roots.roots.is_empty() {
        config.root_paths = roots.roots.clone();
    }
}

fn apply_tool(config: &mut AppConfig, tool: &ToolArgs) {
    if let Some(tool_path) = &tool.tool {
        config.tool_path = tool_path.clone();
    }
}

fn run_process(mut config: AppConfig, args: &ProcessArgs) -> anyhow::Result<()> {
    apply_roots(&mut config, &args.roots);
    apply_tool(&mut config, &args.tool);
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate().context("invalid options")?;

    let output_dir = config.output_dir.clone();
    let engine = StatsEngine::new(config);
    info!("Using metadata tool {}", engine.tool().tool_path().display());
    let reporter = CliReporter::new();
    let result = engine.run(&reporter).context("metadata run failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out)?;
    export::dump_distributions(&mut out, &result.distributions)?;
    out.flush()?;
    drop(out);

    if !result.failures.is_empty() {
        if args.show_errors {
            println!();
            println!(
                "{}",
                style(format!("{} files could not be read:", result.failures.len()))
                    .bold()
                    .red()
            );
            for failure in &result.failures {
                println!("  {}", failure);
            }
        } else {
            warn!(
                "{} files could not be read (use --show-errors to list them)",
                result.failures.len()
            );
        }
    }

    let renderer = Renderer::new(&output_dir, PngChartWriter::new());
    let report = render_charts(&renderer, &result.distributions, &reporter);

    if args.csv {
        fs::create_dir_all(renderer.output_dir())?;
        let csv_path = renderer.output_dir().join("distributions.csv");
        let rows = export::write_csv(&csv_path, &result.distributions)
            .with_context(|| format!("writing {}", csv_path.display()))?;
        info!("Wrote {} rows to {}", rows, csv_path.display());
    }

    println!();
    info!(
        "Scan: {}, Extract: {}, Render: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.extract_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.duration.as_secs_f64()).green(),
    );
    info!(
        "{} candidate files, {} read, {} failed, {} charts saved",
        format!("{}", result.candidate_count).cyan(),
        format!("{}", result.success_count).green(),
        format!("{}", result.failures.len()).red(),
        format!("{}", report.saved.len()).cyan(),
    );

    if !report.failed.is_empty() {
        anyhow::bail!("{} charts could not be rendered", report.failed.len());
    }

    Ok(())
}

fn run_scan(mut config: AppConfig, args: &ScanArgs) -> anyhow::Result<()> {
    apply_roots(&mut config, &args.roots);
    config.validate().context("invalid options")?;

    let engine = StatsEngine::new(config);
    let candidates = engine.discover().context("scan failed")?;

    if args.list {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for candidate in &candidates {
            writeln!(out, "{}", candidate.path.display())?;
        }
    }
    info!(
        "{} candidate files",
        format!("{}", candidates.len()).cyan()
    );
    Ok(())
}

fn run_check_tool(mut config: AppConfig, args: &ToolArgs) -> anyhow::Result<()> {
    apply_tool(&mut config, args);
    let tool = ExifTool::new(&config.tool_path);

    match tool.version() {
        Some(version) => {
            info!(
                "{} is available (version {})",
                tool.tool_path().display(),
                version.green()
            );
            Ok(())
        }
        None => anyhow::bail!(
            "{} could not be run; set tool_path or pass --tool",
            tool.tool_path().display()
        ),
    }
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("serializing configuration")?;
    println!("{}", rendered);
    Ok(())
}
