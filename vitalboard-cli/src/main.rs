//! vitalboard CLI - renders care-facility dashboard pages and chart specifications

#![deny(warnings)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vitalboard_core::config::{self, ResolvedConfig};
use vitalboard_core::{chart, DataStore, FigureKind, Page};

#[derive(Parser)]
#[command(name = "vitalboard")]
#[command(about = "Render the care-facility health dashboard from CSV exports")]
#[command(version = env!("VITALBOARD_VERSION"))]
struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one dashboard page to a self-contained HTML file
    Render {
        /// Page to render
        page: Page,

        /// Directory holding the CSV exports (overrides config file)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (default: .vitalboard/<page>.html)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print one chart's JSON specification to stdout
    Figure {
        /// Chart to build
        kind: FigureKind,

        /// Directory holding the CSV exports (overrides config file)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or show the configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without rendering
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            page,
            data_dir,
            config,
            output,
        } => {
            let resolved = load_config(config.as_deref(), data_dir)?;

            let html = page
                .load_and_render(&resolved)
                .with_context(|| format!("failed to render {} page", page))?;

            let output_path = output
                .unwrap_or_else(|| PathBuf::from(format!(".vitalboard/{}.html", page.as_str())));
            write_html_report(&output_path, &html)?;
            eprintln!("Dashboard written to: {}", output_path.display());
        }
        Commands::Figure {
            kind,
            data_dir,
            config,
        } => {
            let resolved = load_config(config.as_deref(), data_dir)?;

            let store = DataStore::load(&resolved.data_dir, &resolved.files, &[kind.dataset()])
                .with_context(|| format!("failed to load data for {}", kind))?;
            let figure = kind
                .build(&store, &resolved.chart)
                .with_context(|| format!("failed to build {}", kind))?;
            println!("{}", chart::to_json_pretty(&figure));
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let root = std::env::current_dir()?;
                match config::load_and_resolve(&root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

/// Install the stderr log subscriber; RUST_LOG wins over --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve config from the working directory, then apply CLI overrides
fn load_config(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<ResolvedConfig> {
    let root = std::env::current_dir()?;
    let mut resolved =
        config::load_and_resolve(&root, config_path).context("failed to load configuration")?;
    if let Some(dir) = data_dir {
        resolved.data_dir = dir;
    }
    tracing::debug!(data_dir = %resolved.data_dir.display(), "resolved configuration");
    Ok(resolved)
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Data:");
    println!("  data_dir: {}", resolved.data_dir.display());
    for dataset in vitalboard_core::Dataset::ALL {
        let marker = if resolved.files.overrides().contains_key(&dataset) {
            " (override)"
        } else {
            ""
        };
        println!(
            "  {}: {}{}",
            dataset,
            resolved.files.file_name(dataset),
            marker
        );
    }
    println!();
    println!("Charts:");
    println!("  plotly_js: {}", resolved.plotly_js);
    println!("  chart_height: {}", resolved.chart.height);
    println!("  weekly_metric: {}", resolved.chart.weekly_metric.as_str());
    println!("  comparison_order: {}", resolved.chart.comparison_order.as_str());
    println!("  sleep_zmax: {}", resolved.chart.sleep_zmax);
    println!("  fall_zmax: {}", resolved.chart.fall_zmax);
    println!("  distance_axis_max: {}", resolved.chart.distance_axis_max);
    println!();
    println!("Gauge:");
    println!("  max: {}", resolved.chart.gauge.max);
    println!("  normal_low: {}", resolved.chart.gauge.normal_low);
    println!("  normal_high: {}", resolved.chart.gauge.normal_high);
}

/// Write HTML report to file with atomic write pattern
fn write_html_report(path: &Path, html: &str) -> anyhow::Result<()> {
    use std::fs;

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    // Atomic write (temp + rename pattern)
    let temp_path = path.with_extension("html.tmp");
    fs::write(&temp_path, html)
        .with_context(|| format!("Failed to write temporary file: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temporary file to: {}", path.display()))?;

    Ok(())
}
