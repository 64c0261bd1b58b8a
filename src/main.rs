//! CLI entry point.
//!
//! Thin clap front end over the library: loads layered settings, applies
//! command-line overrides and runs an analysis into the configured sink.

use anyhow::{Context, Result};
use chunkforge::analyzer::LanguageAnalyzer;
use chunkforge::chunk::sink_for;
use chunkforge::config::OutputFormat;
use chunkforge::error::AnalysisError;
use chunkforge::indexing::SourceIndexBuilder;
use chunkforge::{Settings, logging};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Java code chunk extractor
#[derive(Parser)]
#[command(
    name = "chunkforge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Turn a Java project into cross-referenced code chunks",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and export its chunks
    Analyze {
        /// Project root directory
        root: PathBuf,

        #[command(flatten)]
        overrides: AnalyzeOverrides,
    },

    /// Build the source index only and report what it found
    Index {
        /// Project root directory
        root: PathBuf,
    },

    /// Write a default .chunkforge/settings.toml
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective settings
    Config,
}

#[derive(clap::Args, Default)]
struct AnalyzeOverrides {
    /// Identifier stamped on every chunk
    #[arg(long)]
    project_id: Option<String>,

    /// Branch stamped on every chunk
    #[arg(long)]
    branch: Option<String>,

    /// Files analyzed concurrently
    #[arg(short, long)]
    threads: Option<usize>,

    /// Resolve through the configured language server
    #[arg(long, overrides_with = "no_semantic")]
    semantic: bool,

    /// Syntax-only resolution
    #[arg(long)]
    no_semantic: bool,

    /// Output base directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: json or jsonl
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Only analyze files whose path ends with this suffix (repeatable)
    #[arg(long = "target")]
    targets: Vec<String>,
}

impl AnalyzeOverrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(project_id) = self.project_id {
            settings.analysis.project_id = project_id;
        }
        if let Some(branch) = self.branch {
            settings.analysis.branch = branch;
        }
        if let Some(threads) = self.threads {
            settings.analysis.parallel_workers = threads;
        }
        if self.semantic {
            settings.semantic.enabled = true;
        } else if self.no_semantic {
            settings.semantic.enabled = false;
        }
        if let Some(dir) = self.output {
            settings.output.dir = dir;
        }
        if let Some(format) = self.format {
            settings.output.format = format;
        }
        if !self.targets.is_empty() {
            settings.analysis.target_files = self.targets;
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Configuration error loading from {}", path.display())),
        None => Ok(Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            eprintln!("Using default configuration.");
            Settings::default()
        })),
    }
}

async fn analyze(settings: Settings, root: &Path) -> Result<ExitCode> {
    let settings = Arc::new(settings);
    let analyzer = LanguageAnalyzer::new(settings.clone())?;

    let token = analyzer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing in-flight files");
            token.cancel();
        }
    });

    let analysis = &settings.analysis;
    let mut sink = sink_for(&settings.output, &analysis.project_id, &analysis.branch)?;
    match analyzer.analyze(root, &mut sink).await {
        Ok(report) => {
            println!("{report}");
            for skipped in report.skipped.iter().chain(&report.unindexed) {
                println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{e} ({})", e.status_code());
            if let AnalysisError::Scan(scan) = &e {
                for suggestion in scan.recovery_suggestions() {
                    eprintln!("  hint: {suggestion}");
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn index(settings: Settings, root: &Path) -> Result<ExitCode> {
    let builder = SourceIndexBuilder::new(Arc::new(settings));
    let root = root.to_path_buf();
    let built = tokio::task::spawn_blocking(move || builder.build(&root))
        .await
        .context("indexing task failed")?;

    let index = match built {
        Ok(index) => index,
        Err(e) => {
            error!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!(
        "Indexed {} types from {} files ({} discovered)",
        index.len(),
        index.files().len(),
        index.discovered()
    );
    for file in index.unindexed() {
        println!("  unindexed {}: {}", file.path.display(), file.reason);
    }
    for diagnostic in index.diagnostics() {
        info!("{diagnostic:?}");
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        return match Settings::init_config_file(force) {
            Ok(path) => {
                println!("Created configuration file at: {}", path.display());
                println!("Edit this file to customize your settings.");
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {e}");
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let mut settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { root, overrides } => {
            overrides.apply(&mut settings);
            logging::init(&settings.logging);
            analyze(settings, &root).await
        }
        Commands::Index { root } => {
            logging::init(&settings.logging);
            index(settings, &root).await
        }
        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!(
                "{}",
                toml::to_string_pretty(&settings).context("Error displaying config")?
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { .. } => Ok(ExitCode::SUCCESS),
    }
}
