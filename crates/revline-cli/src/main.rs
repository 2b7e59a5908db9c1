//! revline - literature review pipeline
//!
//! Imports search results, prepares and deduplicates records, runs the
//! prescreen, links full texts, runs the screen and keeps synthesis
//! endpoints in sync, committing every batch operation to the project
//! history.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod settings;

use cmd::Project;
use config::Config;

#[derive(Parser)]
#[command(name = "revline")]
#[command(about = "Literature review pipeline with tracked record status")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./revline.toml or ~/.config/revline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Create a review project
    Init(cmd::init::InitArgs),
    /// Import search results
    Import(cmd::import::ImportArgs),
    /// Check metadata and mark records prepared
    Prep(cmd::prep::PrepArgs),
    /// Resolve duplicates interactively
    Dedupe(cmd::dedupe::DedupeArgs),
    /// Prescreen processed records
    Prescreen(cmd::prescreen::PrescreenArgs),
    /// Link local PDFs to included records
    Pdfs(cmd::pdfs::PdfsArgs),
    /// Screen full texts
    Screen(cmd::screen::ScreenArgs),
    /// Update synthesis endpoints
    Data(cmd::data::DataArgs),
    /// Show record counts per status
    Status(cmd::status::StatusArgs),
    /// Show the commit history
    Log(cmd::history::LogArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = revline_core::ProgressContext::new();
    let multi = progress.is_tty().then(|| progress.multi());
    let verbosity = revline_core::Verbosity::from_flags(cli.quiet, cli.debug);
    revline_core::init_logging(verbosity, multi).context("failed to initialize logging")?;
    revline_core::install_signal_handlers().context("failed to install signal handlers")?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Init(args) => cmd::init::run(args, &cli.dir, &config),
        Command::Import(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::import::run(args, &mut project, &progress)
        }
        Command::Prep(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::prep::run(args, &mut project, &progress)
        }
        Command::Dedupe(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::dedupe::run(args, &mut project, &progress)
        }
        Command::Prescreen(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::prescreen::run(args, &mut project)
        }
        Command::Pdfs(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::pdfs::run(args, &mut project)
        }
        Command::Screen(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::screen::run(args, &mut project)
        }
        Command::Data(args) => {
            let mut project = Project::open(&cli.dir, &config)?;
            cmd::data::run(args, &mut project, &progress)
        }
        Command::Status(args) => cmd::status::run(args, &Project::open(&cli.dir, &config)?),
        Command::Log(args) => cmd::history::run(args, &Project::open(&cli.dir, &config)?),
        Command::Config => {
            use comfy_table::{
                modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Config file".to_string(),
                config
                    .source
                    .as_ref()
                    .map_or("defaults".to_string(), |p| p.display().to_string()),
            ]);
            table.add_row(vec!["Commit author".to_string(), config.author()]);
            table.add_row(vec!["Project".to_string(), cli.dir.display().to_string()]);
            if let Ok(project) = Project::open(&cli.dir, &config) {
                let settings = &project.settings;
                table.add_row(vec!["Title".to_string(), settings.project.title.clone()]);
                table.add_row(vec![
                    "Sources".to_string(),
                    settings.sources.len().to_string(),
                ]);
                table.add_row(vec![
                    "Dedupe scope".to_string(),
                    format!("{:?}", settings.dedupe.scope),
                ]);
                let endpoints: Vec<_> = settings.data.endpoints.iter().map(|e| e.kind()).collect();
                table.add_row(vec!["Data endpoints".to_string(), endpoints.join(", ")]);
            }

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
