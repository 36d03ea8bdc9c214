//! Baton CLI - run user-configured macros from a terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use baton::engine::{FileSettings, MacroEngine, RhaiRuntime};
use baton::host::console::{ConsoleNotifier, CwdWorkspace, LocalCommandHost};
use baton::host::shell::SystemShell;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(name = "baton")]
#[command(version = "0.1.0")]
#[command(about = "A user-configurable macro engine")]
#[command(
    long_about = "Baton runs named macros: ordered sequences of host commands, shell \
                  snippets, and embedded scripts, with dynamic values injected into \
                  action arguments before dispatch."
)]
struct Cli {
    /// Settings file holding the `macros:` mapping
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a macro by name, or pick one interactively
    Run {
        /// Macro name; omit to choose from a picker
        name: Option<String>,
    },

    /// List the names of all registered macros
    List,

    /// Pick a host command from everything invokable and run it
    Commands,

    /// Show a fixed confirmation message proving the engine loaded
    Dummy,
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine the user config directory")?;
    Ok(base.join("baton").join("macros.yml"))
}

fn init_tracing(level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    let settings = Arc::new(FileSettings::load(&config_path).await?);
    let engine = MacroEngine::new(
        settings,
        Arc::new(LocalCommandHost::new()),
        Arc::new(ConsoleNotifier),
        Arc::new(SystemShell),
        Arc::new(CwdWorkspace),
        Arc::new(RhaiRuntime::new()),
    );

    let _entry_points = engine.install_entry_points();
    let summary = engine.load();
    debug!("loaded {} macros from {:?}", summary.count, config_path);

    match cli.command {
        Commands::Run { name: Some(name) } => engine.execute(&name).await,
        Commands::Run { name: None } => engine.run_by_name().await,
        Commands::List => {
            for name in engine.macro_names() {
                println!("{name}");
            }
        }
        Commands::Commands => engine.list_host_commands().await,
        Commands::Dummy => engine.dummy().await,
    }

    // macro failures were already reported through the notifier; a failed
    // run never turns into a process failure
    Ok(())
}
