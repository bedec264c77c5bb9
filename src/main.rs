//! iPlug Composer - project composer for iPlug2 audio plugins
//!
//! Main entry point for the command line front end.
//!
//! # Overview
//!
//! The binary initializes:
//! - Settings ([`ConfigManager::load_settings`]: defaults, `settings.toml`, environment)
//! - Logging infrastructure (daily file rotation + optional console output)
//! - Tokio async runtime (file I/O, SDK downloads, generator process)
//! - [`CommandController`] (maps the command onto the workspace and files stores)
//!
//! # Execution Flow
//!
//! 1. Parse the command line
//! 2. Load settings from the settings directory
//! 3. Initialize logging → `<log_dir>/iplug-composer.<date>`
//! 4. Create the tokio runtime
//! 5. Run the command; its outcome is reported as a notification
//! 6. Shutdown the runtime with a 5s timeout

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use iplug_composer::models::default_settings_dir;
use iplug_composer::ui::{Command, CommandController, ConsoleNotifier};
use iplug_composer::{APP_NAME, ConfigManager, VERSION};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "iplug-composer", version, about = "Project composer for iPlug2 audio plugins")]
struct Cli {
    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Only log to the log file
    #[arg(long)]
    no_console: bool,

    /// Workspace config the command operates on
    #[arg(short, long, default_value = "composer.json", global = true)]
    config: Utf8PathBuf,

    /// Directory holding settings.toml and the recent projects list
    #[arg(long, global = true)]
    settings_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(cli.settings_dir.clone().unwrap_or_else(default_settings_dir))?;
    let settings = config_manager.load_settings()?;

    // Relative log directories live next to the settings
    let log_dir = if settings.log_dir().is_absolute() {
        settings.log_dir().to_path_buf()
    } else {
        config_manager.settings_dir().join(settings.log_dir())
    };
    let _guard = iplug_composer::logging::setup_logging(
        &log_dir,
        cli.debug || settings.debug,
        !cli.no_console,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("iplug-composer-worker")
        .build()?;

    let controller = CommandController::new(
        config_manager,
        &settings,
        cli.config,
        Arc::new(ConsoleNotifier),
    );

    let result = runtime.block_on(controller.run(cli.command));

    // Stop watchers before the runtime goes away
    drop(controller);
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Shutdown complete");

    // The notifier has already reported the failure
    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
