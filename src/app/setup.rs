//! This module handles the initial setup of the application.
use super::args::{AppArgs, Command};
use crate::config::{Config, CONFIG_FILE};
use crate::logging::{self, LogBuffer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const LOG_BUFFER_SIZE: usize = 500;

/// Everything `launch` needs once arguments are parsed.
pub struct PreparedApp {
    pub command: Command,
    pub data_dir: PathBuf,
    pub config: Config,
    pub config_path: PathBuf,
    pub logs: Arc<LogBuffer>,
}

/// Prepares the application for running.
///
/// 1. Configures logging (console output only for one-shot commands).
/// 2. Creates the data directory.
/// 3. Loads the config file, falling back to defaults if it is missing.
/// 4. Prints a start banner for the shell.
pub fn prepare(args: AppArgs) -> Result<PreparedApp> {
    let command = args.command();
    let interactive = command == Command::Shell;

    let logs = Arc::new(LogBuffer::new(LOG_BUFFER_SIZE));
    logging::init(args.verbose, logs.clone(), !interactive);

    let data_dir = PathBuf::from(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    debug!("Loaded config from {}", config_path.display());

    if interactive {
        print_start_banner(&data_dir, &config_path, &config);
    }

    Ok(PreparedApp {
        command,
        data_dir,
        config,
        config_path,
        logs,
    })
}

fn print_start_banner(data_dir: &std::path::Path, config_path: &std::path::Path, config: &Config) {
    println!("🎬 VIP Video Parser v{}", env!("CARGO_PKG_VERSION"));
    println!("Data directory: {}", data_dir.display());
    println!("Config: {}", config_path.display());
    println!("Lines configured: {}", config.endpoints.len());
    println!("Type 'help' for commands.");
    println!();
}
