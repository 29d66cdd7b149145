//! Sesame - out-of-band C# assembly builder
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use sesame::cli::{Cli, Commands};
use sesame::config::{Config, ConfigManager};
use sesame::error::{SesameError, SesameResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let label = match e.stage() {
                Some(stage) => format!("Error [{}]:", stage),
                None => "Error:".to_string(),
            };
            eprintln!("{} {}", style(label).red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SesameResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions { shell } = cli.command {
        sesame::cli::commands::completions(shell);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) if !path.exists() => {
            return Err(SesameError::ConfigNotFound(path.clone()));
        }
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| SesameError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    log_config_sources(&config_manager, cli.no_local, local_config_path);

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Build(args) => sesame::cli::commands::build(args, &config).await,
        Commands::BuildAll(args) => sesame::cli::commands::build_all(args, &config).await,
        Commands::Install(args) => sesame::cli::commands::install(args, &config).await,
        Commands::Toolchain => sesame::cli::commands::toolchain(&config).await,
        Commands::Resource(args) => sesame::cli::commands::resource(args, &config).await,
        Commands::Rsp(args) => sesame::cli::commands::rsp(args, &config).await,
        Commands::Config(args) => {
            sesame::cli::commands::config(args, &config, &config_manager).await
        }
        Commands::Cache(args) => sesame::cli::commands::cache(args, &config).await,
    }
}

/// 0 = warn, 1 (or `general.verbose`) = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => 1,
        n => n,
    };
    let filter = match level {
        0 => EnvFilter::new("sesame=warn"),
        1 => EnvFilter::new("sesame=info"),
        _ => EnvFilter::new("sesame=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

fn log_config_sources(manager: &ConfigManager, no_local: bool, local: Option<PathBuf>) {
    debug!("Global config: {}", manager.path().display());
    match local {
        Some(path) => debug!("Found local config: {}", path.display()),
        None if no_local => debug!("Local config discovery disabled (--no-local)"),
        None => debug!("No local config found"),
    }
}
