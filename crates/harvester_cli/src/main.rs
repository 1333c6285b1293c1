use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use harvest_logging::{harvest_error, harvest_warn, LevelFilter, LogDestination};
use harvester_cli::cli::{Cli, Command};
use harvester_cli::commands;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: cannot start async runtime: {err}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            harvest_error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    match &cli.log_file {
        Some(path) => harvest_logging::initialize(LogDestination::Both, level, path),
        None => harvest_logging::initialize(LogDestination::Terminal, level, &PathBuf::new()),
    };
}

async fn run(cli: Cli) -> Result<bool> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            harvest_warn!("interrupt received, stopping the session");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Authors { config, authors } => {
            commands::harvest_authors(&config, &authors, cancel).await
        }
        Command::Keywords { config } => commands::harvest_keywords(&config, cancel).await,
        Command::CollectAuthors { input, output } => commands::collect_authors(&input, &output),
    }
}
