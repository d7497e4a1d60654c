use anyhow::{Context, Result};
use clap::Parser;
use mixerctl::commands::{self, Cli, LogLevel};
use mixerctl::config::Config;
use std::io::{self, Write};
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = Config::log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // Without a log file the command still runs, just unlogged
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: cannot open log file {}: {}", log_path.display(), err);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .init();

    tracing::info!("mixerctl {} started with log level: {:?}", mixerctl::VERSION, level);

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_guard = setup_logging(cli.log_level);
    let config = Config::load();

    let mut stdout = io::stdout().lock();
    let result = commands::run(&cli, &config, &mut stdout).await;
    stdout.flush().context("Failed to flush output")?;

    if let Err(err) = result {
        tracing::error!("{}", err);
        eprintln!("Error: {}", err);
        drop(log_guard);
        std::process::exit(err.exit_code());
    }

    Ok(())
}
