use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

mod cli;
mod config;
mod error;
mod event;
mod factory;
mod sender;
mod session;
mod trace;

use cli::Cli;
use config::{ConfigFile, ConfigSource, LogLevel};
use event::LogEvent;
use sender::MessageSender;

fn setup_logging(cli: &Cli, config: &dyn ConfigSource) -> Result<()> {
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else if cli.quiet {
        LogLevel::Error
    } else {
        LogLevel::from_str(&config.value("LOG_LEVEL")).unwrap_or_default()
    };

    // RUST_LOG env var takes precedence, otherwise use the configured level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }

    let log_file = config.value("LOG_FILE");
    if !log_file.is_empty() {
        let log_file = ConfigFile::expand_path(Path::new(&log_file));
        if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
        let target = Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .context("Failed to open log file")?,
        );
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.init();

    info!("Log level: {:?}", log_level);
    Ok(())
}

/// Send the event `count` times, sleeping `delay` between sends
fn send_events(sender: &mut dyn MessageSender, event: &LogEvent, count: u32, delay: Duration) -> Result<()> {
    for i in 0..count {
        if i > 0 {
            thread::sleep(delay);
        }
        sender
            .send_message(event)
            .inspect_err(|e| log::error!("{:?} error from {}: {}", e.kind(), sender.name(), e))
            .with_context(|| format!("Error from SendMessage ({} of {})", i + 1, count))?;
        info!("Sent event {} of {} via {}", i + 1, count, sender.name());
    }
    Ok(())
}

fn run(cli: Cli, config: &dyn ConfigSource) -> Result<()> {
    let event = cli.build_event()?;

    if factory::trace_enabled(config) {
        println!("{}", "*** SENDER_TRACE is enabled ***".yellow());
    }
    let mut sender = factory::sender_from_config(config).context("Error initializing output")?;

    sender.open_svc().context("Error from OpenSvc")?;

    let sent = send_events(sender.as_mut(), &event, cli.count, Duration::from_secs(cli.delay));
    let closed = sender.close_svc().context("Error from CloseSvc");

    if sent.is_err()
        && let Err(e) = &closed
    {
        log::warn!("{:#}", e);
    }
    sent?;
    closed
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load the config file (before logging, so log messages in ConfigFile::load are silent)
    let config_file = ConfigFile::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let config_path = config_file.path.clone();

    // Config file sits under the environment
    let config = config_file.layered_over_env();

    setup_logging(&cli, &config).context("Failed to setup logging")?;

    info!("logevent send version {}", env!("GIT_DESCRIBE"));
    if let Some(path) = config_path {
        info!("Using config file {}", path.display());
    }

    run(cli, &config)?;

    Ok(())
}
