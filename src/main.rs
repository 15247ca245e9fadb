mod api;
mod cli;
mod clock;
mod config;
mod db;
mod errors;
mod models;
mod tracker;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::clock::{Clock, EasternClock};
use crate::config::Config;
use crate::db::Database;
use crate::tracker::export::{self, ExportFormat};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = Config::resolve()?;
            api::run_server(Arc::new(config), Arc::new(EasternClock)).await
        }
        Commands::Status => handle_status(),
        Commands::Goal { value } => handle_goal(value),
        Commands::Export { format, output } => handle_export(&format, output),
        Commands::Reset { yes } => handle_reset(yes),
        Commands::Config { command } => handle_config_command(command),
    }
}

fn handle_status() -> Result<()> {
    let database = open_database()?;
    let clock = EasternClock;
    let state = tracker::current_state(&database, &clock)?;
    let summary = &state.summary;

    println!("jobtracker status ({})", clock.today());
    println!("- daily_goal: {}", state.daily_goal);
    println!("- total_streak: {}", summary.total_streak);
    println!("- goal_streak: {}", summary.goal_streak);
    println!("- total_days_logged: {}", summary.total_days_logged);
    println!(
        "- last_log: {}",
        summary
            .last_completed_date
            .zip(summary.last_log_status)
            .map(|(date, status)| format!("{date} ({status})"))
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

fn handle_goal(value: i64) -> Result<()> {
    let mut database = open_database()?;
    let settings = tracker::update_goal(&mut database, value)?;

    println!("Daily goal set to {}", settings.daily_goal);
    Ok(())
}

fn handle_export(format: &str, output: Option<PathBuf>) -> Result<()> {
    let format = format.parse::<ExportFormat>().map_err(|error| anyhow!(error))?;
    let database = open_database()?;
    let records = tracker::history(&database)?;
    let rendered = export::render(&records, format)?;

    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write export file: {}", path.display()))?;
            println!("Exported {} day(s) to {}", records.len(), path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn handle_reset(confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("Refusing to delete all data without --yes");
    }

    let mut database = open_database()?;
    let settings = tracker::reset_all(&mut database)?;
    info!(daily_goal = settings.daily_goal, "all data reset");

    println!("All data reset successfully");
    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load().unwrap_or_default();
            config.set_value(&key, &value)?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::resolve()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn open_database() -> Result<Database> {
    let config = Config::resolve()?;
    Database::open(&config.db_path)
}
