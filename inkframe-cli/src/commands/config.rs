//! `inkframe config` — fetch, inspect, and validate display configurations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};

use inkframe_core::types::{Condition, DisplayConfig, ScreenSpec};
use inkframe_core::Settings;
use inkframe_daemon::ConfigClient;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Fetch the remote configuration and print the screen table.
    Show,
    /// Validate a local configuration document.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to a JSON display configuration document.
    pub file: PathBuf,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(),
        ConfigCommand::Check(args) => check(&args.file),
    }
}

fn show() -> Result<()> {
    let settings = Settings::from_env().context("invalid environment settings")?;
    let url = settings
        .config_url
        .context("INKFRAME_CONFIG_URL is not set")?;

    let client = ConfigClient::new(url.clone(), settings.http_timeout);
    let config = client
        .fetch()
        .with_context(|| format!("failed to fetch configuration from {url}"))?;

    print_config(&config);
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let config: DisplayConfig = serde_json::from_str(&raw).with_context(|| {
        format!("{} is not a valid display configuration", file.display())
    })?;

    println!(
        "{} {} ({} screens)",
        "ok:".green(),
        file.display(),
        config.screens.len()
    );
    print_config(&config);
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct ScreenRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Policy")]
    policy: String,
    #[tabled(rename = "Conditions")]
    conditions: String,
    #[tabled(rename = "Forced")]
    forced: String,
}

fn print_config(config: &DisplayConfig) {
    let rows: Vec<ScreenRow> = config
        .screens
        .iter()
        .enumerate()
        .map(|(index, screen)| ScreenRow {
            index,
            url: screen.url.clone(),
            policy: policy_summary(screen),
            conditions: conditions_summary(screen),
            forced: if screen.force_show_if_conditions_match {
                "yes".to_string()
            } else {
                String::new()
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    println!(
        "randomize: {}  refresh: {}m  conditions check: {}m",
        config.randomize_screens,
        config.refresh_interval_minutes,
        config.conditions_check_interval_minutes,
    );
}

fn policy_summary(screen: &ScreenSpec) -> String {
    match screen.window() {
        Some((start, end)) => format!("{start}-{end}"),
        None => format!("every {}m", screen.duration_ms() / 60_000),
    }
}

fn conditions_summary(screen: &ScreenSpec) -> String {
    if screen.conditions.is_empty() {
        return "always".to_string();
    }
    screen
        .conditions
        .iter()
        .map(condition_summary)
        .collect::<Vec<_>>()
        .join("; ")
}

fn condition_summary(condition: &Condition) -> String {
    match condition {
        Condition::UserZone {
            entity,
            zone,
            expected_state,
        } => {
            let op = if *expected_state { "in" } else { "not in" };
            format!("{entity} {op} {zone}")
        }
        Condition::DayOfWeek {
            days,
            expected_state,
        } => {
            let names: Vec<&str> = days
                .iter()
                .map(|d| match d {
                    0 => "sun",
                    1 => "mon",
                    2 => "tue",
                    3 => "wed",
                    4 => "thu",
                    5 => "fri",
                    6 => "sat",
                    _ => "?",
                })
                .collect();
            let op = if *expected_state { "on" } else { "not on" };
            format!("{op} {}", names.join(","))
        }
        Condition::CalendarEvent {
            calendar, search, ..
        } => format!("calendar {calendar} ~ '{search}' (inactive)"),
    }
}
