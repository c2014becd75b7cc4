//! Idolboard CLI
//!
//! Command-line interface for Idolboard operations:
//! - Log activity events
//! - Show the weekly active-user series (offline from a log file or via the API)
//! - Show the dashboard summary
//! - Import activity from CSV
//! - Check status

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use idolboard::activity::{ActivityLog, CsvImporter};
use idolboard::analytics::{DashboardStats, ReportingZone, WeeklyActiveUsers, WeeklyActivity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idolboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Activity statistics for the idol database admin dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an activity event
    Log {
        /// User id
        user: String,
        /// Action label (e.g. view_idol, comment, favorite)
        #[arg(short, long)]
        action: Option<String>,
        /// Timestamp (default: now). Supports: "now", ISO 8601, Unix milliseconds
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Show the 7-day daily-active-user series
    Weekly {
        /// Read a local activity log instead of calling the API
        #[arg(long)]
        file: Option<PathBuf>,
        /// Reporting time zone for --file (IANA name or "local")
        #[arg(long, default_value = "UTC")]
        tz: String,
        /// Evaluate the window at this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<String>,
    },

    /// Show the dashboard summary
    Dashboard {
        /// Evaluate the window at this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<String>,
    },

    /// Import activity from a CSV export (columns: user_id, timestamp, action)
    Import {
        /// Path to CSV file
        path: PathBuf,
        /// Dry run (don't actually import)
        #[arg(long)]
        dry_run: bool,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Log { user, action, time } => {
            let timestamp = match time.as_deref() {
                None | Some("now") => Utc::now().timestamp_millis(),
                Some(s) => match idolboard::activity::parse_timestamp_text(s) {
                    Some(ts) => ts,
                    None => {
                        eprintln!("Invalid timestamp format: {}", s);
                        std::process::exit(1);
                    }
                },
            };

            let body = serde_json::json!({
                "user_id": user,
                "action": action,
                "timestamp": timestamp,
            });

            let response = client
                .post(format!("{}/api/v1/activity", cli.api_url))
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() {
                let dt = DateTime::from_timestamp_millis(timestamp)
                    .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("Logged activity for {} at {}", user, dt);
            } else {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                eprintln!("Failed ({}): {}", status, text);
                std::process::exit(1);
            }
        }

        Commands::Weekly { file, tz, now } => {
            let weekly: WeeklyActivity = match file {
                Some(path) => {
                    let zone = ReportingZone::parse(&tz)?;
                    let now = parse_now(now.as_deref())?;
                    let records = ActivityLog::replay(&path)?;
                    WeeklyActiveUsers::new(zone).try_aggregate(now, records)?
                }
                None => {
                    let mut request = client.get(format!("{}/api/v1/stats/weekly", cli.api_url));
                    if let Some(now) = &now {
                        request = request.query(&[("now", now)]);
                    }
                    let response = request.send().await?;
                    if !response.status().is_success() {
                        let status = response.status();
                        let text = response.text().await.unwrap_or_default();
                        eprintln!("Request failed ({}): {}", status, text);
                        std::process::exit(1);
                    }
                    response.json().await?
                }
            };

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&weekly)?),
                "csv" => write_weekly_csv(&weekly, std::io::stdout())?,
                _ => print_weekly_table(&weekly),
            }
        }

        Commands::Dashboard { now } => {
            let mut request = client.get(format!("{}/api/v1/stats/dashboard", cli.api_url));
            if let Some(now) = &now {
                request = request.query(&[("now", now)]);
            }
            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                eprintln!("Request failed ({}): {}", status, text);
                std::process::exit(1);
            }

            let stats: DashboardStats = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_dashboard(&stats);
            }
        }

        Commands::Import { path, dry_run } => {
            if !path.exists() {
                eprintln!("File not found: {:?}", path);
                std::process::exit(1);
            }

            let result = CsvImporter::new().import(&path)?;

            println!("Import results:");
            println!("  Rows processed: {}", result.rows_processed);
            println!("  Rows failed: {}", result.rows_failed);

            if !result.errors.is_empty() {
                println!();
                println!("Errors (first 10):");
                for error in result.errors.iter().take(10) {
                    println!("  {}", error);
                }
            }

            if dry_run {
                println!();
                println!("(Dry run - no data was imported)");
            } else if !result.records.is_empty() {
                println!();
                println!("Importing activity...");

                let mut accepted = 0;
                let mut rejected = 0;

                for chunk in result.records.chunks(1000) {
                    let events: Vec<serde_json::Value> = chunk
                        .iter()
                        .filter_map(|record| record.to_event())
                        .map(|event| {
                            serde_json::json!({
                                "user_id": event.user_id,
                                "action": event.action,
                                "timestamp": event.timestamp,
                            })
                        })
                        .collect();

                    let response = client
                        .post(format!("{}/api/v1/activity/batch", cli.api_url))
                        .json(&serde_json::json!({ "events": events }))
                        .send()
                        .await?;

                    let body: serde_json::Value = response.json().await.unwrap_or_default();
                    accepted += body["accepted"].as_u64().unwrap_or(0);
                    rejected += body["rejected"].as_u64().unwrap_or(events.len() as u64);
                }

                println!("  Imported: {}", accepted);
                if rejected > 0 {
                    println!("  Rejected: {}", rejected);
                }
            }
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Idolboard v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!(
                        "Activity log: {} ({} records)",
                        health["activity_log"].as_str().unwrap_or("unknown"),
                        health["logged_events"].as_u64().unwrap_or(0)
                    );

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Idolboard API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the API server is running:");
                    eprintln!("  cargo run --bin idolboard");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = idolboard::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match now {
        None => Ok(Utc::now()),
        Some(text) => Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc)),
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_weekly_table(weekly: &WeeklyActivity) {
    println!("Daily active users ({})", weekly.timezone);
    println!();
    println!("{:<12} {:<5} {:>6}", "Date", "Day", "Users");
    println!("{}", "-".repeat(25));

    for day in &weekly.series {
        println!("{:<12} {:<5} {:>6}", day.date.to_string(), day.label, day.count);
    }

    println!();
    println!("Today: {}", weekly.today_count);
    println!("Unique this week: {}", weekly.weekly_unique_users);
    if weekly.skipped_malformed > 0 {
        println!("Skipped (malformed): {}", weekly.skipped_malformed);
    }
}

fn write_weekly_csv<W: std::io::Write>(
    weekly: &WeeklyActivity,
    out: W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(out);
    for day in &weekly.series {
        writer.serialize(day)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_dashboard(stats: &DashboardStats) {
    println!("Dashboard ({}, as of {})", stats.timezone, stats.generated_at.format("%Y-%m-%d %H:%M"));
    println!();
    println!("  Daily active users:  {}", stats.daily_active_users);
    println!("  Weekly active users: {}", stats.weekly_active_users);
    println!("  Events this week:    {}", stats.events_in_window);
    println!();

    let peak = stats.series.iter().map(|day| day.count).max().unwrap_or(0).max(1);
    for day in &stats.series {
        let bar = "#".repeat(day.count * 30 / peak);
        println!("  {} {:>5} {}", day.label, day.count, bar);
    }

    if !stats.actions.is_empty() {
        println!();
        println!("  {:<20} {:>8}", "Action", "Events");
        for (action, count) in &stats.actions {
            println!("  {:<20} {:>8}", action, count);
        }
    }
}
