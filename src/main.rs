//! CLI interface for trip-scout

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use trip_scout::config::{weather_settings_from_env, MAX_DAYS};
use trip_scout::{score_condition, window_end, ConditionScorer, GeoPoint, Scout, ScoutConfig, WeatherClient};

#[derive(Parser)]
#[command(name = "trip-scout")]
#[command(about = "Find cheap flights to sunny places and pair them with hotels")]
#[command(version)]
pub struct Cli {
    /// Also write JSON logs to daily files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline once
    Run {
        /// Output file for the JSON report
        #[arg(short, long)]
        output: Option<String>,
        /// Write resolved IATA codes back to the sheet
        #[arg(long)]
        update_sheet: bool,
        /// Find deals without sending WhatsApp messages
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve the sheet's cities to IATA codes
    Resolve {
        /// Write resolved IATA codes back to the sheet
        #[arg(long)]
        update_sheet: bool,
    },
    /// Score daily condition descriptions without any API call
    Score {
        /// One day's conditions, repeat for every day
        #[arg(short, long = "condition", required = true)]
        conditions: Vec<String>,
    },
    /// Fetch and score the forecast of a location
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// First day of the window (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
        /// Length of the window in nights
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAYS)))]
        nights: u32,
    },
}

/// Human-readable logs on stderr, plus JSON files when `log_dir` is set
fn init_logging(log_dir: Option<&PathBuf>) -> Result<()> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trip_scout=info"))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "trip-scout.log");
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    debug!("Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_ref())?;

    match cli.command {
        Commands::Run {
            output,
            update_sheet,
            dry_run,
        } => {
            let config = ScoutConfig::from_env()?;
            let threshold = config.weather_threshold;
            let scout = Scout::new(config)?
                .with_sheet_updates(update_sheet)
                .with_dry_run(dry_run);

            info!("Starting scouting run");
            let report = scout.run().await?;
            let json = serde_json::to_string_pretty(&report)?;

            if let Some(output_file) = output {
                fs::write(&output_file, &json)?;
                println!("Report saved to {}", output_file);
            } else {
                println!("{}", json);
            }

            println!("\nSummary:");
            println!("Destinations: {}", report.destinations.len());
            if !report.unresolved_cities.is_empty() {
                println!("Unresolved cities: {}", report.unresolved_cities.join(", "));
            }
            let sunny = report.flights.iter().filter(|f| f.good_weather).count();
            println!(
                "Flights found: {} ({} with weather score >= {})",
                report.flights.len(),
                sunny,
                threshold
            );
            println!("Deals: {}", report.deals.len());
            println!("Messages sent: {}", report.notifications_sent);
        }
        Commands::Resolve { update_sheet } => {
            let config = ScoutConfig::from_env()?;
            let scout = Scout::new(config)?.with_sheet_updates(update_sheet);
            let (destinations, unresolved) = scout.resolve_destinations().await?;

            for destination in &destinations {
                println!("{} -> {}", destination.city, destination.iata_code);
            }
            for city in &unresolved {
                println!("{} -> not found", city);
            }
        }
        Commands::Score { conditions } => {
            let mut scorer = ConditionScorer::new();
            for condition in &conditions {
                println!("{:>2}  {}", score_condition(condition), condition);
                scorer.record(condition.as_str());
            }
            println!("Weather score: {:.2}", scorer.score()?);
        }
        Commands::Forecast {
            lat,
            lon,
            date,
            nights,
        } => {
            let (base_url, api_key) = weather_settings_from_env()?;
            let weather = WeatherClient::new(&base_url, &api_key)?;
            let point = GeoPoint {
                latitude: lat,
                longitude: lon,
            };
            let end = window_end(date, nights)?;

            let days = weather.daily_forecast(point, date, end).await?;
            let mut scorer = ConditionScorer::new();
            for day in days {
                let condition = day.conditions.unwrap_or_default();
                let label = day
                    .datetime
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!("{}  {:>2}  {}", label, score_condition(&condition), condition);
                scorer.record(condition);
            }
            println!("Weather score: {:.2}", scorer.score()?);
        }
    }

    Ok(())
}
