use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{error, info, warn};

mod export;
mod garmin;
mod models;
mod sleep;

use garmin::{GarminClient, GarminConfig, GarminError};
use models::FieldSet;
use sleep::DateRange;

#[derive(Parser)]
#[command(name = "garmin-sleep-export")]
#[command(about = "Export Garmin Connect sleep telemetry to CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the account holder's profile name
    Profile,
    /// Fetch sleep data for a date range and write it as CSV
    Export {
        /// First date to fetch (YYYY-MM-DD); defaults to a week before the end date
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Last date to fetch (YYYY-MM-DD); defaults to today
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Column set to extract
        #[arg(long, value_enum, default_value_t = FieldSet::Full)]
        fields: FieldSet,
        #[arg(long, default_value = "garmin_sleep_data.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // The one fatal error: everything past this point is reported, not raised.
    let config = GarminConfig::from_env()
        .context("GARMIN_EMAIL and GARMIN_PASSWORD environment variables must be set")?;

    let outcome = match cli.command {
        Commands::Profile => run_profile(&config).await,
        Commands::Export {
            start_date,
            end_date,
            fields,
            out,
        } => run_export(&config, start_date, end_date, fields, &out).await,
    };

    if let Err(err) = outcome {
        report_failure(&err);
    }

    Ok(())
}

async fn run_profile(config: &GarminConfig) -> anyhow::Result<()> {
    let client = login(config).await?;
    println!("{}", client.full_name().unwrap_or("(no profile name)"));
    Ok(())
}

async fn run_export(
    config: &GarminConfig,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    fields: FieldSet,
    out: &Path,
) -> anyhow::Result<()> {
    let client = login(config).await?;

    let range = DateRange::resolve(start_date, end_date);
    info!("fetching sleep data from {} to {}", range.start, range.end);

    let mut records = sleep::collect_range(&client, &range).await;
    if records.is_empty() {
        warn!("no sleep data was retrieved; nothing to write");
        return Ok(());
    }

    if fields.has_derived() {
        sleep::apply_derived_metrics(&mut records);
    }

    export::write_csv(out, &records, fields)?;
    println!(
        "Sleep data saved to {} ({} rows).",
        out.display(),
        records.len()
    );
    Ok(())
}

async fn login(config: &GarminConfig) -> Result<GarminClient, GarminError> {
    let mut client = GarminClient::new();
    info!("connecting to Garmin Connect");
    client.login(config).await?;
    info!("logged in to Garmin Connect");
    Ok(client)
}

fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<GarminError>() {
        Some(GarminError::Authentication) => {
            error!("authentication failed - check GARMIN_EMAIL and GARMIN_PASSWORD");
        }
        Some(GarminError::RateLimited) => {
            error!("Garmin Connect is rate limiting requests - wait a while before retrying");
        }
        _ => error!("{err:#}"),
    }
}
