//! CLI commands for course-scraper.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::browser::{ChromeDriver, Session};
use crate::config::AppConfig;
use crate::csv_io::{extract_col, save_courses, WriteMode};
use crate::duration;
use crate::sites::{coursera, udemy};

#[derive(Parser)]
#[command(name = "course-scraper")]
#[command(
    version,
    about = "Scrape course prices and lengths from Udemy and Coursera",
    long_about = None
)]
pub struct Cli {
    /// Config file (defaults to ./scraper.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape Udemy course pages
    Udemy {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Scrape Coursera course pages
    Coursera {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Print the hour value of a duration string
    Duration {
        /// Free-text duration, e.g. "2 days" or "Approx. 4 to 6 weeks"
        #[arg(value_name = "TEXT")]
        text: String,
    },
}

#[derive(clap::Args)]
pub struct IoArgs {
    /// Input CSV with one course URL per row
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output CSV
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Input column holding the URLs (overrides input.link_column)
    #[arg(long)]
    pub column: Option<String>,

    /// Append to the output file instead of overwriting it
    #[arg(short, long)]
    pub append: bool,
}

impl IoArgs {
    fn mode(&self) -> WriteMode {
        if self.append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        }
    }

    fn input_or(&self, default: &str) -> PathBuf {
        self.input.clone().unwrap_or_else(|| PathBuf::from(default))
    }

    fn output_or(&self, default: &str) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from(default))
    }
}

/// Scrape Udemy courses listed in the input CSV.
pub async fn run_udemy(config_path: Option<PathBuf>, io: IoArgs) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let input = io.input_or("data/udemy.csv");
    let output = io.output_or("out/udemy-prices.csv");
    let column = io
        .column
        .clone()
        .unwrap_or_else(|| config.input.link_column.clone());

    let rows = extract_col(&input, &column)?;
    tracing::info!("Loaded {} URLs from {}", rows.len(), input.display());

    let driver = ChromeDriver::launch(&config.browser).await?;
    let session = Session::from_settings(driver, &config.browser);

    let courses = udemy::scrape_courses(&session, &config.udemy, &rows).await;
    session.close().await;

    save_courses(&courses, &output, io.mode())
}

/// Scrape Coursera courses listed in the input CSV.
///
/// An unexpected browser error aborts the batch before anything is written.
pub async fn run_coursera(config_path: Option<PathBuf>, io: IoArgs) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let input = io.input_or("data/coursera.csv");
    let output = io.output_or("out/coursera-prices.csv");
    let column = io
        .column
        .clone()
        .unwrap_or_else(|| config.input.link_column.clone());

    let rows = extract_col(&input, &column)?;
    tracing::info!("Loaded {} URLs from {}", rows.len(), input.display());

    let driver = ChromeDriver::launch(&config.browser).await?;
    let session = Session::from_settings(driver, &config.browser);

    let result = coursera::scrape_courses(&session, &config.coursera, &rows).await;
    session.close().await;
    let courses = result.context("Coursera scrape aborted")?;

    save_courses(&courses, &output, io.mode())
}

/// Print a duration in hours, or an empty line when it does not parse.
pub fn run_duration(text: &str) {
    match duration::to_hours(text) {
        Some(hours) => println!("{}", hours),
        None => println!(),
    }
}
