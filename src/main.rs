//! course-scraper
//!
//! Drives a Chromium session over Udemy and Coursera course pages and writes
//! price and length data to CSV.

mod browser;
mod cli;
mod config;
mod csv_io;
mod duration;
mod sites;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Udemy { io } => cli::run_udemy(cli.config, io).await,
        Commands::Coursera { io } => cli::run_coursera(cli.config, io).await,
        Commands::Duration { text } => {
            cli::run_duration(&text);
            Ok(())
        }
    }
}
