use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use insecrawl::cli::{Action, Args};
use insecrawl::config::Settings;
use insecrawl::process::{Outcome, Output, Scraper};
use insecrawl::ui::IndicatifWriter;
use insecrawl::{info_time, Error, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(IndicatifWriter)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(false)
        .with_ansi(true)
        .init();

    let start_time = Local::now();
    let action = args.action()?;
    let settings = Settings::load()?;
    let scraper = Scraper::new(
        settings,
        Output {
            layout: args.layout(),
            new_cams_only: args.new_cams_only,
            time_stamp: args.time_stamp,
        },
    )?;

    match action {
        Action::ListCountries => {
            scraper.list_countries().await?;
        }
        Action::Details(id) => {
            let details = scraper.details(&id).await?;
            println!("{details}");
        }
        Action::Url { url, identifier } => {
            report(scraper.scrape_url(&url, &identifier).await?);
        }
        Action::OneCamera { id, identifier } => {
            report(scraper.scrape_one(&id, identifier.as_deref()).await?);
        }
        Action::Country {
            code,
            pages,
            interval: Some(interval),
        } => {
            scraper.repeat(&code, pages, interval).await?;
        }
        Action::Country {
            code,
            pages,
            interval: None,
        } => match scraper.scrape_country(&code, pages).await {
            Ok(summary) => info!("{code}: {summary}"),
            Err(Error::CountryNotFound(code)) => error!("Country not found: {code}"),
            Err(e) => return Err(e),
        },
        Action::ScrapeAll => {
            let summary = scraper.scrape_all().await?;
            info!("All countries: {summary}");
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Captured(path) => info!("Saved {}", path.display()),
        Outcome::Skipped => info!("Already captured, nothing to do"),
    }
}
