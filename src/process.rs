use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use indicatif::ProgressBar;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::capture::{capture_frame, write_frame};
use crate::config::Settings;
use crate::model::{Camera, CameraDetails, Country, RunSummary};
use crate::parse::{
    camera_count, max_page_num_blocking, parse_countries, parse_details_blocking,
    parse_listing_blocking,
};
use crate::request::{build_client, countries_url, fetch_html, listing_url, view_url};
use crate::store::{already_captured, file_name, Layout};
use crate::ui::{camera_bar, finish_bar};
use crate::{info_time, Error, Result, CAMERAS_PER_PAGE};

/// Result of capturing a single camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Captured(PathBuf),
    Skipped,
}

/// Output options of a run.
#[derive(Debug, Clone)]
pub struct Output {
    pub layout: Layout,
    pub new_cams_only: bool,
    pub time_stamp: bool,
}

/// Everything a run needs, cheap to clone into capture tasks.
#[derive(Clone)]
pub struct Scraper {
    client: Client,
    settings: Arc<Settings>,
    base: Url,
    output: Arc<Output>,
}

impl Scraper {
    pub fn new(settings: Settings, output: Output) -> Result<Self> {
        let client = build_client(&settings)?;
        let base = Url::parse(&format!("{}/", settings.site_root()))?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
            base,
            output: Arc::new(output),
        })
    }

    pub async fn fetch_countries(&self) -> Result<Vec<Country>> {
        let json = fetch_html(&self.client, &countries_url(&self.settings)).await?;
        parse_countries(&json)
    }

    /// Logs every country with its camera count, returns the total.
    pub async fn list_countries(&self) -> Result<u32> {
        let countries = self.fetch_countries().await?;
        let mut total = 0;
        for c in &countries {
            println!("{:<4} {:<40} {:>6}", c.code, c.name, c.count);
            total += c.count;
        }
        println!("{} countries, {total} cameras", countries.len());
        Ok(total)
    }

    pub async fn details(&self, camera_id: &str) -> Result<CameraDetails> {
        let url = view_url(&self.settings, camera_id);
        let html = fetch_html(&self.client, &url).await?;
        parse_details_blocking(html, camera_id.to_string(), self.base.clone()).await
    }

    /// Captures one frame of `image_url` into the layout directory.
    pub async fn capture_camera(
        &self,
        camera_id: &str,
        identifier: &str,
        image_url: &str,
        country_name: Option<&str>,
    ) -> Result<Outcome> {
        let dir = self
            .output
            .layout
            .dir(&self.settings.images_dir, camera_id, country_name);
        if self.output.new_cams_only && already_captured(&dir, identifier).await {
            debug!("{identifier} already captured, skipping");
            return Ok(Outcome::Skipped);
        }

        info!("START processing {identifier}: {image_url}");
        let frame = capture_frame(&self.client, image_url, self.settings.max_frame_bytes).await?;
        let stamp = self.output.time_stamp.then(Local::now);
        let path = dir.join(file_name(identifier, stamp));
        write_frame(frame, &path).await?;
        info!("DONE processing {identifier} -> {}", path.display());
        Ok(Outcome::Captured(path))
    }

    pub async fn scrape_url(&self, url: &str, identifier: &str) -> Result<Outcome> {
        self.capture_camera(identifier, identifier, url, None).await
    }

    /// Looks the camera up first to learn its endpoint and country.
    pub async fn scrape_one(&self, camera_id: &str, identifier: Option<&str>) -> Result<Outcome> {
        let details = self.details(camera_id).await?;
        self.capture_camera(
            camera_id,
            identifier.unwrap_or(camera_id),
            &details.image_url,
            details.country.as_deref(),
        )
        .await
    }

    /// Name and camera count of a country from the country JSON, if it is reachable.
    async fn lookup_country(&self, code: &str) -> Option<Country> {
        match self.fetch_countries().await {
            Ok(countries) => countries.into_iter().find(|c| c.code == code),
            Err(e) => {
                warn!("Country list unavailable: {e}");
                None
            }
        }
    }

    pub async fn scrape_country(&self, code: &str, pages: Option<u32>) -> Result<RunSummary> {
        let code = code.to_uppercase();
        let (name, known_count) = match self.lookup_country(&code).await {
            Some(c) => (c.name, Some(c.count)),
            None => (code.clone(), None),
        };
        self.scrape_country_pages(&code, &name, known_count, pages).await
    }

    async fn fetch_listing(&self, code: &str, page: u32) -> Result<String> {
        let url = listing_url(&self.settings, code, page);
        match fetch_html(&self.client, &url).await {
            Err(Error::NotFound(_)) => Err(Error::CountryNotFound(code.to_string())),
            res => res,
        }
    }

    async fn scrape_country_pages(
        &self,
        code: &str,
        name: &str,
        known_count: Option<u32>,
        pages: Option<u32>,
    ) -> Result<RunSummary> {
        let start_time = Local::now();
        let first_page = self.fetch_listing(code, 1).await?;
        let first_cameras = parse_listing_blocking(first_page.clone(), self.base.clone()).await?;

        let max_pages = match max_page_num_blocking(first_page).await {
            Ok(n) => n,
            Err(Error::PageNavigatorMissing) if !first_cameras.is_empty() => 1,
            Err(Error::PageNavigatorMissing) => 0,
            Err(e) => return Err(e),
        };
        info!("{name} ({code}) has {max_pages} pages of cameras.");
        if max_pages == 0 {
            return Ok(RunSummary::default());
        }

        let pages = match pages {
            Some(p) if p > max_pages => {
                return Err(Error::InvalidArgs(format!(
                    "{p} pages exceeds the maximum of {max_pages} pages"
                )))
            }
            Some(p) => p,
            None => max_pages,
        };

        let mut last_page = None;
        let total = if pages < max_pages {
            pages * CAMERAS_PER_PAGE
        } else if let Some(count) = known_count {
            count
        } else if max_pages == 1 {
            first_cameras.len() as u32
        } else {
            let html = self.fetch_listing(code, max_pages).await?;
            let cams = parse_listing_blocking(html, self.base.clone()).await?;
            let count = camera_count(max_pages, cams.len());
            last_page = Some(cams);
            count
        };
        info!("Scraping {pages} pages, about {total} cameras.");

        let bar = camera_bar(total as u64, name);
        let mut summary = RunSummary::default();
        let mut current = Some(first_cameras);

        for page in 1..=pages {
            // Request the next page while the current one is being captured.
            let next = (page < pages).then(|| {
                let scraper = self.clone();
                let code = code.to_string();
                tokio::spawn(async move { scraper.fetch_listing(&code, page + 1).await })
            });

            info!("SCRAPING PAGE {page}/{pages}");
            if let Some(cameras) = current.take() {
                summary.merge(self.capture_page(cameras, name, &bar).await);
            }

            current = match next {
                Some(handle) if page + 1 == max_pages && last_page.is_some() => {
                    handle.abort();
                    last_page.take()
                }
                Some(handle) => match handle.await? {
                    Ok(html) => Some(parse_listing_blocking(html, self.base.clone()).await?),
                    Err(e) => {
                        error!("Could not fetch page {} of {code}: {e}", page + 1);
                        None
                    }
                },
                None => None,
            };
        }

        finish_bar(&bar);
        info_time!(start_time, "Finished {name}: {summary}");
        Ok(summary)
    }

    /// Captures every camera of a page concurrently, bounded by the configured concurrency.
    async fn capture_page(
        &self,
        cameras: Vec<Camera>,
        country_name: &str,
        bar: &ProgressBar,
    ) -> RunSummary {
        let permits = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut task_set = JoinSet::new();
        for camera in cameras {
            let scraper = self.clone();
            let permits = permits.clone();
            let country_name = country_name.to_string();
            task_set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let res = scraper
                    .capture_camera(
                        &camera.id,
                        &camera.id,
                        &camera.image_url,
                        Some(country_name.as_str()),
                    )
                    .await;
                (camera, res)
            });
        }

        let mut summary = RunSummary::default();
        while let Some(task) = task_set.join_next().await {
            record(&mut summary, task);
            bar.inc(1);
        }
        summary
    }

    /// Scrapes every country of the country JSON, one after another.
    pub async fn scrape_all(&self) -> Result<RunSummary> {
        let start_time = Local::now();
        let countries = self.fetch_countries().await?;
        info!("Scraping {} countries.", countries.len());

        let mut summary = RunSummary::default();
        for country in countries {
            match self
                .scrape_country_pages(&country.code, &country.name, Some(country.count), None)
                .await
            {
                Ok(s) => summary.merge(s),
                Err(e) => error!("Could not scrape {}: {e}", country.code),
            }
        }
        info_time!(start_time, "Finished all countries: {summary}");
        Ok(summary)
    }

    /// Scrapes a country again and again, waiting `interval` after each run, until CTRL+C.
    pub async fn repeat(&self, code: &str, pages: Option<u32>, interval: Duration) -> Result<()> {
        let mut run = 1;
        loop {
            info!("Run {run} of {code}");
            tokio::select! {
                res = self.scrape_country(code, pages) => {
                    if let Err(e) = res {
                        error!("Run {run} failed: {e}");
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }

            info!("Waiting {} seconds, exit with CTRL+C", interval.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => break,
            }
            run += 1;
        }
        info!("Stopped after {run} runs.");
        Ok(())
    }
}

/// Counts the outcome of one capture task. A panicked task counts as failed.
fn record(
    summary: &mut RunSummary,
    task: std::result::Result<(Camera, Result<Outcome>), JoinError>,
) {
    match task {
        Ok((_, Ok(Outcome::Captured(_)))) => summary.captured += 1,
        Ok((_, Ok(Outcome::Skipped))) => summary.skipped += 1,
        Ok((camera, Err(e))) => {
            warn!("Camera {} failed: {e}", camera.id);
            summary.failed += 1;
        }
        Err(e) => {
            error!("Capture task died: {e}");
            summary.failed += 1;
        }
    }
}
