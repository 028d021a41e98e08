use std::time::Duration;

use clap::Parser;

use crate::store::Layout;
use crate::{Error, Result};

/// Capture still frames from the cameras listed on insecam.org.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Debug level logging
    #[arg(long)]
    pub verbose: bool,

    /// List all available countries (default action)
    #[arg(short, long)]
    pub list_countries: bool,

    /// Country code of the country you want to scrape
    #[arg(short, long)]
    pub country: Option<String>,

    /// Scrape only the first N pages of the country
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: Option<u32>,

    /// Get details of a camera ID
    #[arg(short, long, value_name = "ID")]
    pub details: Option<String>,

    /// Scrape only one camera ID
    #[arg(short, long, value_name = "ID")]
    pub one_camera: Option<String>,

    /// Folder to save images to under ./images/
    #[arg(short, long)]
    pub folder: Option<String>,

    /// A direct URL to a video stream or snapshot to grab a still frame from.
    /// Useful when the camera is no longer listed but still publicly reachable.
    /// Must be used together with --identifier
    #[arg(short, long)]
    pub url: Option<String>,

    /// A custom identifier for the camera, used as file name.
    /// Works only with --url or --one-camera
    #[arg(short, long)]
    pub identifier: Option<String>,

    /// Scrape all cameras of every country. This can take hours to complete
    #[arg(long)]
    pub scrape_all_cameras: bool,

    /// Save images to ./images/<COUNTRY_NAME> (default)
    #[arg(long)]
    pub sort_by_country: bool,

    /// Save images to ./images/<CAMERA_ID>
    #[arg(long)]
    pub sort_by_camera: bool,

    /// Only scrape cameras that have not been scraped before (by file name on disk)
    #[arg(long)]
    pub new_cams_only: bool,

    /// Add a timestamp to the file name of the image
    #[arg(long)]
    pub time_stamp: bool,

    /// Seconds to wait between runs. Works only with --country.
    /// The wait starts after the last camera is scraped. Exit with CTRL+C
    #[arg(
        long,
        value_name = "SECS",
        requires = "country",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: Option<u64>,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListCountries,
    Details(String),
    Url { url: String, identifier: String },
    OneCamera { id: String, identifier: Option<String> },
    Country {
        code: String,
        pages: Option<u32>,
        interval: Option<Duration>,
    },
    ScrapeAll,
}

impl Args {
    pub fn action(&self) -> Result<Action> {
        if let Some(id) = &self.details {
            return Ok(Action::Details(id.clone()));
        }
        if let Some(url) = &self.url {
            let identifier = self.identifier.clone().ok_or_else(|| {
                Error::InvalidArgs("--url must be used together with --identifier".into())
            })?;
            return Ok(Action::Url {
                url: url.clone(),
                identifier,
            });
        }
        if let Some(id) = &self.one_camera {
            return Ok(Action::OneCamera {
                id: id.clone(),
                identifier: self.identifier.clone(),
            });
        }
        if let Some(code) = &self.country {
            return Ok(Action::Country {
                code: code.trim().to_uppercase(),
                pages: self.pages,
                interval: self.interval.map(Duration::from_secs),
            });
        }
        if self.scrape_all_cameras {
            return Ok(Action::ScrapeAll);
        }
        Ok(Action::ListCountries)
    }

    pub fn layout(&self) -> Layout {
        match (&self.folder, self.sort_by_camera) {
            (Some(folder), _) => Layout::Folder(folder.clone()),
            (None, true) => Layout::Camera,
            (None, false) => Layout::Country,
        }
    }
}
