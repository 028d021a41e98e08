use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),
    #[error("No page navigator found on the listing page.")]
    PageNavigatorMissing,

    #[error("Page not found: {0}")]
    NotFound(String),
    #[error("Country not found: {0}")]
    CountryNotFound(String),
    #[error("Unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("No JPEG frame could be read from {0}")]
    NoFrame(String),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("Config Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Url Error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
