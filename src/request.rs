use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::Settings;
use crate::{Error, Result};

/// Builds the client shared by every request of a run.
/// `Client` uses an `Arc` internally so it is cheap to clone into tasks.
pub(crate) fn build_client(settings: &Settings) -> Result<Client> {
    let client = Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;
    Ok(client)
}

/// Requests a page and returns a `Result<String>` containing the HTML.
pub(crate) async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    debug!("GET {url}");
    let res = client.get(url).send().await?;
    let res = check_status(res, url)?;
    let html = res.text().await?;
    Ok(html)
}

pub(crate) fn check_status(res: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    match res.status() {
        s if s.is_success() => Ok(res),
        StatusCode::NOT_FOUND => Err(Error::NotFound(url.to_string())),
        status => Err(Error::Status {
            status,
            url: url.to_string(),
        }),
    }
}

/// Listing page of a country, pages start at 1.
pub(crate) fn listing_url(settings: &Settings, country: &str, page: u32) -> String {
    format!(
        "{}/bycountry/{}/?page={page}",
        settings.site_root(),
        country.to_uppercase()
    )
}

pub(crate) fn view_url(settings: &Settings, camera_id: &str) -> String {
    format!("{}/view/{camera_id}/", settings.site_root())
}

pub(crate) fn countries_url(settings: &Settings) -> String {
    format!("{}/jsoncountries/", settings.site_root())
}
