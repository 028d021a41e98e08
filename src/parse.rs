use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tokio::task::spawn_blocking;
use url::Url;

use crate::model::{Camera, CameraDetails, Country};
use crate::{Error, Result, CAMERAS_PER_PAGE};

fn page_navigator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"pagenavigator\("\?page=", (\d+), \d+\);"#).expect("page navigator regex")
    })
}

fn view_href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/view/(\d+)/?").expect("view href regex"))
}

fn country_href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/bycountry/([A-Za-z]{2})/?").expect("country href regex"))
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

/// Text content of an element with runs of whitespace collapsed.
fn clean_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds the number of listing pages from the `pagenavigator(...)` call in the page scripts.
/// The last match wins.
pub fn max_page_num(html: &str) -> Result<u32> {
    let doc = Html::parse_document(html);
    let script_selector = create_selector("script")?;

    let mut max_pages = None;
    for script in doc.select(&script_selector) {
        let body = script.text().collect::<String>();
        if let Some(n) = page_navigator_re()
            .captures_iter(&body)
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .last()
        {
            max_pages = Some(n);
        }
    }
    max_pages.ok_or(Error::PageNavigatorMissing)
}

/// Extracts the cameras of a listing page.
/// Every link to a camera view page that wraps an `<img>` is a thumbnail.
/// Relative image sources are resolved against `base`, `yandex` sources (maps, ads) are skipped.
pub fn parse_listing(html: &str, base: &Url) -> Result<Vec<Camera>> {
    let doc = Html::parse_document(html);
    let link_selector = create_selector(r#"a[href*="/view/"]"#)?;
    let img_selector = create_selector("img[src]")?;

    let mut seen = HashSet::new();
    let mut cameras = Vec::with_capacity(CAMERAS_PER_PAGE as usize);
    for link in doc.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(caps) = view_href_re().captures(href) else {
            continue;
        };
        let Some(src) = link
            .select(&img_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
        else {
            continue;
        };
        if src.contains("yandex") {
            tracing::debug!("Not a valid IP camera URL, skipping: {src}");
            continue;
        }

        let id = caps[1].to_string();
        if !seen.insert(id.clone()) {
            continue;
        }
        let image_url = base.join(src.trim())?.to_string();
        cameras.push(Camera { id, image_url });
    }
    Ok(cameras)
}

/// Parses a camera view page.
pub fn parse_details(html: &str, camera_id: &str, base: &Url) -> Result<CameraDetails> {
    let doc = Html::parse_document(html);
    let row_selector = create_selector("div.camera-details__row")?;
    let cell_selector = create_selector("div.camera-details__cell")?;
    let image_selector = create_selector("img#image0")?;
    let tag_selector = create_selector(r#"a[href*="/bytag/"]"#)?;
    let country_link_selector = create_selector(r#"a[href*="/bycountry/"]"#)?;

    let image_url = doc
        .select(&image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or_else(|| Error::ParseMissingSelector("img#image0".into()))?;

    let mut details = CameraDetails {
        id: camera_id.to_string(),
        image_url: base.join(image_url.trim())?.to_string(),
        ..Default::default()
    };

    for row in doc.select(&row_selector) {
        let mut cells = row.select(&cell_selector);
        let (Some(label), Some(value)) = (cells.next(), cells.next()) else {
            continue;
        };
        let label = clean_text(label);
        let value = clean_text(value);
        if value.is_empty() || value == "-" {
            continue;
        }
        match label.trim_end_matches(':').to_lowercase().as_str() {
            "country" => details.country = Some(value),
            "country code" => details.country_code = Some(value.to_uppercase()),
            "region" => details.region = Some(value),
            "city" => details.city = Some(value),
            "latitude" => details.latitude = value.parse().ok(),
            "longitude" => details.longitude = value.parse().ok(),
            "zip" => details.zip = Some(value),
            "timezone" => details.timezone = Some(value),
            "manufacturer" => details.manufacturer = Some(value),
            _ => {}
        }
    }

    if details.country_code.is_none() {
        details.country_code = doc
            .select(&country_link_selector)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| country_href_re().captures(href))
            .map(|caps| caps[1].to_uppercase());
    }

    for tag in doc.select(&tag_selector) {
        let tag = clean_text(tag);
        if !tag.is_empty() && !details.tags.contains(&tag) {
            details.tags.push(tag);
        }
    }

    Ok(details)
}

#[derive(Deserialize)]
struct CountriesResponse {
    countries: BTreeMap<String, CountryEntry>,
}

#[derive(Deserialize)]
struct CountryEntry {
    country: String,
    count: u32,
}

/// Parses the country JSON. The result is sorted by country code.
pub fn parse_countries(json: &str) -> Result<Vec<Country>> {
    let res: CountriesResponse = serde_json::from_str(json)?;
    Ok(res
        .countries
        .into_iter()
        .map(|(code, entry)| Country {
            code: code.to_uppercase(),
            name: entry.country,
            count: entry.count,
        })
        .collect())
}

/// Number of cameras of a country: every page but the last one is full.
pub fn camera_count(max_page: u32, last_page_len: usize) -> u32 {
    match max_page {
        0 => 0,
        n => (n - 1)
            .saturating_mul(CAMERAS_PER_PAGE)
            .saturating_add(u32::try_from(last_page_len).unwrap_or(u32::MAX)),
    }
}

/// Parses a listing page off the async runtime, `Html` is not `Send`.
pub(crate) async fn parse_listing_blocking(html: String, base: Url) -> Result<Vec<Camera>> {
    spawn_blocking(move || parse_listing(&html, &base)).await?
}

pub(crate) async fn parse_details_blocking(
    html: String,
    camera_id: String,
    base: Url,
) -> Result<CameraDetails> {
    spawn_blocking(move || parse_details(&html, &camera_id, &base)).await?
}

pub(crate) async fn max_page_num_blocking(html: String) -> Result<u32> {
    spawn_blocking(move || max_page_num(&html)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://www.insecam.org/en/").unwrap()
    }

    const LISTING: &str = r#"
<html><head>
<script type="text/javascript">var x = 1;</script>
</head><body>
<div class="row thumbnail-items">
  <div class="col-xs-12 col-sm-6 col-md-4 col-lg-4">
    <div class="thumbnail-item">
      <a class="thumbnail-item__wrap" href="/en/view/1009340/" title="Live camera in Oslo">
        <img id="image0" class="thumbnail-item__img img-responsive" src="http://85.19.2.10:80/mjpg/video.mjpg" alt="">
      </a>
    </div>
  </div>
  <div class="thumbnail-item">
    <a class="thumbnail-item__wrap" href="/en/view/875522/"><img id="image1" src="http://77.88.1.5:8080/cgi-bin/snapshot.cgi?chn=0"></a>
  </div>
  <div class="thumbnail-item">
    <a href="/en/view/3/"><img id="image2" src="https://yandex.ru/map-widget/v1/?z=12"></a>
  </div>
  <div class="thumbnail-item">
    <a href="/en/view/875522/"><img id="image3" src="http://77.88.1.5:8080/cgi-bin/snapshot.cgi?chn=0"></a>
  </div>
  <div class="thumbnail-item">
    <a href="/en/view/1234/"><img id="image4" src="/static/no.jpg"></a>
  </div>
  <a href="/en/view/999/">text only</a>
  <a href="/en/bycountry/NO/"><img src="/flags/no.png"></a>
</div>
<script type="text/javascript">
  pagenavigator("?page=", 2, 1);
  pagenavigator("?page=", 19, 1);
</script>
</body></html>"#;

    #[test]
    fn max_page_num_takes_last_navigator() {
        assert_eq!(max_page_num(LISTING).unwrap(), 19);
    }

    #[test]
    fn max_page_num_without_navigator() {
        let err = max_page_num("<html><script>foo();</script></html>").unwrap_err();
        assert!(matches!(err, Error::PageNavigatorMissing));
    }

    #[test]
    fn listing_extracts_camera_thumbnails() {
        let cams = parse_listing(LISTING, &base()).unwrap();
        let ids: Vec<_> = cams.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["1009340", "875522", "1234"]);
        assert_eq!(cams[0].image_url, "http://85.19.2.10/mjpg/video.mjpg");
        assert_eq!(
            cams[1].image_url,
            "http://77.88.1.5:8080/cgi-bin/snapshot.cgi?chn=0"
        );
        assert_eq!(cams[2].image_url, "http://www.insecam.org/static/no.jpg");
    }

    #[test]
    fn empty_listing_has_no_cameras() {
        let cams = parse_listing("<html><body><p>Nothing</p></body></html>", &base()).unwrap();
        assert!(cams.is_empty());
    }

    const DETAILS: &str = r#"
<html><body>
<img id="image0" class="img-responsive" src="http://85.19.2.10:80/mjpg/video.mjpg">
<div class="camera-details">
  <div class="camera-details__row">
    <div class="camera-details__cell">Country:</div>
    <div class="camera-details__cell"><a class="camera-details__link" href="/en/bycountry/NO/">Norway</a></div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">Region:</div>
    <div class="camera-details__cell">  Oslo
       County </div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">City:</div>
    <div class="camera-details__cell"><a href="/en/bycity/Oslo/">Oslo</a></div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">Latitude:</div>
    <div class="camera-details__cell">59.912730</div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">Longitude:</div>
    <div class="camera-details__cell">10.746090</div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">ZIP:</div>
    <div class="camera-details__cell">-</div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">Timezone:</div>
    <div class="camera-details__cell">+01:00</div>
  </div>
  <div class="camera-details__row">
    <div class="camera-details__cell">Manufacturer:</div>
    <div class="camera-details__cell"><a href="/en/bytype/Axis/">Axis</a></div>
  </div>
</div>
<div class="camera-tags">
  <a class="tag-link" href="/en/bytag/Street/">Street</a>
  <a class="tag-link" href="/en/bytag/City/">City</a>
  <a class="tag-link" href="/en/bytag/Street/">Street</a>
</div>
</body></html>"#;

    #[test]
    fn details_rows_are_mapped() {
        let d = parse_details(DETAILS, "1009340", &base()).unwrap();
        assert_eq!(d.id, "1009340");
        assert_eq!(d.image_url, "http://85.19.2.10/mjpg/video.mjpg");
        assert_eq!(d.country.as_deref(), Some("Norway"));
        assert_eq!(d.country_code.as_deref(), Some("NO"));
        assert_eq!(d.region.as_deref(), Some("Oslo County"));
        assert_eq!(d.city.as_deref(), Some("Oslo"));
        assert_eq!(d.latitude, Some(59.91273));
        assert_eq!(d.longitude, Some(10.74609));
        assert_eq!(d.zip, None);
        assert_eq!(d.timezone.as_deref(), Some("+01:00"));
        assert_eq!(d.manufacturer.as_deref(), Some("Axis"));
        assert_eq!(d.tags, ["Street", "City"]);
    }

    #[test]
    fn details_without_image_is_an_error() {
        let err = parse_details("<html><body></body></html>", "1", &base()).unwrap_err();
        assert!(matches!(err, Error::ParseMissingSelector(_)));
    }

    #[test]
    fn countries_are_sorted_by_code() {
        let json = r#"{"status":"success","countries":{
            "US":{"country":"United States","count":1521},
            "JP":{"country":"Japan","count":1207},
            "-":{"country":"-","count":3}}}"#;
        let countries = parse_countries(json).unwrap();
        let codes: Vec<_> = countries.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["-", "JP", "US"]);
        assert_eq!(countries[1].name, "Japan");
        assert_eq!(countries[2].count, 1521);
    }

    #[test]
    fn malformed_countries_json() {
        assert!(matches!(parse_countries("{}"), Err(Error::Json(_))));
    }

    #[test]
    fn camera_count_from_pages() {
        assert_eq!(camera_count(0, 0), 0);
        assert_eq!(camera_count(1, 4), 4);
        assert_eq!(camera_count(19, 2), 110);
        assert_eq!(camera_count(u32::MAX, 6), u32::MAX);
    }

    #[test]
    fn oversized_navigator_keeps_earlier_match() {
        let html = r#"<html>
<script>pagenavigator("?page=", 12, 1);</script>
<script>pagenavigator("?page=", 99999999999, 1);</script>
</html>"#;
        assert_eq!(max_page_num(html).unwrap(), 12);
    }

    #[tokio::test]
    async fn blocking_wrappers_parse() {
        let cams = parse_listing_blocking(LISTING.to_string(), base())
            .await
            .unwrap();
        assert_eq!(cams.len(), 3);
        assert_eq!(max_page_num_blocking(LISTING.to_string()).await.unwrap(), 19);
    }
}
