use std::fmt;

/// A thumbnail of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    pub id: String,
    pub image_url: String,
}

/// Everything the camera view page tells about one camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraDetails {
    pub id: String,
    pub image_url: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zip: Option<String>,
    pub timezone: Option<String>,
    pub manufacturer: Option<String>,
    pub tags: Vec<String>,
}

impl fmt::Display for CameraDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn line(f: &mut fmt::Formatter<'_>, label: &str, v: Option<&str>) -> fmt::Result {
            writeln!(f, "{:<14}: {}", label, v.unwrap_or("-"))
        }
        let lat = self.latitude.map(|v| v.to_string());
        let lon = self.longitude.map(|v| v.to_string());

        line(f, "Camera ID", Some(&self.id))?;
        line(f, "Country", self.country.as_deref())?;
        line(f, "Country code", self.country_code.as_deref())?;
        line(f, "Region", self.region.as_deref())?;
        line(f, "City", self.city.as_deref())?;
        line(f, "Latitude", lat.as_deref())?;
        line(f, "Longitude", lon.as_deref())?;
        line(f, "ZIP", self.zip.as_deref())?;
        line(f, "Timezone", self.timezone.as_deref())?;
        line(f, "Manufacturer", self.manufacturer.as_deref())?;
        let tags = self.tags.join(", ");
        line(f, "Tags", (!tags.is_empty()).then_some(tags.as_str()))?;
        write!(f, "{:<14}: {}", "Image URL", self.image_url)
    }
}

/// An entry of the country JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub count: u32,
}

/// Outcome of a scrape run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub captured: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.captured += other.captured;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} captured, {} skipped, {} failed",
            self.captured, self.skipped, self.failed
        )
    }
}
