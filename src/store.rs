use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Where images of a run end up under the images directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// `images/<COUNTRY_NAME>/`
    Country,
    /// `images/<CAMERA_ID>/`
    Camera,
    /// `images/<NAME>/`
    Folder(String),
}

/// Folder used when sorting by country and the country is unknown.
pub const UNKNOWN_COUNTRY: &str = "custom";

impl Layout {
    pub fn dir(&self, root: &Path, camera_id: &str, country_name: Option<&str>) -> PathBuf {
        match self {
            Layout::Country => root.join(sanitize(country_name.unwrap_or(UNKNOWN_COUNTRY))),
            Layout::Camera => root.join(sanitize(camera_id)),
            Layout::Folder(name) => root.join(sanitize(name)),
        }
    }
}

/// Keeps a name usable as a single path component.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => UNKNOWN_COUNTRY.to_string(),
        _ => cleaned,
    }
}

pub fn file_name(identifier: &str, timestamp: Option<DateTime<Local>>) -> String {
    let identifier = sanitize(identifier);
    match timestamp {
        Some(ts) => format!("{identifier}_{}.jpg", ts.format("%Y-%m-%d_%H-%M-%S")),
        None => format!("{identifier}.jpg"),
    }
}

/// Whether `dir` already holds an image of `identifier`, timestamped or not.
pub async fn already_captured(dir: &Path, identifier: &str) -> bool {
    let identifier = sanitize(identifier);
    let plain = format!("{identifier}.jpg");
    let stamped = format!("{identifier}_");

    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == plain || (name.starts_with(&stamped) && name.ends_with(".jpg")) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn layout_dirs() {
        let root = Path::new("images");
        assert_eq!(
            Layout::Country.dir(root, "42", Some("United States")),
            root.join("United States")
        );
        assert_eq!(Layout::Country.dir(root, "42", None), root.join("custom"));
        assert_eq!(Layout::Camera.dir(root, "42", Some("Japan")), root.join("42"));
        assert_eq!(
            Layout::Folder("night/run".into()).dir(root, "42", Some("Japan")),
            root.join("night_run")
        );
    }

    #[test]
    fn sanitize_never_escapes_the_root() {
        assert_eq!(sanitize(".."), "custom");
        assert_eq!(sanitize("  "), "custom");
        assert_eq!(sanitize("Korea, Republic Of"), "Korea, Republic Of");
        assert_eq!(sanitize("a\\b:c"), "a_b_c");
    }

    #[test]
    fn file_names() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(file_name("1009340", None), "1009340.jpg");
        assert_eq!(file_name("1009340", Some(ts)), "1009340_2024-03-09_07-05-01.jpg");
    }

    #[tokio::test]
    async fn detects_previous_captures() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!already_captured(dir.path(), "77").await);

        std::fs::write(dir.path().join("777.jpg"), b"x").unwrap();
        assert!(!already_captured(dir.path(), "77").await);

        std::fs::write(dir.path().join("77_2024-03-09_07-05-01.jpg"), b"x").unwrap();
        assert!(already_captured(dir.path(), "77").await);

        std::fs::write(dir.path().join("88.jpg"), b"x").unwrap();
        assert!(already_captured(dir.path(), "88").await);
        assert!(!already_captured(&dir.path().join("missing"), "88").await);
    }
}
