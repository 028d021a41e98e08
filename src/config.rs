//! Runtime settings.
//!
//! Read from an optional `insecrawl.toml` in the working directory, then from
//! `INSECRAWL_*` environment variables. Every key has a default so both sources
//! may be absent.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Site root, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Language segment of every site path (`/en/...`).
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per request timeout. Camera endpoints hang often, keep it short.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of cameras captured at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Upper bound on bytes read from a stream while looking for one frame.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            images_dir: default_images_dir(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

fn default_base_url() -> String {
    "http://www.insecam.org".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.3"
        .to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_concurrency() -> usize {
    6
}
fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}
fn default_max_frame_bytes() -> usize {
    8 * 1024 * 1024
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("insecrawl").required(false))
            .add_source(Environment::with_prefix("INSECRAWL"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// `{base_url}/{language}` with any trailing slash of `base_url` removed.
    pub fn site_root(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.language)
    }
}
