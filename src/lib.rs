//! Still frame scraper for the insecam.org webcam directory.
//!
//! Listing pages of a country are fetched one after another, the camera
//! thumbnails are pulled out of the HTML and one frame of every camera
//! endpoint is written to `images/`.

mod capture;
pub mod cli;
pub mod config;
mod error;
mod macros;
pub mod model;
mod parse;
pub mod process;
mod request;
pub mod store;
pub mod ui;

pub use error::{Error, Result};

/// A full listing page shows this many cameras.
const CAMERAS_PER_PAGE: u32 = 6;
