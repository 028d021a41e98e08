//! Progress bar and the log writer that keeps it intact.

use std::io;
use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::fmt::MakeWriter;

static MULTI: OnceLock<MultiProgress> = OnceLock::new();

pub fn get_multi() -> &'static MultiProgress {
    MULTI.get_or_init(MultiProgress::new)
}

/// Log writer printing above the progress bars instead of through them.
pub struct IndicatifWriter;

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        get_multi().println(s.trim_end())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&self) -> Self::Writer {
        IndicatifWriter
    }
}

/// Finishes `bar` and removes it from the shared `MultiProgress`.
pub fn finish_bar(bar: &ProgressBar) {
    bar.finish_and_clear();
    get_multi().remove(bar);
}

/// Bar over the cameras of one country.
pub fn camera_bar(total: u64, country: &str) -> ProgressBar {
    let bar = get_multi().add(ProgressBar::new(total));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    bar.set_message(country.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
