//! Progress display for long scans.

use indicatif::{ProgressBar, ProgressStyle};

/// Bar over `total` files; hidden when `quiet` or when there is nothing to do.
pub fn scan_progress(total: usize, quiet: bool) -> ProgressBar {
    if quiet || total == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    match ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        Ok(style) => pb.set_style(style.progress_chars("=> ")),
        Err(e) => tracing::debug!("Falling back to default progress style: {}", e),
    }
    pb
}
