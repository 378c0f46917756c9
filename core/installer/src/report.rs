//! Progress reporting for the install pipeline.
//!
//! The pipeline reports through a [`Reporter`] so the library never decides how
//! progress is shown. [`ConsoleReporter`] prints progress lines to stdout;
//! [`NullReporter`] discards everything.

use std::io::Write;

/// Receives progress from the install pipeline.
pub trait Reporter: Send + Sync {
    /// A pipeline stage has started.
    fn stage(&self, message: &str);

    /// Bytes received so far for the artifact download. `total` is zero when the
    /// server did not announce a length.
    fn download_progress(&self, downloaded: u64, total: u64, elapsed_secs: f64);

    /// The artifact download has finished.
    fn download_finished(&self, downloaded: u64, total: u64, elapsed_secs: f64);

    /// A non-fatal problem.
    fn warning(&self, message: &str);
}

/// Prints progress to stdout and warnings to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn stage(&self, message: &str) {
        println!("{message}");
    }

    fn download_progress(&self, downloaded: u64, total: u64, elapsed_secs: f64) {
        print!("\r{}     ", progress_line(downloaded, total, elapsed_secs));
        let _ = std::io::stdout().flush();
    }

    fn download_finished(&self, downloaded: u64, total: u64, elapsed_secs: f64) {
        println!("\r{}     ", progress_line(downloaded, total, elapsed_secs));
    }

    fn warning(&self, message: &str) {
        eprintln!("Warning: {message}");
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn stage(&self, _message: &str) {}
    fn download_progress(&self, _downloaded: u64, _total: u64, _elapsed_secs: f64) {}
    fn download_finished(&self, _downloaded: u64, _total: u64, _elapsed_secs: f64) {}
    fn warning(&self, _message: &str) {}
}

/// Formats `downloaded/total (percent%) speed`.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[must_use]
pub fn progress_line(downloaded: u64, total: u64, elapsed_secs: f64) -> String {
    let speed = if elapsed_secs > 0.0 {
        downloaded as f64 / elapsed_secs
    } else {
        0.0
    };
    if total == 0 {
        return format!("{} {}", format_bytes(downloaded), format_speed(speed));
    }
    let percent = (downloaded as f64 / total as f64 * 100.0).min(100.0) as u8;
    format!(
        "{}/{} ({percent}%) {}",
        format_bytes(downloaded),
        format_bytes(total),
        format_speed(speed)
    )
}

/// Formats bytes into a human-readable string (KB, MB, GB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}
