//! Terminal display logic for the geocode CLI.
//!
//! Handles the run header, the spinner shown while a batch is in flight,
//! and the final summary bar. Uses only the `console` crate. Everything
//! writes to stderr so stdout (and the output file) stay clean.

use console::{style, Term};
use geocode_lib::GeocodeRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message.
    ///
    /// Returns None if stderr isn't a TTY.
    pub fn start(message: String) -> Option<Self> {
        let term = Term::stderr();
        if !term.is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a run.
pub fn print_header(address_count: usize, concurrency: usize, rate_limit: usize) {
    eprintln!(
        "{} {} {}",
        style("geocode").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— Geocoding {} address{}",
            address_count,
            if address_count == 1 { "" } else { "es" }
        ))
        .dim(),
    );
    eprintln!(
        "{}",
        style(format!(
            "Concurrency: {} | Rate limit: {}/s",
            concurrency, rate_limit
        ))
        .dim()
    );
    eprintln!();
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(records: &[GeocodeRecord], output_path: &str, duration: Duration) {
    let resolved = records.iter().filter(|r| r.is_resolved()).count();
    let zero_results = records
        .iter()
        .filter(|r| r.error.is_none() && r.number_of_results == 0)
        .count();
    let failed = records.iter().filter(|r| r.error.is_some()).count();

    eprintln!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    eprintln!(
        "  {} address{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "es" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} resolved", resolved)).green(),
        style("|").dim(),
        style(format!("{} zero results", zero_results)).yellow(),
        style("|").dim(),
        style(format!("{} failed", failed)).red(),
    );
    eprintln!("  Results written to {}", style(output_path).bold());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_partition_the_batch() {
        let records = vec![
            GeocodeRecord {
                input_string: "found".to_string(),
                number_of_results: 1,
                status: Some("OK".to_string()),
                ..GeocodeRecord::default()
            },
            GeocodeRecord {
                input_string: "nothing".to_string(),
                number_of_results: 0,
                status: Some("ZERO_RESULTS".to_string()),
                ..GeocodeRecord::default()
            },
            GeocodeRecord::from_error("broken", "timed out"),
        ];

        let resolved = records.iter().filter(|r| r.is_resolved()).count();
        let zero = records
            .iter()
            .filter(|r| r.error.is_none() && r.number_of_results == 0)
            .count();
        let failed = records.iter().filter(|r| r.error.is_some()).count();

        assert_eq!(resolved + zero + failed, records.len());
        assert_eq!((resolved, zero, failed), (1, 1, 1));
    }
}
