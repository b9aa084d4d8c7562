//! Rate-limited download progress reporting.
//!
//! The reporter is clock-agnostic: callers pass the current [`Instant`] with
//! each chunk, which keeps the one-line-per-second rule testable without
//! sleeping. [`ProgressReader`] is the production driver and logs each
//! emitted line at `info` level.

use log::info;
use std::fmt;
use std::io::{self, Read};
use std::time::{Duration, Instant};

/// Minimum time between two progress lines.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// A single emitted progress line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    /// What is being downloaded.
    pub label: String,
    /// Bytes received so far.
    pub bytes_read: u64,
    /// Advertised total size, 0 when unknown.
    pub total: u64,
}

impl ProgressLine {
    /// Percent complete, or `None` when the total size is unknown.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "download sizes are far below 2^52 bytes"
    )]
    pub fn percent(&self) -> Option<f64> {
        (self.total > 0).then(|| self.bytes_read as f64 / self.total as f64 * 100.0)
    }
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(percent) => write!(
                f,
                "Downloading {}: {percent:.1}% ({} of {} bytes)",
                self.label, self.bytes_read, self.total
            ),
            None => write!(f, "Downloading {}: {} bytes", self.label, self.bytes_read),
        }
    }
}

/// Accumulates bytes read and decides when a line may be emitted.
#[derive(Debug)]
pub struct ProgressReporter {
    label: String,
    total: u64,
    bytes_read: u64,
    last_report: Instant,
    last_reported_bytes: u64,
}

impl ProgressReporter {
    /// Start a session for `label`, with `total` from the transport (0 if unknown).
    pub fn new(label: impl Into<String>, total: u64, started: Instant) -> Self {
        Self {
            label: label.into(),
            total,
            bytes_read: 0,
            last_report: started,
            last_reported_bytes: 0,
        }
    }

    /// Bytes recorded so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Record a delivered chunk; returns a line if the window has elapsed.
    pub fn record(&mut self, chunk_len: usize, now: Instant) -> Option<ProgressLine> {
        self.bytes_read += chunk_len as u64;
        if now.saturating_duration_since(self.last_report) <= REPORT_INTERVAL {
            return None;
        }
        self.last_report = now;
        Some(self.emit())
    }

    /// Emit the closing line if anything arrived since the last one.
    pub fn finish(&mut self) -> Option<ProgressLine> {
        (self.bytes_read > self.last_reported_bytes).then(|| self.emit())
    }

    fn emit(&mut self) -> ProgressLine {
        self.last_reported_bytes = self.bytes_read;
        ProgressLine {
            label: self.label.clone(),
            bytes_read: self.bytes_read,
            total: self.total,
        }
    }
}

/// A [`Read`] adapter that feeds a [`ProgressReporter`].
pub struct ProgressReader<R> {
    inner: R,
    reporter: ProgressReporter,
    finished: bool,
}

impl<R> ProgressReader<R> {
    /// Wrap `inner`, starting the reporting window now.
    pub fn new(inner: R, label: impl Into<String>, total: u64) -> Self {
        Self {
            inner,
            reporter: ProgressReporter::new(label, total, Instant::now()),
            finished: false,
        }
    }

    /// Bytes that have passed through so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.reporter.bytes_read()
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read > 0 {
            if let Some(line) = self.reporter.record(read, Instant::now()) {
                info!("{line}");
            }
        } else if !buf.is_empty() && !self.finished {
            self.finished = true;
            if let Some(line) = self.reporter.finish() {
                info!("{line}");
            }
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 1024;

    /// Feed `count` chunks spaced `spacing` apart and collect emitted lines.
    fn simulate(count: u32, spacing: Duration, total: u64) -> Vec<ProgressLine> {
        let start = Instant::now();
        let mut reporter = ProgressReporter::new("openssl-3.0.15.tar.gz", total, start);
        let mut lines: Vec<ProgressLine> = (1..=count)
            .filter_map(|i| reporter.record(CHUNK, start + spacing * i))
            .collect();
        lines.extend(reporter.finish());
        lines
    }

    #[test]
    fn fast_chunks_for_five_seconds_emit_at_most_five_lines() {
        let spacing = Duration::from_millis(9);
        let count = 555; // 4.995 s of delivery
        let total = u64::from(count) * CHUNK as u64;

        let lines = simulate(count, spacing, total);

        assert!(lines.len() <= 5, "emitted {} lines", lines.len());
        let last = lines.last().expect("at least the closing line");
        let percent = last.percent().expect("total known");
        assert!((percent - 100.0).abs() < 0.05, "final percent {percent}");
    }

    #[test]
    fn nothing_is_emitted_within_the_first_window() {
        let start = Instant::now();
        let mut reporter = ProgressReporter::new("x", 10 * CHUNK as u64, start);
        for i in 1..=10 {
            let line = reporter.record(CHUNK, start + Duration::from_millis(100 * i));
            assert!(line.is_none(), "chunk {i} emitted early");
        }
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let start = Instant::now();
        let mut reporter = ProgressReporter::new("x", 0, start);
        assert!(reporter.record(1, start + REPORT_INTERVAL).is_none());
        assert!(
            reporter
                .record(1, start + REPORT_INTERVAL + Duration::from_millis(1))
                .is_some()
        );
    }

    #[test]
    fn finish_is_silent_when_last_line_is_current() {
        let start = Instant::now();
        let mut reporter = ProgressReporter::new("x", 4, start);
        let line = reporter.record(4, start + Duration::from_secs(2));
        assert!(line.is_some());
        assert!(reporter.finish().is_none());
    }

    #[test]
    fn unknown_total_reports_bytes_only() {
        let line = ProgressLine {
            label: "openssl.tar.gz".to_owned(),
            bytes_read: 2048,
            total: 0,
        };
        assert_eq!(line.percent(), None);
        assert_eq!(line.to_string(), "Downloading openssl.tar.gz: 2048 bytes");
    }

    #[test]
    fn reader_forwards_bytes_and_counts_them() {
        let payload = vec![7u8; 10_000];
        let mut reader = ProgressReader::new(payload.as_slice(), "payload", 10_000);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("read");
        assert_eq!(out, payload);
        assert_eq!(reader.bytes_read(), 10_000);
    }
}
