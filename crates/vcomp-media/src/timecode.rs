//! Marker scraping for FFmpeg's diagnostic text.
//!
//! The stderr format is an implementation detail of FFmpeg, so every pattern
//! the crate relies on lives here.

use regex::Regex;
use std::sync::LazyLock;

use vcomp_models::parse_timecode;

/// `Duration: HH:MM:SS.ff` as printed in the input summary.
static DURATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+:\d+:\d+\.\d+)").unwrap());

/// `time=HH:MM:SS.ff` as printed in the periodic stats line.
static ELAPSED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=(\d+:\d+:\d+\.\d+)").unwrap());

/// Find the total media duration in a probe's diagnostic output.
///
/// Only the first marker counts.
pub fn find_duration(text: &str) -> Option<f64> {
    first_marker(&DURATION_MARKER, text)
}

/// Find the elapsed position in a single stats line.
pub fn find_elapsed(line: &str) -> Option<f64> {
    first_marker(&ELAPSED_MARKER, line)
}

fn first_marker(pattern: &Regex, text: &str) -> Option<f64> {
    let caps = pattern.captures(text)?;
    parse_timecode(&caps[1]).ok()
}
