use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_minutes_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    fs::write(path, contents)
        .with_context(|| format!("failed to write text file: {}", path.display()))
}

/// One decimal place, rounded from the exact binary value with ties to even,
/// so `0.15` (stored just below) gives `0.1`.
pub fn round1(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

pub fn percent(part: usize, whole: usize) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    Some((part as f64 / whole as f64 * 100.0).round_ties_even() as u32)
}

pub fn elapsed_secs(elapsed: Duration) -> f64 {
    round1(elapsed.as_secs_f64())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", truncate_chars(text, max_chars))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round1_uses_ties_to_even() {
        assert_eq!(round1(2.25), 2.2);
        assert_eq!(round1(2.5), 2.5);
        assert_eq!(round1(4.0), 4.0);
    }

    #[test]
    fn round1_rounds_the_stored_value_once() {
        assert_eq!(round1(0.15), 0.1);
        assert_eq!(round1(7.0 / 20.0), 0.3);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(2.675), 2.7);
        assert_eq!(round1(-1.25), -1.2);
    }

    #[test]
    fn percent_is_undefined_for_empty_denominator() {
        assert_eq!(percent(0, 0), None);
        assert_eq!(percent(2, 2), Some(100));
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(1, 8), Some(12));
    }

    #[test]
    fn format_number_drops_fraction_for_integers() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("réponse", 2), "ré");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(excerpt("abcdef", 3), "abc...");
        assert_eq!(excerpt("abc", 3), "abc");
    }
}
