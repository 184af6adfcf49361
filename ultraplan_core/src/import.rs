//! Import of training-log exports (tab or semicolon separated).
//!
//! Exports from different tools order their columns differently, so columns
//! are recognised by content rather than position.

use crate::{HistoryEntry, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static DATE_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{4}$").expect("date pattern is valid"));

static DURATION_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+:)?\d{1,2}:\d{2}$").expect("duration pattern is valid"));

static DISTANCE_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+([.,]\d+)?(\s*km)?$").expect("distance pattern is valid"));

static PLAIN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+([.,]\d+)?$").expect("number pattern is valid"));

const DEFAULT_SPORT: &str = "Imported";

/// Parse export text into history entries, skipping rows that aren't activities
pub fn parse_training_csv(text: &str) -> Vec<HistoryEntry> {
    let entries: Vec<HistoryEntry> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let entry = parse_line(line);
            if entry.is_none() {
                tracing::debug!("Skipping row: {}", line);
            }
            entry
        })
        .collect();

    tracing::info!("Parsed {} activities from CSV", entries.len());
    entries
}

/// Read and parse an export file
pub fn import_csv_file(path: &Path) -> Result<Vec<HistoryEntry>> {
    let text = std::fs::read_to_string(path)?;
    tracing::info!("Importing activities from {:?}", path);
    Ok(parse_training_csv(&text))
}

fn split_columns(line: &str) -> Option<Vec<String>> {
    let delimiter = if line.contains('\t') { b'\t' } else { b';' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let record = reader.records().next()?.ok()?;
    Some(record.iter().map(str::to_string).collect())
}

fn parse_line(line: &str) -> Option<HistoryEntry> {
    let cols = split_columns(line)?;
    if cols.len() < 3 {
        return None;
    }

    let date_idx = cols.iter().position(|c| DATE_COLUMN.is_match(c))?;
    let date = parse_dotted_date(&cols[date_idx])?;

    let duration_idx = cols.iter().position(|c| DURATION_COLUMN.is_match(c));
    let duration_min = match duration_idx {
        Some(i) => parse_clock_minutes(&cols[i])?,
        None => 0,
    };

    let is_taken = |i: usize| i == date_idx || Some(i) == duration_idx;

    let distance_idx = cols
        .iter()
        .enumerate()
        .position(|(i, c)| !is_taken(i) && DISTANCE_COLUMN.is_match(c));
    let distance_km = distance_idx
        .and_then(|i| parse_distance(&cols[i]))
        .unwrap_or(0.0);

    let sport = cols
        .iter()
        .enumerate()
        .find(|(i, c)| {
            !is_taken(*i)
                && Some(*i) != distance_idx
                && c.chars().any(|ch| ch.is_ascii_alphabetic())
                && !PLAIN_NUMBER.is_match(c)
        })
        .map(|(_, c)| c.clone())
        .unwrap_or_else(|| DEFAULT_SPORT.to_string());

    if duration_min == 0 && distance_km <= 0.0 {
        return None;
    }

    Some(HistoryEntry {
        date,
        original_string: Some(format!("CSV: {}", sport)),
        sport,
        duration_min,
        distance_km: Some(distance_km),
    })
}

/// `D.M.YYYY` to a calendar date
fn parse_dotted_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('.').map(|p| p.parse::<u32>().ok());
    let (day, month, year) = (parts.next()??, parts.next()??, parts.next()??);
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// `H:MM:SS` and `H:MM` both read as hours and minutes; `None` when out of range
fn parse_clock_minutes(text: &str) -> Option<u32> {
    let parts: Vec<u32> = text
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [hours, minutes, _] | [hours, minutes] => hours.checked_mul(60)?.checked_add(*minutes),
        _ => Some(0),
    }
}

fn parse_distance(text: &str) -> Option<f64> {
    text.replace("km", "").replace(',', ".").trim().parse().ok()
}
