//! Narrowing helpers used by the HTTP endpoint and the CLI.

use crate::normalize::{extract_province, normalize};
use crate::types::{EarthquakeQuery, EarthquakeRecord};
use chrono::{Duration, NaiveDateTime};

/// Whether `record` belongs to the requested province.
///
/// Names are compared after normalization, in either direction, so "Kahramanmaraş"
/// matches a record tagged "Kahramanmaras" and "Maraş" matches both.
pub fn matches_province(record: &EarthquakeRecord, province: &str) -> bool {
    let wanted = normalize(province.trim());
    if wanted.is_empty() {
        return true;
    }

    let have = match record
        .province
        .clone()
        .or_else(|| extract_province(&record.location))
    {
        Some(p) => normalize(&p),
        None => return false,
    };

    // Istanbul events are often tagged with a district instead of the province.
    if wanted == "istanbul"
        && (have.contains("istanbul") || normalize(&record.location).contains("istanbul"))
    {
        return true;
    }

    !have.is_empty() && (have.contains(&wanted) || wanted.contains(&have))
}

pub fn filter_by_province(records: Vec<EarthquakeRecord>, province: &str) -> Vec<EarthquakeRecord> {
    records
        .into_iter()
        .filter(|r| matches_province(r, province))
        .collect()
}

pub fn filter_by_min_magnitude(records: Vec<EarthquakeRecord>, min: f64) -> Vec<EarthquakeRecord> {
    records.into_iter().filter(|r| r.magnitude >= min).collect()
}

/// Records that happened no more than `hours` before `now`.
pub fn recent_within(records: &[EarthquakeRecord], now: NaiveDateTime, hours: i64) -> Vec<&EarthquakeRecord> {
    let window = Duration::hours(hours);
    records
        .iter()
        .filter(|r| now - r.occurred_at() <= window)
        .collect()
}

pub fn high_magnitude_count(records: &[EarthquakeRecord], threshold: f64) -> usize {
    records.iter().filter(|r| r.magnitude >= threshold).count()
}

/// Province, then minimum magnitude, then limit.
pub fn apply_query(records: Vec<EarthquakeRecord>, query: &EarthquakeQuery) -> Vec<EarthquakeRecord> {
    let mut records = match query.province.as_deref() {
        Some(province) => filter_by_province(records, province),
        None => records,
    };
    if let Some(min) = query.min_magnitude {
        records = filter_by_min_magnitude(records, min);
    }
    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    records
}
