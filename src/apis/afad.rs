use crate::apis::{build_client, fetch_text, parse_number};
use crate::config::PipelineConfig;
use crate::constants::{AFAD_ID_PREFIX, AFAD_MAX_MAGNITUDE, AFAD_QUERY_LIMIT, AFAD_SOURCE};
use crate::error::{QuakeError, Result};
use crate::metrics::ParserMetrics;
use crate::normalize::extract_province;
use crate::types::{EarthquakeRecord, RecordSource, SourceAdapter};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Primary source: the AFAD event-filter JSON API.
pub struct AfadAdapter {
    client: reqwest::Client,
    config: PipelineConfig,
    offset: FixedOffset,
}

impl AfadAdapter {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let client = build_client(config.timeout())?;
        let offset = config.local_offset()?;
        Ok(Self {
            client,
            config,
            offset,
        })
    }

    /// Query string for the trailing window ending at `now`.
    pub fn query_params(&self, now: DateTime<FixedOffset>) -> Vec<(&'static str, String)> {
        let start = now - Duration::days(self.config.trailing_window_days);
        let bbox = &self.config.bounding_box;
        vec![
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", now.format("%Y-%m-%d").to_string()),
            ("minlat", bbox.min_lat.to_string()),
            ("maxlat", bbox.max_lat.to_string()),
            ("minlon", bbox.min_lon.to_string()),
            ("maxlon", bbox.max_lon.to_string()),
            ("minmag", self.config.min_magnitude.to_string()),
            ("maxmag", AFAD_MAX_MAGNITUDE.to_string()),
            ("orderby", "timedesc".to_string()),
            ("limit", AFAD_QUERY_LIMIT.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl SourceAdapter for AfadAdapter {
    fn source_name(&self) -> &'static str {
        AFAD_SOURCE
    }

    fn origin(&self) -> RecordSource {
        RecordSource::Primary
    }

    #[instrument(skip(self), fields(source = AFAD_SOURCE))]
    async fn fetch(&self) -> Result<Vec<EarthquakeRecord>> {
        let now = Utc::now().with_timezone(&self.offset);
        let request = self
            .client
            .get(&self.config.primary_url)
            .query(&self.query_params(now));

        let body = fetch_text(AFAD_SOURCE, request).await?;
        let records = parse_events(&body, self.offset, self.config.magnitude_ceiling)?;

        info!("Fetched {} events from AFAD", records.len());
        Ok(records)
    }
}

/// Map an AFAD response body into canonical records.
///
/// A body that is not a JSON array means the source is unusable; single items
/// that cannot be dated are dropped.
pub fn parse_events(body: &str, offset: FixedOffset, ceiling: f64) -> Result<Vec<EarthquakeRecord>> {
    let started = Instant::now();

    let payload: Value = serde_json::from_str(body)
        .map_err(|e| QuakeError::unavailable(AFAD_SOURCE, format!("invalid JSON: {}", e)))?;
    let items = payload.as_array().ok_or_else(|| {
        QuakeError::unavailable(AFAD_SOURCE, "response body is not a JSON array")
    })?;

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match map_item(item, index, offset, ceiling) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!(index, error = %e, "discarding AFAD item");
                ParserMetrics::record_discarded(AFAD_SOURCE, e.kind());
            }
        }
    }

    ParserMetrics::record_parse_success(
        AFAD_SOURCE,
        records.len(),
        started.elapsed().as_secs_f64(),
    );
    Ok(records)
}

fn map_item(item: &Value, index: usize, offset: FixedOffset, ceiling: f64) -> Result<EarthquakeRecord> {
    let raw_date = item
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| QuakeError::malformed("missing date"))?;
    let occurred = parse_event_time(raw_date, offset)
        .ok_or_else(|| QuakeError::malformed(format!("unparseable date '{}'", raw_date)))?;

    let raw_location = item
        .get("location")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();
    let location = match raw_location.split('(').next().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => raw_location.to_string(),
    };

    // Parenthesized suffix first, then AFAD's own province field, then heuristics.
    let province = raw_location
        .contains('(')
        .then(|| extract_province(raw_location))
        .flatten()
        .or_else(|| {
            item.get("province")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
        })
        .or_else(|| extract_province(&location));

    let mut magnitude = number_field(item, "magnitude");
    if magnitude > ceiling {
        warn!(
            index,
            magnitude, ceiling, "clamping implausible AFAD magnitude to ceiling"
        );
        ParserMetrics::record_clamped(AFAD_SOURCE);
        magnitude = ceiling;
    }

    let event_id = match item.get("eventID") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => index.to_string(),
    };

    Ok(EarthquakeRecord {
        id: format!("{}{}", AFAD_ID_PREFIX, event_id),
        occurred_date: occurred.date(),
        occurred_time: occurred.time().with_nanosecond(0).unwrap_or(occurred.time()),
        latitude: number_field(item, "latitude"),
        longitude: number_field(item, "longitude"),
        depth_km: number_field(item, "depth").max(0.0),
        magnitude,
        location,
        province,
        source: None,
    })
}

/// AFAD sends either an RFC 3339 timestamp or a naive ISO timestamp that is
/// already in Turkish local time.
fn parse_event_time(raw: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&offset).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Numbers arrive either as JSON numbers or numeric strings.
fn number_field(item: &Value, key: &str) -> f64 {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_number(s),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn turkey() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn test_maps_afad_item() {
        let body = r#"[{
            "eventID": "612345",
            "date": "2023-11-05T16:30:12",
            "latitude": "40.9861",
            "longitude": "28.7929",
            "depth": "8.3",
            "magnitude": "3.2",
            "location": "Silivri Açıkları (İstanbul)",
            "province": "İstanbul"
        }]"#;

        let records = parse_events(body, turkey(), 7.5).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "afad-612345");
        assert_eq!(r.occurred_date, NaiveDate::from_ymd_opt(2023, 11, 5).unwrap());
        assert_eq!(r.occurred_time, NaiveTime::from_hms_opt(16, 30, 12).unwrap());
        assert_eq!(r.latitude, 40.9861);
        assert_eq!(r.depth_km, 8.3);
        assert_eq!(r.magnitude, 3.2);
        assert_eq!(r.location, "Silivri Açıkları");
        assert_eq!(r.province.as_deref(), Some("İstanbul"));
        assert_eq!(r.source, None);
    }

    #[test]
    fn test_rfc3339_converted_to_local_time() {
        let body = r#"[{"eventID": 7, "date": "2023-11-05T22:15:00Z", "magnitude": 2.4,
                        "latitude": 38.4, "longitude": 27.1, "depth": 6, "location": "Konak"}]"#;
        let records = parse_events(body, turkey(), 7.5).unwrap();
        assert_eq!(records[0].id, "afad-7");
        assert_eq!(records[0].occurred_date, NaiveDate::from_ymd_opt(2023, 11, 6).unwrap());
        assert_eq!(records[0].occurred_time, NaiveTime::from_hms_opt(1, 15, 0).unwrap());
    }

    #[test]
    fn test_magnitude_clamped_not_discarded() {
        let body = r#"[{"eventID": "1", "date": "2023-11-05T10:00:00", "magnitude": "8.4",
                        "latitude": "38", "longitude": "37", "depth": "10", "location": "Pazarcik (Kahramanmaras)"}]"#;
        let records = parse_events(body, turkey(), 7.5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].magnitude, 7.5);
        assert_eq!(records[0].province.as_deref(), Some("Kahramanmaras"));
    }

    #[test]
    fn test_invalid_numbers_default_to_zero() {
        let body = r#"[{"date": "2023-11-05T10:00:00", "magnitude": "x", "latitude": null,
                        "depth": "-4", "location": "Sindirgi"}]"#;
        let records = parse_events(body, turkey(), 7.5).unwrap();
        assert_eq!(records[0].id, "afad-0");
        assert_eq!(records[0].magnitude, 0.0);
        assert_eq!(records[0].latitude, 0.0);
        assert_eq!(records[0].longitude, 0.0);
        assert_eq!(records[0].depth_km, 0.0);
    }

    #[test]
    fn test_undatable_item_is_dropped() {
        let body = r#"[{"eventID": "1", "date": "yesterday", "magnitude": "3.0"},
                       {"eventID": "2", "date": "2023-11-05 10:00:00", "magnitude": "3.1", "location": "Bursa"}]"#;
        let records = parse_events(body, turkey(), 7.5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "afad-2");
        assert_eq!(records[0].province.as_deref(), Some("Bursa"));
    }

    #[test]
    fn test_non_array_body_is_source_unavailable() {
        let err = parse_events(r#"{"error": "maintenance"}"#, turkey(), 7.5).unwrap_err();
        assert!(matches!(err, QuakeError::SourceUnavailable { source_name: "afad", .. }));

        let err = parse_events("<html>oops</html>", turkey(), 7.5).unwrap_err();
        assert!(matches!(err, QuakeError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_query_covers_window_and_box() {
        let mut config = PipelineConfig::default();
        config.trailing_window_days = 7;
        let adapter = AfadAdapter::new(config).unwrap();
        let now = turkey().with_ymd_and_hms(2023, 11, 5, 12, 0, 0).unwrap();
        let params = adapter.query_params(now);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("start"), "2023-10-29");
        assert_eq!(get("end"), "2023-11-05");
        assert_eq!(get("minlat"), "35");
        assert_eq!(get("maxlon"), "45");
        assert_eq!(get("minmag"), "1");
    }
}
