use crate::apis::{fallback_records, AfadAdapter, KandilliAdapter};
use crate::config::PipelineConfig;
use crate::constants::FALLBACK_SOURCE;
use crate::error::{QuakeError, Result};
use crate::filter::apply_query;
use crate::metrics::PipelineMetrics;
use crate::types::{EarthquakeQuery, EarthquakeRecord, EarthquakeResponse, SourceAdapter};
use chrono::{FixedOffset, NaiveDate, Timelike, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Rounded latitude, rounded longitude, date, hour, minute.
type DedupKey = (i64, i64, NaiveDate, u32, u32);

/// Ordered list of sources plus the configuration they were built from.
///
/// The pipeline holds no mutable state, so one instance can serve any number
/// of concurrent callers.
pub struct Pipeline {
    adapters: Vec<Box<dyn SourceAdapter>>,
    config: PipelineConfig,
    offset: FixedOffset,
}

impl Pipeline {
    /// Primary (AFAD) first, then secondary (Kandilli).
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(AfadAdapter::new(config.clone())?),
            Box::new(KandilliAdapter::new(config.clone())?),
        ];
        Self::with_adapters(config, adapters)
    }

    pub fn with_adapters(config: PipelineConfig, adapters: Vec<Box<dyn SourceAdapter>>) -> Result<Self> {
        config.validate()?;
        let offset = config.local_offset()?;
        Ok(Self {
            adapters,
            config,
            offset,
        })
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.source_name()).collect()
    }

    /// Fetch, validate, deduplicate and sort the latest events.
    ///
    /// Never fails: when every live source is down the static sample set is
    /// returned with `status = false`.
    #[instrument(skip(self))]
    pub async fn get_latest_earthquakes(&self) -> EarthquakeResponse {
        let started = Instant::now();

        let (records, served_by, message) = match self.fetch_live().await {
            Ok((records, source)) => {
                let message = format!("Fetched {} earthquakes from {}", records.len(), source);
                (records, Some(source), message)
            }
            Err(e) => {
                warn!(error = %e, "falling back to sample data");
                PipelineMetrics::record_fallback();
                let today = Utc::now().with_timezone(&self.offset).date_naive();
                let message = format!("{}; showing sample data", e);
                (fallback_records(today), None, message)
            }
        };

        let fetched = records.len();
        let mut records = deduplicate(records);
        let duplicates = fetched - records.len();
        sort_by_recency(&mut records);
        records.truncate(self.config.result_limit);
        for record in &mut records {
            record.source = None;
        }

        PipelineMetrics::record_run(
            served_by.unwrap_or(FALLBACK_SOURCE),
            records.len(),
            duplicates,
            started.elapsed().as_secs_f64(),
        );
        info!(
            source = served_by.unwrap_or(FALLBACK_SOURCE),
            records = records.len(),
            duplicates,
            "pipeline run complete"
        );

        EarthquakeResponse {
            status: served_by.is_some(),
            message,
            count: records.len(),
            result: records,
        }
    }

    /// Same as [`Pipeline::get_latest_earthquakes`], narrowed by `query`.
    pub async fn get_latest_with(&self, query: &EarthquakeQuery) -> EarthquakeResponse {
        let response = self.get_latest_earthquakes().await;
        let result = apply_query(response.result, query);
        EarthquakeResponse {
            count: result.len(),
            result,
            ..response
        }
    }

    /// First source that yields at least one usable record.
    async fn fetch_live(&self) -> Result<(Vec<EarthquakeRecord>, &'static str)> {
        for adapter in &self.adapters {
            let name = adapter.source_name();
            match adapter.fetch().await {
                Ok(records) => {
                    let mut records = validate_magnitudes(records, self.config.magnitude_ceiling);
                    if records.is_empty() {
                        warn!(source = name, "source returned no usable records");
                        continue;
                    }
                    let origin = adapter.origin();
                    for record in &mut records {
                        record.source = Some(origin);
                    }
                    return Ok((records, name));
                }
                Err(e) => {
                    warn!(source = name, error = %e, "source failed, trying next");
                }
            }
        }
        Err(QuakeError::AllSourcesExhausted)
    }
}

/// Keep records with `0 < magnitude <= ceiling`.
pub fn validate_magnitudes(records: Vec<EarthquakeRecord>, ceiling: f64) -> Vec<EarthquakeRecord> {
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| r.magnitude > 0.0 && r.magnitude <= ceiling)
        .collect();
    if kept.len() < before {
        debug!(dropped = before - kept.len(), "dropped records outside magnitude bounds");
    }
    kept
}

/// Collapse records describing the same event.
///
/// Two records match when latitude and longitude agree to two decimals and
/// they fall in the same minute. The strongest reading of each group wins;
/// groups keep the position of their first member.
pub fn deduplicate(records: Vec<EarthquakeRecord>) -> Vec<EarthquakeRecord> {
    let mut kept: Vec<EarthquakeRecord> = Vec::with_capacity(records.len());
    let mut index: HashMap<DedupKey, usize> = HashMap::new();

    for record in records {
        match index.entry(dedup_key(&record)) {
            Entry::Occupied(slot) => {
                let existing = &mut kept[*slot.get()];
                if record.magnitude > existing.magnitude {
                    *existing = record;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(record);
            }
        }
    }
    kept
}

fn dedup_key(record: &EarthquakeRecord) -> DedupKey {
    (
        (record.latitude * 100.0).round() as i64,
        (record.longitude * 100.0).round() as i64,
        record.occurred_date,
        record.occurred_time.hour(),
        record.occurred_time.minute(),
    )
}

/// Most recent first. Stable, so equal timestamps keep their order.
pub fn sort_by_recency(records: &mut [EarthquakeRecord]) {
    records.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordSource;
    use chrono::NaiveTime;

    struct FixedSource {
        name: &'static str,
        origin: RecordSource,
        records: Option<Vec<EarthquakeRecord>>,
    }

    #[async_trait::async_trait]
    impl SourceAdapter for FixedSource {
        fn source_name(&self) -> &'static str {
            self.name
        }

        fn origin(&self) -> RecordSource {
            self.origin
        }

        async fn fetch(&self) -> Result<Vec<EarthquakeRecord>> {
            self.records
                .clone()
                .ok_or_else(|| QuakeError::unavailable(self.name, "down"))
        }
    }

    fn record(id: &str, date: (i32, u32, u32), time: (u32, u32, u32), lat: f64, lon: f64, mag: f64) -> EarthquakeRecord {
        EarthquakeRecord {
            id: id.to_string(),
            occurred_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            occurred_time: NaiveTime::from_hms_opt(time.0, time.1, time.2).unwrap(),
            latitude: lat,
            longitude: lon,
            depth_km: 7.0,
            magnitude: mag,
            location: "Sındırgı (Balıkesir)".to_string(),
            province: Some("Balıkesir".to_string()),
            source: None,
        }
    }

    #[test]
    fn test_duplicates_keep_strongest_reading() {
        let records = vec![
            record("a", (2023, 11, 5), (10, 15, 2), 39.2041, 28.1712, 2.9),
            record("b", (2023, 11, 5), (10, 15, 48), 39.2039, 28.1708, 3.4),
            record("c", (2023, 11, 5), (10, 16, 0), 39.2041, 28.1712, 2.2),
        ];
        let deduped = deduplicate(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "b");
        assert_eq!(deduped[0].magnitude, 3.4);
        assert_eq!(deduped[1].id, "c");
    }

    #[test]
    fn test_equal_magnitude_keeps_first_seen() {
        let records = vec![
            record("first", (2023, 11, 5), (10, 15, 2), 39.20, 28.17, 3.0),
            record("second", (2023, 11, 5), (10, 15, 30), 39.20, 28.17, 3.0),
        ];
        let deduped = deduplicate(records);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, "first");
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let records = vec![
            record("a", (2023, 11, 5), (10, 15, 2), 39.20, 28.17, 2.9),
            record("b", (2023, 11, 5), (10, 15, 9), 39.20, 28.17, 3.4),
            record("c", (2023, 11, 4), (10, 15, 9), 39.20, 28.17, 3.1),
        ];
        let once = deduplicate(records);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_by_recency_descending() {
        let mut records = vec![
            record("old", (2023, 11, 4), (23, 59, 59), 38.0, 27.0, 2.0),
            record("newest", (2023, 11, 5), (9, 0, 1), 38.1, 27.1, 2.0),
            record("mid", (2023, 11, 5), (9, 0, 0), 38.2, 27.2, 2.0),
        ];
        sort_by_recency(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "mid", "old"]);
    }

    #[test]
    fn test_validate_magnitudes_bounds() {
        let records = vec![
            record("zero", (2023, 11, 5), (1, 0, 0), 38.0, 27.0, 0.0),
            record("ok", (2023, 11, 5), (2, 0, 0), 38.0, 27.0, 3.1),
            record("ceiling", (2023, 11, 5), (3, 0, 0), 38.0, 27.0, 7.5),
            record("above", (2023, 11, 5), (4, 0, 0), 38.0, 27.0, 7.6),
        ];
        let kept = validate_magnitudes(records, 7.5);
        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "ceiling"]);
    }

    #[tokio::test]
    async fn test_live_records_are_stamped_with_adapter_origin() {
        let primary = FixedSource {
            name: "afad",
            origin: RecordSource::Primary,
            records: None,
        };
        let secondary = FixedSource {
            name: "kandilli",
            origin: RecordSource::Secondary,
            records: Some(vec![record("k", (2023, 11, 5), (8, 0, 0), 40.1, 29.1, 2.2)]),
        };
        let pipeline = Pipeline::with_adapters(
            PipelineConfig::default(),
            vec![Box::new(primary), Box::new(secondary)],
        )
        .unwrap();

        let (records, served_by) = pipeline.fetch_live().await.unwrap();
        assert_eq!(served_by, "kandilli");
        assert!(records
            .iter()
            .all(|r| r.source == Some(RecordSource::Secondary)));

        let response = pipeline.get_latest_earthquakes().await;
        assert!(response.result.iter().all(|r| r.source.is_none()));
    }
}
