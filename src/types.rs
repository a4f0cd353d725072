use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record came from. Internal only: the pipeline strips it before
/// handing records to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Primary,
    Secondary,
    Fallback,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordSource::Primary => "primary",
            RecordSource::Secondary => "secondary",
            RecordSource::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// Canonical earthquake record shared by every adapter and the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeRecord {
    pub id: String,
    #[serde(rename = "date", with = "short_date")]
    pub occurred_date: NaiveDate,
    #[serde(rename = "time", with = "clock_time")]
    pub occurred_time: NaiveTime,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "depth")]
    pub depth_km: f64,
    pub magnitude: f64,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RecordSource>,
}

impl EarthquakeRecord {
    pub fn occurred_at(&self) -> NaiveDateTime {
        self.occurred_date.and_time(self.occurred_time)
    }

    /// Recency key: date, then hour, then minute, then second.
    pub fn recency_key(&self) -> (NaiveDate, u32, u32, u32) {
        (
            self.occurred_date,
            self.occurred_time.hour(),
            self.occurred_time.minute(),
            self.occurred_time.second(),
        )
    }
}

/// Pipeline output contract consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeResponse {
    pub status: bool,
    pub message: String,
    pub count: usize,
    pub result: Vec<EarthquakeRecord>,
}

/// Filter options applied on top of a pipeline response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EarthquakeQuery {
    pub province: Option<String>,
    pub min_magnitude: Option<f64>,
    pub limit: Option<usize>,
}

/// Core trait that all earthquake data sources implement
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// Provenance tag stamped on the records this source produces
    fn origin(&self) -> RecordSource;

    /// Fetch and normalize the current event list.
    ///
    /// Transport failures, timeouts and unusable payloads surface as
    /// `QuakeError::SourceUnavailable`; individual bad rows are dropped.
    async fn fetch(&self) -> Result<Vec<EarthquakeRecord>>;
}

/// `dd.mm.yy`; two-digit years are read back as 2000+YY.
pub mod short_date {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%d.%m.%y").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s)))
    }

    /// Accepts `dd.mm.yy` and `dd.mm.yyyy`.
    pub fn parse(s: &str) -> Option<NaiveDate> {
        let mut parts = s.trim().split('.');
        let day: u32 = parts.next()?.parse().ok()?;
        let month: u32 = parts.next()?.parse().ok()?;
        let year_raw = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let year: i32 = year_raw.parse().ok()?;
        let year = if year_raw.len() == 2 { 2000 + year } else { year };
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// `HH:MM:SS`
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M:%S").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EarthquakeRecord {
        EarthquakeRecord {
            id: "afad-1".into(),
            occurred_date: NaiveDate::from_ymd_opt(2023, 11, 5).unwrap(),
            occurred_time: NaiveTime::from_hms_opt(16, 30, 12).unwrap(),
            latitude: 40.9861,
            longitude: 28.7929,
            depth_km: 8.3,
            magnitude: 3.2,
            location: "Silivri".into(),
            province: Some("İstanbul".into()),
            source: None,
        }
    }

    #[test]
    fn test_record_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["date"], "05.11.23");
        assert_eq!(json["time"], "16:30:12");
        assert_eq!(json["depth"], 8.3);
        assert_eq!(json["province"], "İstanbul");
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_source_serialized_when_present() {
        let mut rec = sample();
        rec.source = Some(RecordSource::Secondary);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["source"], "secondary");
    }

    #[test]
    fn test_two_digit_year_is_twenty_first_century() {
        assert_eq!(
            short_date::parse("05.11.23"),
            NaiveDate::from_ymd_opt(2023, 11, 5)
        );
        assert_eq!(
            short_date::parse("05.11.2023"),
            NaiveDate::from_ymd_opt(2023, 11, 5)
        );
        assert_eq!(short_date::parse("31.02.23"), None);
        assert_eq!(short_date::parse("05.11"), None);
    }
}
