//! Secondary source: the Kandilli Observatory "last earthquakes" listing.
//!
//! The page has no schema. Events sit in a fixed-width text block inside a
//! `<pre>` element, so every field is cut out by character position. All of
//! the column knowledge lives in this file; a layout change upstream should
//! only need edits here.

use crate::apis::{build_client, fetch_text, parse_number};
use crate::config::PipelineConfig;
use crate::constants::{KANDILLI_ID_PREFIX, KANDILLI_SOURCE};
use crate::error::{QuakeError, Result};
use crate::metrics::ParserMetrics;
use crate::normalize::extract_province;
use crate::types::{EarthquakeRecord, RecordSource, SourceAdapter};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Title, observatory name, subtitle, blank, column names, magnitude sub-header.
const HEADER_LINES: usize = 6;
const MIN_LINE_LEN: usize = 60;

const COL_DATE: Range<usize> = 0..10;
const COL_TIME: Range<usize> = 11..19;
const COL_LAT: Range<usize> = 20..29;
const COL_LON: Range<usize> = 30..39;
const COL_DEPTH: Range<usize> = 39..50;
const COL_MD: Range<usize> = 50..59;
const COL_ML: Range<usize> = 59..64;
const COL_MAGNITUDES: Range<usize> = 50..71;
const COL_LOCATION: Range<usize> = 71..121;

/// Events this close to processing time get today's date.
const RESTAMP_WINDOW_HOURS: i64 = 2;
const PLAUSIBLE_MAGNITUDE_MAX: f64 = 10.0;

static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}|\d{2})\.(\d{2})\.(\d{2})$").expect("static regex"));
static RE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").expect("static regex"));
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"));

/// Labeled magnitude tokens in priority order. Labels are case-sensitive so
/// that ordinary words do not read as scale names.
static RE_LABELED: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["ML", "Mw", "MD", "Mb"]
        .iter()
        .map(|label| {
            Regex::new(&format!(r"\b{}\s*[:=]?\s*(\d+(?:\.\d+)?)", label)).expect("static regex")
        })
        .collect()
});

pub struct KandilliAdapter {
    client: reqwest::Client,
    config: PipelineConfig,
    offset: FixedOffset,
}

impl KandilliAdapter {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let client = build_client(config.timeout())?;
        let offset = config.local_offset()?;
        Ok(Self {
            client,
            config,
            offset,
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for KandilliAdapter {
    fn source_name(&self) -> &'static str {
        KANDILLI_SOURCE
    }

    fn origin(&self) -> RecordSource {
        RecordSource::Secondary
    }

    #[instrument(skip(self), fields(source = KANDILLI_SOURCE))]
    async fn fetch(&self) -> Result<Vec<EarthquakeRecord>> {
        let request = self.client.get(&self.config.secondary_url);
        let html = fetch_text(KANDILLI_SOURCE, request).await?;

        let listing = extract_listing(&html).ok_or_else(|| {
            warn!("Kandilli page has no <pre> listing - the page structure may have changed");
            QuakeError::unavailable(KANDILLI_SOURCE, "listing block not found")
        })?;

        let now = Utc::now().with_timezone(&self.offset);
        let records = parse_listing(&listing, now, self.config.magnitude_ceiling);

        info!("Parsed {} events from Kandilli", records.len());
        Ok(records)
    }
}

/// Text of the first `<pre>` block in the page.
pub fn extract_listing(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("pre").ok()?;
    document
        .select(&selector)
        .next()
        .map(|pre| pre.text().collect::<String>())
}

/// Parse the fixed-width listing into records.
///
/// Malformed, future-dated and magnitude-less lines are dropped one by one.
/// A final pass removes anything above `ceiling`; this source is not trusted
/// enough to clamp.
pub fn parse_listing(listing: &str, now: DateTime<FixedOffset>, ceiling: f64) -> Vec<EarthquakeRecord> {
    let started = Instant::now();

    let data_lines = listing
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .skip(HEADER_LINES)
        .filter(|line| !is_separator(line));

    let mut records = Vec::new();
    for line in data_lines {
        if line.chars().count() < MIN_LINE_LEN {
            continue;
        }
        match parse_line(line, now) {
            Ok(mut record) => {
                record.id = format!("{}{}", KANDILLI_ID_PREFIX, records.len() + 1);
                records.push(record);
            }
            Err(e) => {
                debug!(error = %e, line, "discarding Kandilli line");
                ParserMetrics::record_discarded(KANDILLI_SOURCE, e.kind());
            }
        }
    }

    records.retain(|r| {
        let keep = r.magnitude <= ceiling;
        if !keep {
            warn!(id = %r.id, magnitude = r.magnitude, ceiling, "rejecting implausible Kandilli magnitude");
            ParserMetrics::record_discarded(KANDILLI_SOURCE, "implausible_magnitude");
        }
        keep
    });

    ParserMetrics::record_parse_success(
        KANDILLI_SOURCE,
        records.len(),
        started.elapsed().as_secs_f64(),
    );
    records
}

/// Parse one data line. The returned record has an empty id.
pub fn parse_line(line: &str, now: DateTime<FixedOffset>) -> Result<EarthquakeRecord> {
    let chars: Vec<char> = line.chars().collect();

    let date = parse_date(&column(&chars, COL_DATE))?;
    let time = parse_time(&column(&chars, COL_TIME))?;
    let magnitude = parse_magnitude(&chars)
        .ok_or_else(|| QuakeError::malformed("no plausible magnitude"))?;

    let occurred = date.and_time(time);
    let now_local = now.naive_local();
    if occurred > now_local {
        return Err(QuakeError::malformed(format!("event in the future: {}", occurred)));
    }

    // The listing can carry the previous day's date on events that happened
    // moments ago; show those as today.
    let occurred_date = if now_local - occurred <= Duration::hours(RESTAMP_WINDOW_HOURS) {
        now_local.date()
    } else {
        date
    };

    let location = column(&chars, COL_LOCATION);
    let province = extract_province(&location);

    Ok(EarthquakeRecord {
        id: String::new(),
        occurred_date,
        occurred_time: time,
        latitude: parse_number(&column(&chars, COL_LAT)),
        longitude: parse_number(&column(&chars, COL_LON)),
        depth_km: parse_number(&column(&chars, COL_DEPTH)).max(0.0),
        magnitude,
        location,
        province,
        source: None,
    })
}

/// Trimmed text between two character positions, clamped to the line.
fn column(chars: &[char], range: Range<usize>) -> String {
    let end = range.end.min(chars.len());
    let start = range.start.min(end);
    chars[start..end].iter().collect::<String>().trim().to_string()
}

fn is_separator(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.chars().all(|c| c == '-' || c.is_whitespace())
}

/// `YYYY.MM.DD`, or `YY.MM.DD` read as 2000+YY.
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let caps = RE_DATE
        .captures(raw)
        .ok_or_else(|| QuakeError::malformed(format!("bad date '{}'", raw)))?;
    let year_raw = &caps[1];
    let mut year: i32 = year_raw
        .parse()
        .map_err(|_| QuakeError::malformed(format!("bad year '{}'", year_raw)))?;
    if year_raw.len() == 2 {
        year += 2000;
    }
    let month: u32 = caps[2].parse().unwrap_or(0);
    let day: u32 = caps[3].parse().unwrap_or(0);
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| QuakeError::malformed(format!("impossible date '{}'", raw)))
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    if !RE_TIME.is_match(raw) {
        return Err(QuakeError::malformed(format!("bad time '{}'", raw)));
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .map_err(|_| QuakeError::malformed(format!("impossible time '{}'", raw)))
}

/// ML column, then MD column, then labeled tokens, then the first plausible
/// number in the magnitude block.
fn parse_magnitude(chars: &[char]) -> Option<f64> {
    if let Some(m) = column_magnitude(&column(chars, COL_ML)) {
        return Some(m);
    }
    if let Some(m) = column_magnitude(&column(chars, COL_MD)) {
        return Some(m);
    }

    // Labels are only searched ahead of the free-text location column.
    let fields: String = chars[..COL_LOCATION.start.min(chars.len())].iter().collect();
    for re in RE_LABELED.iter() {
        if let Some(m) = re
            .captures(&fields)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|m| is_plausible(*m))
        {
            return Some(m);
        }
    }

    let block = column(chars, COL_MAGNITUDES);
    RE_NUMBER
        .find_iter(&block)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .find(|m| is_plausible(*m))
}

/// Blank cells and the `-.-` placeholder carry no value.
fn column_magnitude(raw: &str) -> Option<f64> {
    if raw.is_empty() || raw.chars().all(|c| c == '-' || c == '.') {
        return None;
    }
    raw.parse::<f64>().ok().filter(|m| is_plausible(*m))
}

fn is_plausible(m: f64) -> bool {
    m.is_finite() && m > 0.0 && m <= PLAUSIBLE_MAGNITUDE_MAX
}
