use crate::constants::FALLBACK_ID_PREFIX;
use crate::types::{EarthquakeRecord, RecordSource};
use chrono::{NaiveDate, NaiveTime};

/// (time, latitude, longitude, depth km, magnitude, location, province)
type SampleRow = ((u32, u32, u32), f64, f64, f64, f64, &'static str, &'static str);

/// Sample events across the country's most active regions, newest first.
const SAMPLE_ROWS: &[SampleRow] = &[
    ((14, 32, 15), 41.0745, 28.2531, 7.2, 3.2, "Silivri Açıkları (İstanbul)", "İstanbul"),
    ((13, 5, 42), 38.4189, 27.1287, 10.4, 3.7, "Konak (İzmir)", "İzmir"),
    ((11, 48, 9), 40.1885, 29.0610, 6.8, 2.9, "Merkez (Bursa)", "Bursa"),
    ((10, 21, 33), 36.8550, 28.2740, 12.1, 3.4, "Marmaris (Muğla)", "Muğla"),
    ((8, 57, 2), 38.9187, 27.8390, 8.9, 2.6, "Akhisar (Manisa)", "Manisa"),
    ((7, 14, 50), 39.2076, 28.1710, 5.5, 3.1, "Sındırgı (Balıkesir)", "Balıkesir"),
    ((5, 40, 18), 38.1924, 38.8726, 9.7, 2.8, "Pütürge (Malatya)", "Malatya"),
    ((3, 12, 6), 38.2031, 37.1977, 11.3, 3.5, "Elbistan (Kahramanmaraş)", "Kahramanmaraş"),
];

/// Static sample data served when every live source has failed.
///
/// Records are stamped with `today` so they look current, and always carry a
/// province.
pub fn fallback_records(today: NaiveDate) -> Vec<EarthquakeRecord> {
    SAMPLE_ROWS
        .iter()
        .enumerate()
        .map(
            |(i, &((h, m, s), latitude, longitude, depth_km, magnitude, location, province))| {
                EarthquakeRecord {
                    id: format!("{}{}", FALLBACK_ID_PREFIX, i + 1),
                    occurred_date: today,
                    occurred_time: NaiveTime::from_hms_opt(h, m, s).unwrap_or_default(),
                    latitude,
                    longitude,
                    depth_km,
                    magnitude,
                    location: location.to_string(),
                    province: Some(province.to_string()),
                    source: Some(RecordSource::Fallback),
                }
            },
        )
        .collect()
}
