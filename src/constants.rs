/// Source name constants to ensure consistency across the codebase.
/// These names show up in logs, metrics and CLI output.
pub const AFAD_SOURCE: &str = "afad";
pub const KANDILLI_SOURCE: &str = "kandilli";
pub const FALLBACK_SOURCE: &str = "fallback";

// Record id prefixes (one per source keeps ids unique across sources)
pub const AFAD_ID_PREFIX: &str = "afad-";
pub const KANDILLI_ID_PREFIX: &str = "kandilli-";
pub const FALLBACK_ID_PREFIX: &str = "fallback-";

// Upstream endpoints
pub const AFAD_API_URL: &str = "https://deprem.afad.gov.tr/apiv2/event/filter";
pub const KANDILLI_LIST_URL: &str = "http://www.koeri.boun.edu.tr/scripts/lst0.asp";

// Request defaults
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_TRAILING_WINDOW_DAYS: i64 = 1;
pub const DEFAULT_MIN_MAGNITUDE: f64 = 1.0;
pub const DEFAULT_RESULT_LIMIT: usize = 500;
pub const AFAD_QUERY_LIMIT: usize = 200;
pub const AFAD_MAX_MAGNITUDE: f64 = 10.0;

/// No Turkish event has been reliably measured above ~7.9; anything above this
/// is treated as a data-entry error.
pub const MAGNITUDE_CEILING: f64 = 7.5;

/// Turkey has used a fixed UTC+3 offset since 2016.
pub const TURKEY_UTC_OFFSET_HOURS: i32 = 3;

// Turkey bounding box
pub const TURKEY_MIN_LAT: f64 = 35.0;
pub const TURKEY_MAX_LAT: f64 = 43.0;
pub const TURKEY_MIN_LON: f64 = 25.0;
pub const TURKEY_MAX_LON: f64 = 45.0;

// Presentation defaults
pub const HIGH_MAGNITUDE_THRESHOLD: f64 = 4.0;
pub const RECENT_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

