use crate::constants::*;
use crate::error::{QuakeError, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

const ENV_PRIMARY_URL: &str = "QUAKE_PRIMARY_URL";
const ENV_SECONDARY_URL: &str = "QUAKE_SECONDARY_URL";
const ENV_TIMEOUT_MS: &str = "QUAKE_TIMEOUT_MS";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

/// Everything the aggregation pipeline and its adapters need, passed in at
/// construction time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub primary_url: String,
    pub secondary_url: String,
    pub timeout_ms: u64,
    pub bounding_box: BoundingBox,
    pub trailing_window_days: i64,
    pub magnitude_ceiling: f64,
    pub min_magnitude: f64,
    pub result_limit: usize,
    pub utc_offset_hours: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_url: AFAD_API_URL.to_string(),
            secondary_url: KANDILLI_LIST_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            bounding_box: BoundingBox::default(),
            trailing_window_days: DEFAULT_TRAILING_WINDOW_DAYS,
            magnitude_ceiling: MAGNITUDE_CEILING,
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            result_limit: DEFAULT_RESULT_LIMIT,
            utc_offset_hours: TURKEY_UTC_OFFSET_HOURS,
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// Offset used to turn upstream timestamps into local date/time fields.
    pub fn local_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            QuakeError::Config(format!(
                "utc_offset_hours out of range: {}",
                self.utc_offset_hours
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(QuakeError::Config("timeout_ms must be positive".into()));
        }
        if self.trailing_window_days < 1 {
            return Err(QuakeError::Config(
                "trailing_window_days must be at least 1".into(),
            ));
        }
        if self.magnitude_ceiling.is_nan() || self.magnitude_ceiling <= 0.0 {
            return Err(QuakeError::Config(
                "magnitude_ceiling must be positive".into(),
            ));
        }
        self.bounding_box.validate()?;
        self.local_offset()?;
        Ok(())
    }
}

/// Rectangular lat/lon region used to constrain the primary query.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_lat: TURKEY_MIN_LAT,
            max_lat: TURKEY_MAX_LAT,
            min_lon: TURKEY_MIN_LON,
            max_lon: TURKEY_MAX_LON,
        }
    }
}

impl BoundingBox {
    fn validate(&self) -> Result<()> {
        if self.min_lat >= self.max_lat || self.min_lon >= self.max_lon {
            return Err(QuakeError::Config(format!(
                "invalid bounding box: {:?}",
                self
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    /// when the file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
            Config::default()
        };
        config.apply_env_overrides()?;
        config.pipeline.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            QuakeError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Endpoint URLs and the request timeout may be overridden from the
    /// environment; nothing else is.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(ENV_PRIMARY_URL) {
            if !url.trim().is_empty() {
                self.pipeline.primary_url = url.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var(ENV_SECONDARY_URL) {
            if !url.trim().is_empty() {
                self.pipeline.secondary_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.pipeline.timeout_ms = ms,
                Err(e) => {
                    return Err(QuakeError::Config(format!(
                        "{}='{}' is not a number of milliseconds: {}",
                        ENV_TIMEOUT_MS, raw, e
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_turkey() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.magnitude_ceiling, 7.5);
        assert_eq!(cfg.bounding_box.min_lat, TURKEY_MIN_LAT);
        assert_eq!(cfg.bounding_box.max_lon, TURKEY_MAX_LON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pipeline]\ntimeout_ms = 15000\ntrailing_window_days = 7\n\n[server]\nport = 8080"
        )
        .unwrap();

        let cfg = Config::load_from(file.path()).unwrap();
        assert_eq!(cfg.pipeline.timeout_ms, 15_000);
        assert_eq!(cfg.pipeline.trailing_window_days, 7);
        assert_eq!(cfg.pipeline.primary_url, AFAD_API_URL);
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, QuakeError::Config(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.bounding_box.min_lat = 50.0;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.utc_offset_hours = 30;
        assert!(cfg.validate().is_err());
    }
}
