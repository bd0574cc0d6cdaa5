//! Configuration types for ingestion and rendering.

use std::time::Duration;

use crate::SerialWindowError;

/// Configuration for the retained window and the polling cadence.
///
/// Use [`WindowConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use serial_window::WindowConfig;
/// use std::time::Duration;
///
/// let config = WindowConfig {
///     n_channels: 3,
///     read_timeout: Duration::from_millis(200),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Number of comma-separated values expected per line.
    ///
    /// Default: 2
    pub n_channels: usize,

    /// Number of most recent records retained.
    ///
    /// Default: 500
    pub n_points: usize,

    /// Value of cells that have never been written.
    ///
    /// Default: NaN
    pub fill_value: f64,

    /// Upper bound on a single read attempt.
    ///
    /// This also bounds how long a stop request takes to be observed.
    /// Default: 1s
    pub read_timeout: Duration,

    /// How often the render loop takes a snapshot.
    ///
    /// Default: 50ms
    pub poll_interval: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            n_channels: 2,
            n_points: 500,
            fill_value: f64::NAN,
            read_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl WindowConfig {
    /// Checks that every size and duration is usable.
    pub fn validate(&self) -> Result<(), SerialWindowError> {
        if self.n_channels == 0 {
            return Err(SerialWindowError::invalid_config(
                "n_channels must be positive",
            ));
        }
        if self.n_points == 0 {
            return Err(SerialWindowError::invalid_config(
                "n_points must be positive",
            ));
        }
        if self.n_channels.checked_mul(self.n_points).is_none() {
            return Err(SerialWindowError::invalid_config(
                "n_channels * n_points overflows",
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(SerialWindowError::invalid_config(
                "read_timeout must be non-zero",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(SerialWindowError::invalid_config(
                "poll_interval must be non-zero",
            ));
        }
        Ok(())
    }

    /// Applies a single `key=value` option.
    ///
    /// Recognized keys: `n_channels`, `n_points`, `fill_value`,
    /// `read_timeout`, `poll_interval`. Durations take an optional `ms` or
    /// `s` suffix; a bare number is milliseconds.
    pub fn apply_option(&mut self, option: &str) -> Result<(), SerialWindowError> {
        let (key, value) = option.split_once('=').ok_or_else(|| {
            SerialWindowError::invalid_config(format!("expected key=value, got {option:?}"))
        })?;
        let value = value.trim();

        match key.trim() {
            "n_channels" => self.n_channels = parse_count(key, value)?,
            "n_points" => self.n_points = parse_count(key, value)?,
            "fill_value" => {
                self.fill_value = value.parse().map_err(|_| {
                    SerialWindowError::invalid_config(format!(
                        "fill_value: not a number: {value:?}"
                    ))
                })?;
            }
            "read_timeout" => self.read_timeout = parse_duration(key, value)?,
            "poll_interval" => self.poll_interval = parse_duration(key, value)?,
            other => {
                return Err(SerialWindowError::invalid_config(format!(
                    "unknown option {other:?}"
                )))
            }
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize, SerialWindowError> {
    value
        .parse()
        .map_err(|_| SerialWindowError::invalid_config(format!("{key}: not a count: {value:?}")))
}

fn parse_duration(key: &str, value: &str) -> Result<Duration, SerialWindowError> {
    let invalid = || SerialWindowError::invalid_config(format!("{key}: not a duration: {value:?}"));

    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse().map(Duration::from_millis).map_err(|_| invalid());
    }
    if let Some(secs) = value.strip_suffix('s') {
        let secs: f64 = secs.trim().parse().map_err(|_| invalid())?;
        return Duration::try_from_secs_f64(secs).map_err(|_| invalid());
    }
    value.parse().map(Duration::from_millis).map_err(|_| invalid())
}
