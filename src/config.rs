//! Settings read from the environment at startup, each with a default.

use std::path::PathBuf;

use chrono_tz::Tz;

use crate::error::ConfigError;
use crate::time::{MinuteOfDay, TimeFilter};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub stations_path: PathBuf,
    pub trips_path: PathBuf,
    /// Zone that trip timestamps with an offset are converted into
    pub timezone: Tz,
    pub time_filter: TimeFilter,
    pub view_width: f64,
    pub view_height: f64,
    pub zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stations_path: "data/bluebikes-stations.json".into(),
            trips_path: "data/bluebikes-traffic-2024-03.csv".into(),
            timezone: chrono_tz::America::New_York,
            time_filter: TimeFilter::Any,
            view_width: 1024.,
            view_height: 768.,
            zoom: 12.,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(path) = lookup("STATIONS_PATH") {
            config.stations_path = path.into();
        }
        if let Some(path) = lookup("TRIPS_PATH") {
            config.trips_path = path.into();
        }
        if let Some(value) = lookup("TIMEZONE") {
            config.timezone = value
                .parse()
                .map_err(|_| ConfigError::Timezone { var: "TIMEZONE", value })?;
        }
        if let Some(value) = lookup("TIME_FILTER") {
            config.time_filter = parse_time_filter(&value)?;
        }
        if let Some(value) = lookup("VIEW_WIDTH") {
            config.view_width = parse_number("VIEW_WIDTH", value)?;
        }
        if let Some(value) = lookup("VIEW_HEIGHT") {
            config.view_height = parse_number("VIEW_HEIGHT", value)?;
        }
        if let Some(value) = lookup("MAP_ZOOM") {
            config.zoom = parse_number("MAP_ZOOM", value)?;
        }
        Ok(config)
    }
}

fn parse_number(var: &'static str, value: String) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ConfigError::Number { var, value }),
    }
}

/// Either a slider value (`-1` for any time, minutes after midnight otherwise) or a clock time `HH:MM`
fn parse_time_filter(value: &str) -> Result<TimeFilter, ConfigError> {
    let value = value.trim();
    if value.contains(':') {
        value
            .parse::<MinuteOfDay>()
            .map(TimeFilter::At)
            .map_err(|_| ConfigError::Time {
                var: "TIME_FILTER",
                value: value.to_owned(),
            })
    } else {
        value
            .parse::<i64>()
            .map(TimeFilter::from_slider_value)
            .map_err(|_| ConfigError::Time {
                var: "TIME_FILTER",
                value: value.to_owned(),
            })
    }
}
