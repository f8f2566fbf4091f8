use std::path::PathBuf;

/// Failure to load one of the two datasets. Load failures are terminal for the session.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed station catalog: {0}")]
    Catalog(#[from] serde_json::Error),
    #[error("malformed trip data: {0}")]
    Trips(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp {0:?} is not in a recognised date-time format")]
    InvalidFormat(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid timezone: {value}")]
    Timezone { var: &'static str, value: String },
    #[error("{var} should be a number, got {value:?}")]
    Number { var: &'static str, value: String },
    #[error("{var} should be a slider value or a time like 17:30, got {value:?}")]
    Time { var: &'static str, value: String },
}

/// A clock time which could not be read as `HH:MM`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Time should use format eg. 23:59")]
    InvalidFormat,
    #[error("Time should be between 00:00 and 23:59")]
    OutOfRange,
    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}
