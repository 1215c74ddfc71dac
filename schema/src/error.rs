use thiserror::Error;

use crate::{HospitalName, Order};

/// Rejected fleet configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fleet must have at least one zip")]
    NoZips,

    #[error("zips must be able to carry at least one package")]
    NoCapacity,

    #[error("zip speed must be positive, got {0} m/s")]
    InvalidSpeed(f64),

    #[error("zip range must be positive, got {0} m")]
    InvalidRange(f64),

    #[error("hospital `{0}` is configured more than once")]
    DuplicateHospital(HospitalName),

    #[error("could not parse {var}={value:?}")]
    InvalidEnv { var: String, value: String },
}

/// Reasons an order is refused by a scheduler
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("unknown hospital `{0}`")]
    UnknownHospital(HospitalName),

    /// The order can never be packed, so it is handed back instead of stalling the backlog
    #[error("hospital `{}` is {distance_m} m away, beyond the {range_m} m zip range", .order.hospital)]
    OutOfRange {
        order: Order,
        distance_m: f64,
        range_m: f64,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("hospital `{0}` has no contact address")]
    MissingAddress(HospitalName),

    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Failures reading hospitals or orders from disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid priority `{0}`")]
    InvalidPriority(String),
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
