//! Error types for configuration and observability

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unschedulable threshold out of range: {0:?}")]
    ThresholdOutOfRange(Duration),

    #[error("Metrics encoding error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics output is not valid UTF-8: {0}")]
    MetricsUtf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
