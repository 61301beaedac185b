use thiserror::Error;

#[derive(Error, Debug)]
pub enum EpochError {
    #[error("Window length must be at least 1")]
    ZeroWindow,

    #[error("Step must be at least 1")]
    ZeroStep,

    #[error("Window of {window} samples exceeds sweep length of {rows}")]
    WindowExceedsSweep { window: usize, rows: usize },

    #[error("Channel not found in sweep table: {0}")]
    ChannelNotFound(String),

    #[error("Insufficient data: need at least {min} samples, got {actual}")]
    InsufficientData { min: usize, actual: usize },

    #[error("Empty value range: min {min} must be below max {max}")]
    EmptyRange { min: f64, max: f64 },

    #[error("Histogram needs at least one bin")]
    InvalidBins,

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Statistical computation failed: {0}")]
    Stats(String),
}

pub type Result<T> = std::result::Result<T, EpochError>;
