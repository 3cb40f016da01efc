use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocoderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file {0:?} does not exist")]
    InputNotFound(PathBuf),

    #[error("Unable to determine the {0} column from the available fields")]
    UnresolvableField(String),
}

pub type Result<T> = std::result::Result<T, GeocoderError>;
