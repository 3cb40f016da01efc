use std::path::PathBuf;

/// Default number of processed rows between two checkpoint writes.
pub const DEFAULT_CHECKPOINT_EVERY: usize = 1000;

/// Immutable per-run configuration, fully resolved before the pipeline starts.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Path of the input CSV file.
    pub file: PathBuf,
    /// Input column holding the zip code; auto-detected from the first row when `None`.
    pub zip: Option<String>,
    /// Input column holding the house number; auto-detected from the first row when `None`.
    pub housenumber: Option<String>,
    /// Name of the output latitude column.
    pub latitude: String,
    /// Name of the output longitude column.
    pub longitude: String,
    /// Emit an enriched CSV instead of the default GeoJSON.
    pub to_csv: bool,
    /// Use a semicolon instead of a comma as the CSV delimiter.
    pub semicolon: bool,
    /// Merge all extended address attributes of the matched record into the output.
    pub merge: bool,
    /// Explicit output path; derived from the input path when `None`.
    pub out: Option<PathBuf>,
    /// Overwrite the output file after this many processed rows.
    pub checkpoint_every: usize,
    /// Optional request timeout for lookups, in seconds.
    pub timeout_seconds: Option<u64>,
}

impl PipelineOptions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            zip: None,
            housenumber: None,
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
            to_csv: false,
            semicolon: false,
            merge: false,
            out: None,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            timeout_seconds: None,
        }
    }

    pub fn delimiter(&self) -> char {
        if self.semicolon {
            ';'
        } else {
            ','
        }
    }
}
