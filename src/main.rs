use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use pdok_geocoder::logging;
use pdok_geocoder::options::{PipelineOptions, DEFAULT_CHECKPOINT_EVERY};
use pdok_geocoder::pipeline::Pipeline;

/// Converts a CSV with Dutch addresses to a GeoJSON (default), or to a new
/// CSV with additional columns for the latitude and longitude, by resolving
/// each row against the PDOK locatieserver.
#[derive(Parser)]
#[command(name = "pdok-geocoder")]
#[command(version = "0.1.0")]
struct Cli {
    /// Filename to parse
    file: PathBuf,

    /// Name of the input column that represents the zip code. By default,
    /// tries to look for "zip", "pc", "pc6" or "postal".
    #[arg(short, long)]
    zip: Option<String>,

    /// Name of the input column that represents the house number. By default,
    /// "hn", "huisnummer", "house_number", "number" or "nmbr".
    #[arg(short = 'n', long)]
    housenumber: Option<String>,

    /// Name of the output column for the latitude.
    #[arg(long, default_value = "lat")]
    latitude: String,

    /// Name of the output column for the longitude.
    #[arg(long, default_value = "lon")]
    longitude: String,

    /// Converts the input CSV to a new CSV instead of GeoJSON.
    #[arg(short = 'c', long)]
    to_csv: bool,

    /// Uses a semicolon as CSV delimiter instead of the default comma.
    #[arg(short, long)]
    semicolon: bool,

    /// Merges all address attributes of the matched record into the output.
    #[arg(short, long)]
    merge: bool,

    /// Optional output filename.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Overwrite the output file after this many processed rows.
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY)]
    checkpoint_every: usize,

    /// Request timeout for lookups, in seconds. No timeout when omitted.
    #[arg(long)]
    timeout_seconds: Option<u64>,
}

impl Cli {
    fn into_options(self) -> PipelineOptions {
        let mut options = PipelineOptions::new(self.file);
        options.zip = self.zip;
        options.housenumber = self.housenumber;
        options.latitude = self.latitude;
        options.longitude = self.longitude;
        options.to_csv = self.to_csv;
        options.semicolon = self.semicolon;
        options.merge = self.merge;
        options.out = self.out;
        options.checkpoint_every = self.checkpoint_every;
        options.timeout_seconds = self.timeout_seconds;
        options
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(cli.into_options());

    match pipeline.run().await {
        Ok(summary) => {
            println!("\n📊 Enrichment results:");
            println!("   Total rows: {}", summary.total_rows);
            println!("   Enriched: {}", summary.enriched);
            println!("   Skipped: {}", summary.skipped);
            println!("   Output file: {}", summary.output_file.display());
            Ok(())
        }
        Err(e) => {
            error!("Enrichment failed: {}", e);
            Err(e.into())
        }
    }
}
