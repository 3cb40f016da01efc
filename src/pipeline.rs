use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{GeocoderError, Result};
use crate::fields::{self, ResolvedFields};
use crate::geocode::{AddressLookup, GeocodeClient};
use crate::options::PipelineOptions;
use crate::row::Row;
use crate::sink::{sink_for_options, OutputSink};

/// End-of-run report.
#[derive(Debug)]
pub struct PipelineSummary {
    pub total_rows: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub output_file: PathBuf,
}

/// Drives one enrichment run: reads the input row by row, resolves the
/// address columns on the first row, performs exactly one lookup at a time
/// and appends each hit to the output sink.
///
/// All per-run state lives on this value, so independent runs can coexist in
/// one process.
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Runs against the live geocode service.
    pub async fn run(&self) -> Result<PipelineSummary> {
        let client = GeocodeClient::new(self.options.timeout_seconds)?;
        self.run_with_lookup(&client).await
    }

    /// Runs with a caller-supplied lookup implementation.
    pub async fn run_with_lookup(&self, lookup: &dyn AddressLookup) -> Result<PipelineSummary> {
        let input = &self.options.file;
        if !input.exists() {
            return Err(GeocoderError::InputNotFound(input.clone()));
        }
        let output_file = self.output_path();

        info!("Enriching {:?} into {:?}", input, output_file);
        println!("Enriching {} into {}", input.display(), output_file.display());

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter() as u8)
            .from_path(input)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut sink = sink_for_options(&self.options);
        let mut resolved: Option<ResolvedFields> = None;
        let mut line_number = 0usize;
        let mut enriched = 0usize;
        let mut skipped = 0usize;

        // One record, one awaited lookup: nothing downstream ever runs
        // concurrently, so output order always matches input order.
        for record in reader.records() {
            let record = record?;
            line_number += 1;

            let values: Vec<String> = record.iter().map(str::to_string).collect();
            let row = Row::new(&headers, &values, line_number);

            if resolved.is_none() {
                resolved = Some(self.resolve_fields(&headers)?);
            }
            let fields = resolved.as_ref().expect("resolved on first row");

            let zip = row.get(&fields.zip).unwrap_or("").replace(' ', "");
            let housenumber = row.get(&fields.housenumber).unwrap_or("").to_string();

            if zip.is_empty() || housenumber.is_empty() {
                warn!(
                    "Cannot find zip code or house number at line {}",
                    line_number
                );
                skipped += 1;
            } else {
                match lookup
                    .lookup(&zip, &housenumber, self.options.merge, line_number)
                    .await
                {
                    Ok(location) => {
                        sink.append(&row, &location);
                        enriched += 1;
                    }
                    Err(e) => {
                        warn!(
                            "Cannot find location at line {} for {} {}: {}",
                            line_number, zip, housenumber, e
                        );
                        skipped += 1;
                    }
                }
            }

            // Success and skip both advance the checkpoint counter.
            let checkpoint_every = self.options.checkpoint_every.max(1);
            if line_number % checkpoint_every == 0 {
                self.write_output(&output_file, sink.as_ref())?;
                info!("Checkpointed {} rows to {:?}", line_number, output_file);
            }
        }

        self.write_output(&output_file, sink.as_ref())?;
        info!(
            "Finished: {} rows, {} enriched, {} skipped",
            line_number, enriched, skipped
        );

        Ok(PipelineSummary {
            total_rows: line_number,
            enriched,
            skipped,
            output_file,
        })
    }

    fn resolve_fields(&self, headers: &[String]) -> Result<ResolvedFields> {
        match (&self.options.zip, &self.options.housenumber) {
            (Some(zip), Some(housenumber)) => Ok(ResolvedFields {
                zip: zip.clone(),
                housenumber: housenumber.clone(),
            }),
            (zip, housenumber) => {
                fields::resolve(headers, zip.as_deref(), housenumber.as_deref())
            }
        }
    }

    fn write_output(&self, path: &Path, sink: &dyn OutputSink) -> Result<()> {
        fs::write(path, sink.render()?)?;
        Ok(())
    }

    /// Destination path: explicit override, else derived from the input name.
    /// CSV mode gets an `_out` suffix before the extension, GeoJSON mode swaps
    /// the extension for `.json`.
    pub fn output_path(&self) -> PathBuf {
        if let Some(out) = &self.options.out {
            return out.clone();
        }
        let input = &self.options.file;
        if self.options.to_csv {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let name = match input.extension() {
                Some(ext) => format!("{}_out.{}", stem, ext.to_string_lossy()),
                None => format!("{stem}_out"),
            };
            input.with_file_name(name)
        } else {
            input.with_extension("json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PipelineOptions;

    #[test]
    fn csv_output_gets_an_out_suffix() {
        let mut options = PipelineOptions::new("/data/addresses.csv");
        options.to_csv = true;
        let pipeline = Pipeline::new(options);
        assert_eq!(
            pipeline.output_path(),
            PathBuf::from("/data/addresses_out.csv")
        );
    }

    #[test]
    fn geojson_output_swaps_the_extension() {
        let options = PipelineOptions::new("/data/addresses.csv");
        let pipeline = Pipeline::new(options);
        assert_eq!(pipeline.output_path(), PathBuf::from("/data/addresses.json"));
    }

    #[test]
    fn explicit_output_path_wins() {
        let mut options = PipelineOptions::new("/data/addresses.csv");
        options.out = Some(PathBuf::from("/tmp/result.geojson"));
        let pipeline = Pipeline::new(options);
        assert_eq!(pipeline.output_path(), PathBuf::from("/tmp/result.geojson"));
    }

    #[tokio::test]
    async fn missing_input_fails_fast() {
        let options = PipelineOptions::new("/nonexistent/input.csv");
        let pipeline = Pipeline::new(options);
        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, GeocoderError::InputNotFound(_)));
    }
}
