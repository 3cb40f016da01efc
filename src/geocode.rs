use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Result;

/// Base URL of the PDOK locatieserver free-text search endpoint.
pub const PDOK_BASE_URL: &str = "https://api.pdok.nl/bzk/locatieserver/search/v3_1";

/// Every descriptive attribute a BAG address record can carry besides the two
/// centroid fields. CSV output uses this fixed superset so that column
/// positions stay stable even when a matched record lacks some of them.
pub const EXTENDED_ATTRIBUTE_NAMES: &[&str] = &[
    "bron",
    "woonplaatscode",
    "type",
    "woonplaatsnaam",
    "wijkcode",
    "huis_nlt",
    "openbareruimtetype",
    "buurtnaam",
    "gemeentecode",
    "rdf_seealso",
    "weergavenaam",
    "straatnaam_verkort",
    "id",
    "gekoppeld_perceel",
    "gemeentenaam",
    "buurtcode",
    "wijknaam",
    "identificatie",
    "openbareruimte_id",
    "waterschapsnaam",
    "provinciecode",
    "postcode",
    "provincienaam",
    "nummeraanduiding_id",
    "waterschapscode",
    "adresseerbaarobject_id",
    "huisnummer",
    "provincieafkorting",
    "straatnaam",
    "score",
];

/// Extracts the two numbers from a `POINT(<a> <b>)` geopoint.
static POINT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"POINT\(([\d.]+) ([\d.]+)\)").unwrap());

/// Why a single lookup produced no usable location. Never fatal: the driver
/// logs it and drops the row.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("no matching address record")]
    NoMatch,

    #[error("matched record has a malformed coordinate")]
    MalformedCoordinate,
}

/// A resolved address: geographic coordinates, the projected (RD) pair as
/// returned by the service, and optionally every other attribute of the
/// matched record.
#[derive(Debug, Clone)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub x: f64,
    pub y: f64,
    pub extended_attributes: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    response: ResponseBody,
}

#[derive(Debug, Deserialize, Default)]
struct ResponseBody {
    #[serde(default)]
    docs: Vec<Candidate>,
}

/// One entry of the locatieserver result list. Only the source tag, the record
/// type and the two centroids are interpreted; everything else is captured
/// verbatim as extended attributes.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    bron: String,
    #[serde(rename = "type", default)]
    kind: String,
    centroide_ll: Option<String>,
    centroide_rd: Option<String>,
    #[serde(flatten)]
    attributes: serde_json::Map<String, Value>,
}

impl Candidate {
    fn is_address(&self) -> bool {
        self.bron == "BAG" && self.kind == "adres"
    }
}

/// Shared seam between the pipeline driver and the network so lookups can be
/// stubbed out in tests.
#[async_trait::async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(
        &self,
        zip: &str,
        housenumber: &str,
        include_attributes: bool,
        line_number: usize,
    ) -> std::result::Result<Location, LookupError>;
}

/// Geocode client against the PDOK locatieserver. One outbound request per
/// lookup, no retries; the first authoritative match wins.
pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(timeout_seconds: Option<u64>) -> Result<Self> {
        Self::with_base_url(PDOK_BASE_URL, timeout_seconds)
    }

    pub fn with_base_url(base_url: &str, timeout_seconds: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl AddressLookup for GeocodeClient {
    async fn lookup(
        &self,
        zip: &str,
        housenumber: &str,
        include_attributes: bool,
        line_number: usize,
    ) -> std::result::Result<Location, LookupError> {
        let query = format!("{} {}", zip.replace(' ', ""), housenumber);
        info!("{}. Resolving {}, {}", line_number, zip, housenumber);
        println!("{line_number}. Resolving {zip}, {housenumber}");

        let response = self
            .client
            .get(format!("{}/free", self.base_url))
            .query(&[("q", query.as_str())])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        if !response.status().is_success() {
            warn!(
                "Error resolving {}, {}: status {}",
                zip,
                housenumber,
                response.status()
            );
            return Err(LookupError::Network(format!(
                "status {}",
                response.status()
            )));
        }

        // A mis-shaped body is a miss, not a crash.
        let result: SearchResult = response.json().await.map_err(|e| {
            warn!("Error resolving {}, {}: {}", zip, housenumber, e);
            LookupError::NoMatch
        })?;

        extract_location(result.response.docs, include_attributes).map_err(|e| {
            warn!("Error resolving {}, {}: {}", zip, housenumber, e);
            e
        })
    }
}

/// Picks the best candidate from a result list and decomposes its centroids.
///
/// Only `bron == "BAG"` / `type == "adres"` entries are eligible; the list is
/// already relevance-ranked by the service, so the first eligible entry wins.
fn extract_location(
    docs: Vec<Candidate>,
    include_attributes: bool,
) -> std::result::Result<Location, LookupError> {
    let best = docs
        .into_iter()
        .find(Candidate::is_address)
        .ok_or(LookupError::NoMatch)?;

    let (lon, lat) = best
        .centroide_ll
        .as_deref()
        .and_then(parse_point)
        .ok_or(LookupError::MalformedCoordinate)?;
    let (x, y) = best
        .centroide_rd
        .as_deref()
        .and_then(parse_point)
        .ok_or(LookupError::MalformedCoordinate)?;

    // Everything but the centroids counts as an extended attribute, the
    // source tag and record type included.
    let extended_attributes = include_attributes.then(|| {
        let mut attributes: HashMap<String, String> = best
            .attributes
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        attributes.insert("bron".to_string(), best.bron);
        attributes.insert("type".to_string(), best.kind);
        attributes
    });

    Ok(Location {
        lat,
        lon,
        x,
        y,
        extended_attributes,
    })
}

/// Parses a `POINT(<a> <b>)` text into its two numbers, in textual order.
fn parse_point(text: &str) -> Option<(f64, f64)> {
    let captures = POINT_REGEX.captures(text)?;
    let first: f64 = captures.get(1)?.as_str().parse().ok()?;
    let second: f64 = captures.get(2)?.as_str().parse().ok()?;
    Some((first, second))
}
