use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::geocode::{Location, EXTENDED_ATTRIBUTE_NAMES};
use crate::headers::make_unique;
use crate::options::PipelineOptions;
use crate::row::Row;

/// Accumulates enriched records one at a time and renders the full output on
/// demand. The accumulator is owned by one sink for one run.
pub trait OutputSink: Send {
    fn append(&mut self, row: &Row, location: &Location);
    fn render(&self) -> Result<String>;
}

/// Picks the output strategy for this run.
pub fn sink_for_options(options: &PipelineOptions) -> Box<dyn OutputSink> {
    if options.to_csv {
        Box::new(CsvSink::new(
            options.delimiter(),
            &options.latitude,
            &options.longitude,
            options.merge,
        ))
    } else {
        Box::new(GeoJsonSink::new(options.merge))
    }
}

/// Emits a delimited line per record under a header fixed on the first append.
///
/// Cell values are joined as-is, without quoting or delimiter escaping. That
/// matches the input handling of this tool but means a cell containing the
/// delimiter shifts columns.
pub struct CsvSink {
    lines: Vec<String>,
    headers_initialized: bool,
    delimiter: char,
    latitude: String,
    longitude: String,
    merge: bool,
}

impl CsvSink {
    pub fn new(delimiter: char, latitude: &str, longitude: &str, merge: bool) -> Self {
        Self {
            lines: Vec::new(),
            headers_initialized: false,
            delimiter,
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            merge,
        }
    }

    fn base_headers(&self, row: &Row) -> Vec<String> {
        let mut headers: Vec<String> = row.columns().map(str::to_string).collect();
        headers.push(self.latitude.clone());
        headers.push(self.longitude.clone());
        headers.push("x".to_string());
        headers.push("y".to_string());
        headers
    }

    fn join(&self, cells: Vec<String>) -> String {
        cells.join(&self.delimiter.to_string())
    }
}

impl OutputSink for CsvSink {
    fn append(&mut self, row: &Row, location: &Location) {
        if !self.headers_initialized {
            let mut headers = self.base_headers(row);
            if self.merge {
                // The full attribute superset, not just what this record has,
                // keeps column positions stable for every later row.
                let unique = make_unique(&headers, EXTENDED_ATTRIBUTE_NAMES);
                headers.extend(unique);
            }
            self.lines.push(self.join(headers));
            self.headers_initialized = true;
        }

        let mut cells: Vec<String> = row.values().map(str::to_string).collect();
        cells.push(location.lat.to_string());
        cells.push(location.lon.to_string());
        cells.push(location.x.to_string());
        cells.push(location.y.to_string());

        if self.merge {
            for &name in EXTENDED_ATTRIBUTE_NAMES {
                let value = location
                    .extended_attributes
                    .as_ref()
                    .and_then(|attributes| attributes.get(name))
                    .cloned()
                    .unwrap_or_default();
                cells.push(value);
            }
        }

        self.lines.push(self.join(cells));
    }

    fn render(&self) -> Result<String> {
        Ok(self.lines.join("\n"))
    }
}

#[derive(Debug, Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: &'a [Feature],
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: Geometry,
    properties: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    /// GeoJSON order: longitude before latitude.
    coordinates: [f64; 2],
}

/// Accumulates one point Feature per record; render yields the whole
/// FeatureCollection. Unlike CSV mode, attribute-key disambiguation runs per
/// feature against that feature's own property names.
pub struct GeoJsonSink {
    features: Vec<Feature>,
    merge: bool,
}

impl GeoJsonSink {
    pub fn new(merge: bool) -> Self {
        Self {
            features: Vec::new(),
            merge,
        }
    }
}

impl OutputSink for GeoJsonSink {
    fn append(&mut self, row: &Row, location: &Location) {
        let mut properties = Map::new();
        for (column, value) in row.columns().zip(row.values()) {
            properties.insert(column.to_string(), Value::String(value.to_string()));
        }
        properties.insert("x".to_string(), json!(location.x));
        properties.insert("y".to_string(), json!(location.y));

        if self.merge {
            let mut existing: Vec<String> = row.columns().map(str::to_string).collect();
            existing.push("x".to_string());
            existing.push("y".to_string());
            let unique = make_unique(&existing, EXTENDED_ATTRIBUTE_NAMES);
            for (key, &name) in unique.into_iter().zip(EXTENDED_ATTRIBUTE_NAMES) {
                let value = location
                    .extended_attributes
                    .as_ref()
                    .and_then(|attributes| attributes.get(name))
                    .cloned()
                    .unwrap_or_default();
                properties.insert(key, Value::String(value));
            }
        }

        self.features.push(Feature {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: [location.lon, location.lat],
            },
            properties,
        });
    }

    fn render(&self) -> Result<String> {
        let collection = FeatureCollection {
            kind: "FeatureCollection",
            features: &self.features,
        };
        Ok(serde_json::to_string(&collection)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row() -> Row {
        Row::new(
            &["pc".to_string(), "hn".to_string()],
            &["1234AB".to_string(), "12".to_string()],
            1,
        )
    }

    fn location() -> Location {
        Location {
            lat: 52.1,
            lon: 4.9,
            x: 100000.0,
            y: 500000.0,
            extended_attributes: None,
        }
    }

    #[test]
    fn csv_renders_header_and_value_line() {
        let mut sink = CsvSink::new(',', "lat", "lon", false);
        sink.append(&row(), &location());
        assert_eq!(
            sink.render().unwrap(),
            "pc,hn,lat,lon,x,y\n1234AB,12,52.1,4.9,100000,500000"
        );
    }

    #[test]
    fn csv_respects_semicolon_delimiter() {
        let mut sink = CsvSink::new(';', "lat", "lon", false);
        sink.append(&row(), &location());
        assert_eq!(
            sink.render().unwrap(),
            "pc;hn;lat;lon;x;y\n1234AB;12;52.1;4.9;100000;500000"
        );
    }

    #[test]
    fn csv_merge_keeps_columns_stable_when_attributes_are_missing() {
        let mut sink = CsvSink::new(',', "lat", "lon", true);

        let mut with_street = location();
        with_street.extended_attributes = Some(HashMap::from([(
            "straatnaam".to_string(),
            "Dorpsstraat".to_string(),
        )]));
        sink.append(&row(), &with_street);

        let mut without_street = location();
        without_street.extended_attributes = Some(HashMap::new());
        sink.append(&row(), &without_street);

        let rendered = sink.render().unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);

        let headers: Vec<&str> = lines[0].split(',').collect();
        let column = headers.iter().position(|h| *h == "straatnaam").unwrap();
        let first: Vec<&str> = lines[1].split(',').collect();
        let second: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(first[column], "Dorpsstraat");
        assert_eq!(second[column], "");
        assert_eq!(first.len(), headers.len());
        assert_eq!(second.len(), headers.len());
    }

    #[test]
    fn csv_merge_disambiguates_colliding_attribute_names() {
        // An input column named like an extended attribute forces a rename.
        let row = Row::new(
            &["postcode".to_string(), "hn".to_string()],
            &["1234AB".to_string(), "12".to_string()],
            1,
        );
        let mut sink = CsvSink::new(',', "lat", "lon", true);
        sink.append(&row, &location());

        let rendered = sink.render().unwrap();
        let headers: Vec<&str> = rendered.lines().next().unwrap().split(',').collect();
        assert_eq!(headers.iter().filter(|h| **h == "postcode").count(), 1);
        assert!(headers.contains(&"postcode_1"));
    }

    #[test]
    fn geojson_puts_longitude_before_latitude() {
        let mut sink = GeoJsonSink::new(false);
        sink.append(&row(), &location());

        let rendered: Value = serde_json::from_str(&sink.render().unwrap()).unwrap();
        assert_eq!(rendered["type"], "FeatureCollection");
        let features = rendered["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);

        let feature = &features[0];
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"], json!([4.9, 52.1]));
        assert_eq!(feature["properties"]["pc"], "1234AB");
        assert_eq!(feature["properties"]["hn"], "12");
        assert_eq!(feature["properties"]["x"], json!(100000.0));
        assert_eq!(feature["properties"]["y"], json!(500000.0));
    }

    #[test]
    fn geojson_merge_adds_attributes_per_feature() {
        let mut sink = GeoJsonSink::new(true);
        let mut location = location();
        location.extended_attributes = Some(HashMap::from([(
            "gemeentenaam".to_string(),
            "Utrecht".to_string(),
        )]));
        sink.append(&row(), &location);

        let rendered: Value = serde_json::from_str(&sink.render().unwrap()).unwrap();
        let properties = &rendered["features"][0]["properties"];
        assert_eq!(properties["gemeentenaam"], "Utrecht");
        // Attributes absent from the match still appear, empty.
        assert_eq!(properties["straatnaam"], "");
    }

    #[test]
    fn empty_csv_sink_renders_nothing() {
        let sink = CsvSink::new(',', "lat", "lon", false);
        assert_eq!(sink.render().unwrap(), "");
    }
}
