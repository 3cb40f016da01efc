use crate::error::{GeocoderError, Result};
use tracing::info;

/// Column names recognised as holding a zip code.
pub const ZIP_CODE_NAMES: &[&str] = &["zip", "pc", "pc6", "postal"];

/// Column names recognised as holding a house number.
pub const HOUSE_NUMBER_NAMES: &[&str] = &["hn", "huisnummer", "house_number", "number", "nmbr"];

/// The input columns selected to drive the address lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    pub zip: String,
    pub housenumber: String,
}

/// Picks the zip and house-number columns for a run.
///
/// Explicit names are used unconditionally, without checking that the column
/// exists; a wrong name surfaces later as empty-value skips, not as a hard
/// failure here. Without an override, the first column (in input order)
/// matching the known alias lists wins.
pub fn resolve(
    columns: &[String],
    explicit_zip: Option<&str>,
    explicit_housenumber: Option<&str>,
) -> Result<ResolvedFields> {
    let zip = match explicit_zip {
        Some(name) => name.to_string(),
        None => find_alias(columns, ZIP_CODE_NAMES)
            .ok_or_else(|| GeocoderError::UnresolvableField("zip code".to_string()))?,
    };
    let housenumber = match explicit_housenumber {
        Some(name) => name.to_string(),
        None => find_alias(columns, HOUSE_NUMBER_NAMES)
            .ok_or_else(|| GeocoderError::UnresolvableField("house number".to_string()))?,
    };

    info!(
        "Using {} for the house number and {} as the zip code field",
        housenumber, zip
    );
    println!("Using {housenumber} for the house number and {zip} as the zip code field.");

    Ok(ResolvedFields { zip, housenumber })
}

fn find_alias(columns: &[String], aliases: &[&str]) -> Option<String> {
    columns
        .iter()
        .find(|column| aliases.contains(&column.as_str()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn auto_detects_known_aliases() {
        let resolved = resolve(&columns(&["postal", "house_number"]), None, None).unwrap();
        assert_eq!(resolved.zip, "postal");
        assert_eq!(resolved.housenumber, "house_number");
    }

    #[test]
    fn first_matching_column_wins() {
        let resolved = resolve(&columns(&["pc6", "zip", "hn", "number"]), None, None).unwrap();
        assert_eq!(resolved.zip, "pc6");
        assert_eq!(resolved.housenumber, "hn");
    }

    #[test]
    fn explicit_names_bypass_detection() {
        let resolved = resolve(&columns(&["foo", "bar"]), Some("foo"), Some("bar")).unwrap();
        assert_eq!(resolved.zip, "foo");
        assert_eq!(resolved.housenumber, "bar");
    }

    #[test]
    fn explicit_names_are_not_validated_against_columns() {
        let resolved = resolve(&columns(&["pc", "hn"]), Some("nope"), None).unwrap();
        assert_eq!(resolved.zip, "nope");
        assert_eq!(resolved.housenumber, "hn");
    }

    #[test]
    fn fails_when_no_alias_matches() {
        let err = resolve(&columns(&["foo", "bar"]), None, None).unwrap_err();
        assert!(matches!(err, GeocoderError::UnresolvableField(_)));
    }
}
