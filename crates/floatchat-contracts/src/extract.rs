//! Regex-chain recovery of oceanographic fields from model prose.
//!
//! Each field has an ordered list of patterns. Every pattern runs over the
//! whole text and all captures are kept, so one value is often reported
//! several times. Downstream assembly pads ragged columns instead of
//! deduplicating them.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("static extraction pattern"))
        .collect()
}

static TEMPERATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"temperature[:\s]*(-?\d+\.?\d*)\s*°?[CF]?",
        r"(-?\d+\.?\d*)\s*°?[CF]?\s*temperature",
        r"temp[:\s]*(-?\d+\.?\d*)",
        r"(-?\d+\.?\d*)\s*°?[CF]?",
        r"at\s+(-?\d+\.?\d*)\s*°?[CF]?",
        r"is\s+(-?\d+\.?\d*)\s*°?[CF]?",
        r"of\s+(-?\d+\.?\d*)\s*°?[CF]?",
        r"temperature[:\s]*(-?\d+\.?\d*)\s*°?[CF]?\s*at\s+\d+\s*m",
        r"(-?\d+\.?\d*)\s*°?[CF]?\s*at\s+\d+\s*m",
    ])
});

static SALINITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"salinity[:\s]*(\d+\.?\d*)\s*PSU?",
        r"(\d+\.?\d*)\s*PSU?\s*salinity",
        r"salinity[:\s]*(\d+\.?\d*)",
        r"(\d+\.?\d*)\s*PSU",
        r"salt[:\s]*(\d+\.?\d*)",
        r"(\d+\.?\d*)\s*ppt",
    ])
});

static DEPTH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"depth[:\s]*(\d+\.?\d*)\s*m",
        r"(\d+\.?\d*)\s*m\s*depth",
        r"depth[:\s]*(\d+\.?\d*)",
        r"(\d+\.?\d*)\s*meters?",
        r"at\s+(\d+\.?\d*)\s*m",
        r"(\d+\.?\d*)\s*metres?",
    ])
});

static LATITUDE_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"latitude[:\s]*(-?\d+\.?\d*)"]));

static LONGITUDE_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"longitude[:\s]*(-?\d+\.?\d*)"]));

// Hemisphere letters are matched case-sensitively so prose like "and" or
// "west" does not turn into a sign.
static DEGREE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?\d+\.?\d*)[°\s]*([NS])?[,\s]+(-?\d+\.?\d*)[°\s]*([EW])?")
        .expect("static degree pair pattern")
});

// Narrower than any capital F: "Float" or "FLOAT" in prose must not flip
// every temperature to Fahrenheit.
static FAHRENHEIT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:°\s*F\b|fahrenheit)|\d\s?F\b").expect("static fahrenheit pattern")
});

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("static iso date pattern"));

static US_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2})/(\d{2})/(\d{4})").expect("static us date pattern"));

static SLASHED_ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})/(\d{2})/(\d{2})").expect("static slashed date pattern"));

static MONTH_NAME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),?\s+(\d{4})",
    )
    .expect("static month name date pattern")
});

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Candidate values per field, in pattern order then text order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFields {
    pub temperatures: Vec<f64>,
    pub salinities: Vec<f64>,
    pub depths: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub dates: Vec<NaiveDateTime>,
}

impl ExtractedFields {
    /// True when at least one temperature, salinity or depth was found.
    /// Coordinates and dates alone do not make a usable table.
    pub fn has_measurements(&self) -> bool {
        !(self.temperatures.is_empty() && self.salinities.is_empty() && self.depths.is_empty())
    }

    pub fn max_len(&self) -> usize {
        [
            self.temperatures.len(),
            self.salinities.len(),
            self.depths.len(),
            self.latitudes.len(),
            self.longitudes.len(),
            self.dates.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

pub fn extract_fields(text: &str) -> ExtractedFields {
    let mut temperatures = capture_numbers(&TEMPERATURE_PATTERNS, text);
    if has_fahrenheit_marker(text) {
        for value in &mut temperatures {
            *value = fahrenheit_to_celsius(*value);
        }
    }

    ExtractedFields {
        temperatures,
        salinities: capture_numbers(&SALINITY_PATTERNS, text),
        depths: capture_numbers(&DEPTH_PATTERNS, text),
        latitudes: capture_numbers(&LATITUDE_PATTERNS, text),
        longitudes: capture_numbers(&LONGITUDE_PATTERNS, text),
        dates: extract_dates(text),
    }
}

/// The unit decision is global: one marker anywhere converts every
/// temperature candidate, including ones written in Celsius.
pub fn has_fahrenheit_marker(text: &str) -> bool {
    FAHRENHEIT_MARKER.is_match(text)
}

pub fn fahrenheit_to_celsius(value: f64) -> f64 {
    (value - 32.0) * 5.0 / 9.0
}

fn capture_numbers(patterns: &[Regex], text: &str) -> Vec<f64> {
    let mut out = Vec::new();
    for pattern in patterns {
        for captures in pattern.captures_iter(text) {
            let Some(raw) = captures.get(1) else {
                continue;
            };
            if let Ok(value) = raw.as_str().parse::<f64>() {
                out.push(value);
            }
        }
    }
    out
}

/// Dates in ISO, `MM/DD/YYYY`, `YYYY/MM/DD` and month-name order. Matches
/// that do not form a calendar date are skipped.
pub fn extract_dates(text: &str) -> Vec<NaiveDateTime> {
    let mut out = Vec::new();

    for captures in ISO_DATE.captures_iter(text) {
        push_date(&mut out, &captures[1], &captures[2], &captures[3]);
    }
    for captures in US_DATE.captures_iter(text) {
        push_date(&mut out, &captures[3], &captures[1], &captures[2]);
    }
    for captures in SLASHED_ISO_DATE.captures_iter(text) {
        push_date(&mut out, &captures[1], &captures[2], &captures[3]);
    }
    for captures in MONTH_NAME_DATE.captures_iter(text) {
        let month_name = captures[1].to_lowercase();
        let Some(index) = MONTH_NAMES.iter().position(|name| *name == month_name) else {
            continue;
        };
        let month = (index + 1).to_string();
        push_date(&mut out, &captures[3], &month, &captures[2]);
    }

    out
}

fn push_date(out: &mut Vec<NaiveDateTime>, year: &str, month: &str, day: &str) {
    if let Some(value) = calendar_date(year, month, day) {
        out.push(value);
    }
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?
        .and_hms_opt(0, 0, 0)
}

/// Coordinate mentions used to seed map clusters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinateCandidates {
    pub labeled_latitudes: Vec<f64>,
    pub labeled_longitudes: Vec<f64>,
    pub pairs: Vec<(f64, f64)>,
}

impl CoordinateCandidates {
    /// Labeled values are zipped only when their counts agree; degree pairs
    /// are always appended after them.
    pub fn anchors(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        if !self.labeled_latitudes.is_empty()
            && self.labeled_latitudes.len() == self.labeled_longitudes.len()
        {
            out.extend(
                self.labeled_latitudes
                    .iter()
                    .copied()
                    .zip(self.labeled_longitudes.iter().copied()),
            );
        }
        out.extend(self.pairs.iter().copied());
        out
    }
}

pub fn extract_coordinates(text: &str) -> CoordinateCandidates {
    let pairs = DEGREE_PAIR
        .captures_iter(text)
        .filter_map(|captures| {
            let lat = captures[1].parse::<f64>().ok()?;
            let lon = captures[3].parse::<f64>().ok()?;
            let lat = apply_hemisphere(lat, captures.get(2).map(|m| m.as_str()));
            let lon = apply_hemisphere(lon, captures.get(4).map(|m| m.as_str()));
            Some((lat, lon))
        })
        .collect();

    CoordinateCandidates {
        labeled_latitudes: capture_numbers(&LATITUDE_PATTERNS, text),
        labeled_longitudes: capture_numbers(&LONGITUDE_PATTERNS, text),
        pairs,
    }
}

fn apply_hemisphere(value: f64, hemisphere: Option<&str>) -> f64 {
    match hemisphere {
        Some("S") | Some("W") => -value.abs(),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_coordinates, extract_dates, extract_fields, has_fahrenheit_marker};
    use chrono::NaiveDate;

    const SAMPLE: &str = "Temperature: 15.2°C at 100m depth, Salinity: 35.1 PSU, Latitude: 40.5, Longitude: -120.3, Date: 2023-01-01";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn labeled_sample_yields_every_field() {
        let fields = extract_fields(SAMPLE);

        assert!(close(fields.temperatures[0], 15.2));
        assert!(fields.salinities.iter().all(|value| close(*value, 35.1)));
        assert!(!fields.salinities.is_empty());
        assert!(fields.depths.iter().all(|value| close(*value, 100.0)));
        assert!(!fields.depths.is_empty());
        assert_eq!(fields.latitudes, vec![40.5]);
        assert_eq!(fields.longitudes, vec![-120.3]);

        let expected = NaiveDate::from_ymd_opt(2023, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(fields.dates, vec![expected]);
        assert!(fields.has_measurements());
    }

    #[test]
    fn overlapping_patterns_are_not_deduplicated() {
        let fields = extract_fields("Salinity: 35.1 PSU");
        // label+unit, label only and bare unit all capture the same value
        assert_eq!(fields.salinities, vec![35.1, 35.1, 35.1]);
    }

    #[test]
    fn fahrenheit_marker_converts_every_candidate() {
        let fields = extract_fields("Surface temperature: 98.6°F");
        assert!(!fields.temperatures.is_empty());
        assert!(fields
            .temperatures
            .iter()
            .all(|value| (value - 37.0).abs() < 0.01));
    }

    #[test]
    fn fahrenheit_marker_forms() {
        assert!(has_fahrenheit_marker("it was 70F outside"));
        assert!(has_fahrenheit_marker("measured in Fahrenheit"));
        assert!(has_fahrenheit_marker("about 50 °F"));
        assert!(!has_fahrenheit_marker("Temperature: 15.2°C near Florida"));
        assert!(!has_fahrenheit_marker("Float 5906 (ARGO FLOAT) reports 15.2°C"));
    }

    #[test]
    fn empty_text_extracts_nothing() {
        let fields = extract_fields("");
        assert_eq!(fields.max_len(), 0);
        assert!(!fields.has_measurements());
    }

    #[test]
    fn coordinates_alone_are_not_measurements() {
        let fields = extract_fields("latitude: 12.5 longitude: 44.0");
        assert_eq!(fields.latitudes, vec![12.5]);
        // the bare temperature pattern still picks the numbers up
        assert!(fields.has_measurements());

        let fields = extract_fields("Latitude and longitude unknown");
        assert!(!fields.has_measurements());
    }

    #[test]
    fn date_forms_are_tried_in_order_and_invalid_ones_skipped() {
        let dates = extract_dates("On 03/15/2022, then 2021/07/04, then March 5, 2020 and 2023-02-30");
        let ymd: Vec<_> = dates.iter().map(|value| value.date()).collect();
        assert_eq!(
            ymd,
            vec![
                NaiveDate::from_ymd_opt(2022, 3, 15).expect("date"),
                NaiveDate::from_ymd_opt(2021, 7, 4).expect("date"),
                NaiveDate::from_ymd_opt(2020, 3, 5).expect("date"),
            ]
        );
    }

    #[test]
    fn degree_pairs_honour_hemispheres() {
        let coords = extract_coordinates("Float near 40.5°N, 120.3°W today");
        assert_eq!(coords.pairs, vec![(40.5, -120.3)]);
        assert_eq!(coords.anchors(), vec![(40.5, -120.3)]);
    }

    #[test]
    fn labeled_coordinates_zip_only_when_counts_agree() {
        let coords = extract_coordinates("latitude: 35.5, longitude: -120.3; latitude: 10.0");
        assert_eq!(coords.labeled_latitudes, vec![35.5, 10.0]);
        assert_eq!(coords.labeled_longitudes, vec![-120.3]);
        assert!(coords.anchors().is_empty());

        let coords = extract_coordinates("latitude: 35.5 and longitude: -120.3");
        assert_eq!(coords.anchors(), vec![(35.5, -120.3)]);
    }
}
