//! Seeded generators behind the last fallback tier. The same seed and input
//! always produce the same rows.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use floatchat_contracts::extract::extract_coordinates;
use floatchat_contracts::records::{FloatLocationRecord, FloatStatus, ObservationRecord};
use floatchat_contracts::regions::named_anchors;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub const SYNTHETIC_SEED: u64 = 42;
const SAMPLE_ROWS: usize = 100;
const ANCHOR_POINTS: usize = 30;
const GLOBAL_POINTS: usize = 50;
const MAX_COORDINATE_POINTS: usize = 30;
const JITTER_DEGREES: f64 = 2.0;

pub(crate) fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub(crate) fn gaussian(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std_dev * z
}

fn gaussian_column(rng: &mut StdRng, n: usize, mean: f64, std_dev: f64) -> Vec<f64> {
    (0..n).map(|_| gaussian(rng, mean, std_dev)).collect()
}

fn uniform_column(rng: &mut StdRng, n: usize, low: f64, high: f64) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(low..high)).collect()
}

/// 100 observations spread over the ice-free ocean with one row per day
/// from 2023-01-01.
pub fn sample_observations(seed: u64) -> Vec<ObservationRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let latitudes = uniform_column(&mut rng, SAMPLE_ROWS, -60.0, 60.0);
    let longitudes = uniform_column(&mut rng, SAMPLE_ROWS, -180.0, 180.0);
    let temperatures = gaussian_column(&mut rng, SAMPLE_ROWS, 15.0, 10.0);
    let salinities = gaussian_column(&mut rng, SAMPLE_ROWS, 35.0, 2.0);
    let depths = uniform_column(&mut rng, SAMPLE_ROWS, 0.0, 2000.0);
    let start = midnight(2023, 1, 1);

    (0..SAMPLE_ROWS)
        .map(|idx| ObservationRecord {
            temperature: Some(temperatures[idx]),
            salinity: Some(salinities[idx]),
            depth: Some(depths[idx]),
            latitude: Some(latitudes[idx]),
            longitude: Some(longitudes[idx]),
            date: Some(start + Duration::days(idx as i64)),
        })
        .collect()
}

/// Stand-in measurements for live rows that arrive without them.
pub(crate) struct PlaceholderMeasurements {
    rng: StdRng,
}

impl PlaceholderMeasurements {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn temperature(&mut self) -> f64 {
        gaussian(&mut self.rng, 15.0, 5.0)
    }

    pub(crate) fn salinity(&mut self) -> f64 {
        gaussian(&mut self.rng, 35.0, 2.0)
    }

    pub(crate) fn depth(&mut self) -> f64 {
        self.rng.gen_range(0.0..2000.0)
    }
}

/// Float positions seeded from what the model text mentions: explicit
/// coordinates first, then named basins and countries, then a uniform
/// global spread.
pub fn synthesize_float_locations(text: &str, seed: u64) -> Vec<FloatLocationRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let coordinates = extract_coordinates(text).anchors();
    let anchors = named_anchors(text);

    let positions = if !coordinates.is_empty() {
        scatter_around_coordinates(&mut rng, &coordinates)
    } else if !anchors.is_empty() {
        scatter_around_anchors(&mut rng, &anchors)
    } else {
        let lats = uniform_column(&mut rng, GLOBAL_POINTS, -60.0, 60.0);
        let lons = uniform_column(&mut rng, GLOBAL_POINTS, -180.0, 180.0);
        lats.into_iter().zip(lons).collect()
    };

    float_records(&mut rng, positions)
}

fn scatter_around_coordinates(rng: &mut StdRng, coordinates: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let n_points = MAX_COORDINATE_POINTS.min(coordinates.len() * 3);
    let per_anchor = (n_points / coordinates.len()).max(3);
    let mut out = Vec::with_capacity(per_anchor * coordinates.len());
    for (base_lat, base_lon) in coordinates {
        let lats = gaussian_column(rng, per_anchor, *base_lat, JITTER_DEGREES);
        let lons = gaussian_column(rng, per_anchor, *base_lon, JITTER_DEGREES);
        out.extend(lats.into_iter().zip(lons));
    }
    out.truncate(n_points);
    out
}

/// Latitudes and longitudes are drawn from the anchors independently, so a
/// point may pair one anchor's latitude with another's longitude.
fn scatter_around_anchors(rng: &mut StdRng, anchors: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let anchor_lats: Vec<f64> = anchors.iter().map(|anchor| anchor.0).collect();
    let anchor_lons: Vec<f64> = anchors.iter().map(|anchor| anchor.1).collect();
    let lats = jittered_picks(rng, &anchor_lats);
    let lons = jittered_picks(rng, &anchor_lons);
    lats.into_iter().zip(lons).collect()
}

fn jittered_picks(rng: &mut StdRng, values: &[f64]) -> Vec<f64> {
    (0..ANCHOR_POINTS)
        .map(|_| {
            let picked = values[rng.gen_range(0..values.len())];
            picked + gaussian(rng, 0.0, JITTER_DEGREES)
        })
        .collect()
}

fn weighted_status(rng: &mut StdRng) -> FloatStatus {
    let roll: f64 = rng.gen();
    if roll < 0.6 {
        FloatStatus::Active
    } else if roll < 0.9 {
        FloatStatus::Drifting
    } else {
        FloatStatus::Parked
    }
}

fn float_records(rng: &mut StdRng, positions: Vec<(f64, f64)>) -> Vec<FloatLocationRecord> {
    let first_deployment = midnight(2020, 1, 1);
    positions
        .into_iter()
        .enumerate()
        .map(|(idx, (latitude, longitude))| FloatLocationRecord {
            float_id: format!("ARGO_{idx:06}"),
            deployment_date: first_deployment + Duration::days(30 * idx as i64),
            observation: ObservationRecord {
                temperature: Some(gaussian(rng, 15.0, 10.0)),
                salinity: Some(gaussian(rng, 35.0, 2.0)),
                depth: Some(rng.gen_range(0.0..2000.0)),
                latitude: Some(latitude),
                longitude: Some(longitude),
                date: None,
            },
            status: weighted_status(rng),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{
        midnight, sample_observations, scatter_around_anchors, synthesize_float_locations,
        SYNTHETIC_SEED,
    };

    #[test]
    fn sample_observations_are_reproducible() {
        let first = sample_observations(SYNTHETIC_SEED);
        let second = sample_observations(SYNTHETIC_SEED);
        assert_eq!(first.len(), 100);
        assert_eq!(first, second);
        assert_ne!(first, sample_observations(7));
    }

    #[test]
    fn sample_observations_respect_bounds_and_dates() {
        let rows = sample_observations(SYNTHETIC_SEED);
        for row in &rows {
            let lat = row.latitude.unwrap_or_default();
            let depth = row.depth.unwrap_or(-1.0);
            assert!((-60.0..60.0).contains(&lat));
            assert!((0.0..2000.0).contains(&depth));
        }
        assert_eq!(rows[0].date, Some(midnight(2023, 1, 1)));
        assert_eq!(rows[31].date, Some(midnight(2023, 2, 1)));
    }

    #[test]
    fn explicit_coordinates_bound_point_count() {
        let rows = synthesize_float_locations("latitude: 35.5, longitude: -120.3", SYNTHETIC_SEED);
        // one anchor -> min(30, 3) points
        assert_eq!(rows.len(), 3);
        for row in &rows {
            let lat = row.latitude().unwrap_or_default();
            assert!((lat - 35.5).abs() < 15.0);
        }
    }

    #[test]
    fn named_regions_yield_thirty_points() {
        let rows = synthesize_float_locations("Floats across the Indian Ocean", SYNTHETIC_SEED);
        assert_eq!(rows.len(), 30);
        assert_eq!(rows[0].float_id, "ARGO_000000");
        assert_eq!(rows[1].deployment_date, midnight(2020, 1, 31));
    }

    #[test]
    fn anchor_latitude_and_longitude_are_drawn_separately() {
        let mut rng = StdRng::seed_from_u64(SYNTHETIC_SEED);
        let points = scatter_around_anchors(&mut rng, &[(0.0, 0.0), (50.0, 100.0)]);
        assert_eq!(points.len(), 30);
        let mixed = points
            .iter()
            .filter(|(lat, lon)| (lat.abs() < 15.0) != (lon.abs() < 50.0))
            .count();
        assert!(mixed > 0);
    }

    #[test]
    fn unmatched_text_spreads_fifty_points() {
        let first = synthesize_float_locations("nothing useful here", SYNTHETIC_SEED);
        let second = synthesize_float_locations("nothing useful here", SYNTHETIC_SEED);
        assert_eq!(first.len(), 50);
        assert_eq!(first, second);
    }
}
