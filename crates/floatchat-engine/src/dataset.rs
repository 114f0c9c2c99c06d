//! Turns model text into a table, falling back to live and then synthetic
//! data when the text holds nothing usable.

use chrono::NaiveDateTime;
use floatchat_contracts::extract::{extract_fields, ExtractedFields};
use floatchat_contracts::records::{FloatLocationRecord, ObservationRecord};
use floatchat_contracts::regions::Region;
use log::{debug, info, warn};
use serde::Serialize;

use crate::erddap::{OceanDataSource, LOCATION_WINDOW_DAYS, OBSERVATION_WINDOW_DAYS};
use crate::synthetic::{sample_observations, synthesize_float_locations, SYNTHETIC_SEED};

pub const DEFAULT_TEMPERATURE: f64 = 15.0;
pub const DEFAULT_SALINITY: f64 = 35.0;
pub const DEFAULT_DEPTH: f64 = 1000.0;
pub const DEFAULT_LATITUDE: f64 = 0.0;
pub const DEFAULT_LONGITUDE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    ModelText,
    LiveFetch,
    Synthetic,
}

impl DataOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelText => "model_text",
            Self::LiveFetch => "live_fetch",
            Self::Synthetic => "synthetic",
        }
    }
}

/// Extracted columns right-padded with `None` to the longest field. Real
/// values are never truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedColumns {
    pub temperature: Vec<Option<f64>>,
    pub salinity: Vec<Option<f64>>,
    pub depth: Vec<Option<f64>>,
    pub latitude: Vec<Option<f64>>,
    pub longitude: Vec<Option<f64>>,
    pub date: Vec<Option<NaiveDateTime>>,
}

fn pad<T: Clone>(values: &[T], len: usize) -> Vec<Option<T>> {
    let mut out: Vec<Option<T>> = values.iter().cloned().map(Some).collect();
    out.resize(len, None);
    out
}

/// Entirely-null columns take the default; otherwise gaps take the mean of
/// the known values.
fn fill_column(column: &[Option<f64>], default: f64) -> Vec<f64> {
    let known: Vec<f64> = column.iter().flatten().copied().collect();
    if known.is_empty() {
        return vec![default; column.len()];
    }
    let mean = known.iter().sum::<f64>() / known.len() as f64;
    column.iter().map(|value| value.unwrap_or(mean)).collect()
}

impl PaddedColumns {
    /// `now` stands in for every date when the text carried none at all.
    pub fn from_fields(fields: &ExtractedFields, now: NaiveDateTime) -> Self {
        let len = fields.max_len();
        let date = if fields.dates.is_empty() {
            vec![Some(now); len]
        } else {
            pad(&fields.dates, len)
        };
        Self {
            temperature: pad(&fields.temperatures, len),
            salinity: pad(&fields.salinities, len),
            depth: pad(&fields.depths, len),
            latitude: pad(&fields.latitudes, len),
            longitude: pad(&fields.longitudes, len),
            date,
        }
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    pub fn fill(&self) -> Vec<ObservationRecord> {
        let temperature = fill_column(&self.temperature, DEFAULT_TEMPERATURE);
        let salinity = fill_column(&self.salinity, DEFAULT_SALINITY);
        let depth = fill_column(&self.depth, DEFAULT_DEPTH);
        let latitude = fill_column(&self.latitude, DEFAULT_LATITUDE);
        let longitude = fill_column(&self.longitude, DEFAULT_LONGITUDE);

        (0..self.len())
            .map(|idx| ObservationRecord {
                temperature: Some(temperature[idx]),
                salinity: Some(salinity[idx]),
                depth: Some(depth[idx]),
                latitude: Some(latitude[idx]),
                longitude: Some(longitude[idx]),
                date: self.date[idx],
            })
            .collect()
    }
}

/// Table built from model text, or `None` when no temperature, salinity or
/// depth was found.
pub fn rows_from_text(text: &str, now: NaiveDateTime) -> Option<Vec<ObservationRecord>> {
    let fields = extract_fields(text);
    debug!(
        "extracted temperature={} salinity={} depth={} latitude={} longitude={} date={}",
        fields.temperatures.len(),
        fields.salinities.len(),
        fields.depths.len(),
        fields.latitudes.len(),
        fields.longitudes.len(),
        fields.dates.len()
    );
    if !fields.has_measurements() {
        return None;
    }
    Some(PaddedColumns::from_fields(&fields, now).fill())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembled<T> {
    pub rows: Vec<T>,
    pub origin: DataOrigin,
}

type Attempt<'a, T> = Box<dyn FnOnce() -> Option<Vec<T>> + 'a>;

/// Runs tiers in order; the first non-empty result wins.
fn first_available<T>(tiers: Vec<(DataOrigin, Attempt<'_, T>)>) -> Option<Assembled<T>> {
    for (origin, attempt) in tiers {
        match attempt() {
            Some(rows) if !rows.is_empty() => {
                info!("using {} rows from {}", rows.len(), origin.as_str());
                return Some(Assembled { rows, origin });
            }
            _ => debug!("{} tier produced no rows", origin.as_str()),
        }
    }
    None
}

pub struct DataAssembler<'a> {
    source: &'a dyn OceanDataSource,
    synthetic_fallback: bool,
}

impl<'a> DataAssembler<'a> {
    pub fn new(source: &'a dyn OceanDataSource, synthetic_fallback: bool) -> Self {
        Self {
            source,
            synthetic_fallback,
        }
    }

    pub fn chart_rows(
        &self,
        model_text: &str,
        now: NaiveDateTime,
    ) -> Option<Assembled<ObservationRecord>> {
        let region = Region::detect(model_text);
        let mut tiers: Vec<(DataOrigin, Attempt<'_, ObservationRecord>)> = vec![
            (
                DataOrigin::ModelText,
                Box::new(move || rows_from_text(model_text, now)),
            ),
            (
                DataOrigin::LiveFetch,
                Box::new(move || {
                    self.source
                        .fetch_observations(region, OBSERVATION_WINDOW_DAYS)
                        .map_err(|err| warn!("{} observation fetch failed: {err:#}", self.source.name()))
                        .ok()
                }),
            ),
        ];
        if self.synthetic_fallback {
            tiers.push((
                DataOrigin::Synthetic,
                Box::new(|| Some(sample_observations(SYNTHETIC_SEED))),
            ));
        }
        first_available(tiers)
    }

    pub fn map_rows(&self, model_text: &str) -> Option<Assembled<FloatLocationRecord>> {
        let region = Region::detect(model_text);
        let mut tiers: Vec<(DataOrigin, Attempt<'_, FloatLocationRecord>)> = vec![(
            DataOrigin::LiveFetch,
            Box::new(move || {
                self.source
                    .fetch_float_locations(region, LOCATION_WINDOW_DAYS)
                    .map_err(|err| warn!("{} location fetch failed: {err:#}", self.source.name()))
                    .ok()
            }),
        )];
        if self.synthetic_fallback {
            tiers.push((
                DataOrigin::Synthetic,
                Box::new(move || Some(synthesize_float_locations(model_text, SYNTHETIC_SEED))),
            ));
        }
        first_available(tiers)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use floatchat_contracts::extract::ExtractedFields;
    use floatchat_contracts::records::{FloatLocationRecord, ObservationRecord};
    use floatchat_contracts::regions::Region;

    use super::{rows_from_text, DataAssembler, DataOrigin, PaddedColumns, DEFAULT_DEPTH};
    use crate::erddap::{OceanDataSource, OfflineSource};
    use crate::synthetic::midnight;

    struct RecordingSource {
        regions: Mutex<Vec<Option<Region>>>,
        observations: Vec<ObservationRecord>,
    }

    impl OceanDataSource for RecordingSource {
        fn name(&self) -> &str {
            "recording"
        }

        fn fetch_observations(
            &self,
            region: Option<Region>,
            _days_back: i64,
        ) -> Result<Vec<ObservationRecord>> {
            if let Ok(mut seen) = self.regions.lock() {
                seen.push(region);
            }
            Ok(self.observations.clone())
        }

        fn fetch_float_locations(
            &self,
            _region: Option<Region>,
            _days_back: i64,
        ) -> Result<Vec<FloatLocationRecord>> {
            bail!("timed out")
        }
    }

    fn fields() -> ExtractedFields {
        ExtractedFields {
            temperatures: vec![10.0, 20.0, 30.0],
            salinities: vec![34.0],
            depths: Vec::new(),
            latitudes: vec![1.0, 2.0],
            longitudes: Vec::new(),
            dates: Vec::new(),
        }
    }

    #[test]
    fn padding_matches_longest_field() {
        let now = midnight(2024, 6, 1);
        let padded = PaddedColumns::from_fields(&fields(), now);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded.salinity, vec![Some(34.0), None, None]);
        assert_eq!(padded.depth, vec![None, None, None]);
        assert_eq!(padded.temperature, vec![Some(10.0), Some(20.0), Some(30.0)]);
        assert_eq!(padded.date, vec![Some(now); 3]);
    }

    #[test]
    fn fill_uses_column_mean_or_documented_default() {
        let rows = PaddedColumns::from_fields(&fields(), midnight(2024, 6, 1)).fill();
        assert_eq!(rows.len(), 3);
        // partially null: own mean
        assert_eq!(rows[2].salinity, Some(34.0));
        assert_eq!(rows[2].latitude, Some(1.5));
        // entirely null: fixed default, never zero for depth
        assert!(rows.iter().all(|row| row.depth == Some(DEFAULT_DEPTH)));
        assert!(rows.iter().all(|row| row.longitude == Some(0.0)));
    }

    #[test]
    fn partial_dates_are_padded_not_replaced() {
        let mut sparse = fields();
        sparse.dates = vec![midnight(2023, 1, 1)];
        let rows = PaddedColumns::from_fields(&sparse, midnight(2024, 6, 1)).fill();
        assert_eq!(rows[0].date, Some(midnight(2023, 1, 1)));
        assert_eq!(rows[1].date, None);
    }

    #[test]
    fn text_without_measurements_yields_nothing() {
        assert!(rows_from_text("Latitude and longitude only", midnight(2024, 1, 1)).is_none());
    }

    #[test]
    fn chart_tiers_prefer_model_text() {
        let source = RecordingSource {
            regions: Mutex::new(Vec::new()),
            observations: Vec::new(),
        };
        let assembler = DataAssembler::new(&source, true);
        let assembled = assembler
            .chart_rows("Temperature: 4.5°C at 900m depth", midnight(2024, 1, 1))
            .expect("rows");
        assert_eq!(assembled.origin, DataOrigin::ModelText);
        assert!(source.regions.lock().map(|seen| seen.is_empty()).unwrap_or(false));
    }

    #[test]
    fn empty_live_fetch_falls_to_synthetic_with_region_from_text() {
        let source = RecordingSource {
            regions: Mutex::new(Vec::new()),
            observations: Vec::new(),
        };
        let assembled = DataAssembler::new(&source, true)
            .chart_rows("The Atlantic is large", midnight(2024, 1, 1))
            .expect("rows");
        assert_eq!(assembled.origin, DataOrigin::Synthetic);
        assert_eq!(assembled.rows.len(), 100);
        let seen = source.regions.lock().map(|seen| seen.clone()).unwrap_or_default();
        assert_eq!(seen, vec![Some(Region::Atlantic)]);
    }

    #[test]
    fn live_rows_win_over_synthetic() {
        let source = RecordingSource {
            regions: Mutex::new(Vec::new()),
            observations: vec![ObservationRecord {
                temperature: Some(3.0),
                ..ObservationRecord::default()
            }],
        };
        let assembled = DataAssembler::new(&source, true)
            .chart_rows("no numbers here", midnight(2024, 1, 1))
            .expect("rows");
        assert_eq!(assembled.origin, DataOrigin::LiveFetch);
        assert_eq!(assembled.rows.len(), 1);
    }

    #[test]
    fn disabling_synthetic_leaves_map_without_rows() {
        let assembler = DataAssembler::new(&OfflineSource, false);
        assert!(assembler.map_rows("Pacific floats").is_none());
        assert!(assembler
            .chart_rows("no numbers here", midnight(2024, 1, 1))
            .is_none());

        let assembled = DataAssembler::new(&OfflineSource, true)
            .map_rows("Pacific floats")
            .expect("rows");
        assert_eq!(assembled.origin, DataOrigin::Synthetic);
        assert_eq!(assembled.rows.len(), 30);
    }
}
