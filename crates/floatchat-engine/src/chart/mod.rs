//! Chart selection and layout.
//!
//! A query picks one [`ChartKind`]; the kind decides which fields land on
//! which axis, how the rows are cleaned, and how the title is worded. The
//! resulting [`ChartPlan`] is pure data and is drawn by [`draw`].

mod draw;
mod title;

use anyhow::Result;
use chrono::NaiveDateTime;
use floatchat_contracts::records::ObservationRecord;
use serde::Serialize;

use crate::artifact::RenderedArtifact;
use crate::config::ChartFormat;

pub use draw::{CANVAS_HEIGHT, CANVAS_WIDTH};
pub use title::chart_title;

pub const HISTOGRAM_BINS: usize = 25;
pub const EMPTY_TITLE: &str = "No Data Available";
pub const EMPTY_MESSAGE: &str = "No data available for visualization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    TemperatureDepth,
    SalinityDepth,
    TemperatureSalinity,
    TimeSeries,
    Histogram,
    Geographic,
    Default,
}

impl ChartKind {
    /// First matching rule wins.
    pub fn select(query: &str) -> Self {
        let lower = query.to_lowercase();
        let has = |word: &str| lower.contains(word);
        if has("temperature") && has("depth") {
            Self::TemperatureDepth
        } else if has("salinity") && has("depth") {
            Self::SalinityDepth
        } else if has("temperature") && has("salinity") {
            Self::TemperatureSalinity
        } else if has("time") || has("trend") {
            Self::TimeSeries
        } else if has("distribution") || has("histogram") {
            Self::Histogram
        } else if has("map") || has("location") {
            Self::Geographic
        } else {
            Self::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TemperatureDepth => "temperature_depth",
            Self::SalinityDepth => "salinity_depth",
            Self::TemperatureSalinity => "temperature_salinity",
            Self::TimeSeries => "time_series",
            Self::Histogram => "histogram",
            Self::Geographic => "geographic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Salinity,
    Depth,
    Latitude,
    Longitude,
}

impl Field {
    pub fn value(&self, row: &ObservationRecord) -> Option<f64> {
        match self {
            Self::Temperature => row.temperature,
            Self::Salinity => row.salinity,
            Self::Depth => row.depth,
            Self::Latitude => row.latitude,
            Self::Longitude => row.longitude,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature (°C)",
            Self::Salinity => "Salinity (PSU)",
            Self::Depth => "Depth (m)",
            Self::Latitude => "Latitude",
            Self::Longitude => "Longitude",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Blues,
    Viridis,
    Coolwarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Least-squares line over the row index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn fit(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let count = n as f64;
        let mean_x = (count - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / count;
        let (mut covariance, mut variance) = (0.0, 0.0);
        for (index, value) in values.iter().enumerate() {
            let dx = index as f64 - mean_x;
            covariance += dx * (value - mean_y);
            variance += dx * dx;
        }
        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Marks {
    /// Connected line with a marker at each point.
    Profile {
        points: Vec<(f64, f64)>,
        color: (u8, u8, u8),
    },
    /// Points shaded by a third value.
    Scatter {
        points: Vec<(f64, f64, f64)>,
        palette: Palette,
        color_label: &'static str,
    },
    /// `x` is days since `origin`; the trend is evaluated per point index.
    Series {
        origin: NaiveDateTime,
        points: Vec<(f64, f64)>,
        trend: Option<TrendLine>,
    },
    Histogram { bins: Vec<HistogramBin> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartPlan {
    Empty,
    Figure {
        kind: ChartKind,
        title: String,
        x_label: &'static str,
        y_label: &'static str,
        /// Axis carrying depth, drawn with shallow values toward the origin
        /// of reading (top or right).
        inverted: Option<Axis>,
        marks: Marks,
    },
}

const LINE_BLUE: (u8, u8, u8) = (0x1f, 0x77, 0xb4);
const PROFILE_RED: (u8, u8, u8) = (0xe6, 0x39, 0x46);

/// Rows where both fields are known, sorted by the first.
fn pairs(rows: &[ObservationRecord], x: Field, y: Field) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((x.value(row)?, y.value(row)?)))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

fn triples(rows: &[ObservationRecord], x: Field, y: Field, shade: Field) -> Vec<(f64, f64, f64)> {
    let mut points: Vec<(f64, f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((x.value(row)?, y.value(row)?, shade.value(row)?)))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (high - low) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in values {
        let slot = ((value - low) / width).floor() as usize;
        counts[slot.min(bins - 1)] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            start: low + width * index as f64,
            end: low + width * (index + 1) as f64,
            count,
        })
        .collect()
}

fn time_series(rows: &[ObservationRecord]) -> Marks {
    let mut dated: Vec<(NaiveDateTime, f64)> = rows
        .iter()
        .filter_map(|row| Some((row.date?, row.temperature?)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    let origin = dated.first().map(|(date, _)| *date).unwrap_or_default();
    let temperatures: Vec<f64> = dated.iter().map(|(_, value)| *value).collect();
    let points = dated
        .iter()
        .map(|(date, value)| {
            let days = (*date - origin).num_seconds() as f64 / 86_400.0;
            (days, *value)
        })
        .collect();
    Marks::Series {
        origin,
        points,
        trend: TrendLine::fit(&temperatures),
    }
}

impl ChartPlan {
    pub fn build(query: &str, rows: &[ObservationRecord]) -> Self {
        if rows.is_empty() {
            return Self::Empty;
        }
        let kind = ChartKind::select(query);
        let (x_label, y_label, inverted, marks) = match kind {
            ChartKind::TemperatureDepth => (
                Field::Temperature.label(),
                Field::Depth.label(),
                Some(Axis::Y),
                Marks::Profile {
                    points: pairs(rows, Field::Temperature, Field::Depth),
                    color: LINE_BLUE,
                },
            ),
            ChartKind::SalinityDepth => (
                Field::Salinity.label(),
                Field::Depth.label(),
                Some(Axis::Y),
                Marks::Scatter {
                    points: triples(rows, Field::Salinity, Field::Depth, Field::Salinity),
                    palette: Palette::Blues,
                    color_label: Field::Salinity.label(),
                },
            ),
            ChartKind::TemperatureSalinity => (
                Field::Salinity.label(),
                Field::Temperature.label(),
                None,
                Marks::Scatter {
                    points: triples(rows, Field::Salinity, Field::Temperature, Field::Depth),
                    palette: Palette::Viridis,
                    color_label: Field::Depth.label(),
                },
            ),
            ChartKind::TimeSeries => ("Date", Field::Temperature.label(), None, time_series(rows)),
            ChartKind::Histogram => {
                let values: Vec<f64> = rows.iter().filter_map(|row| row.temperature).collect();
                (
                    Field::Temperature.label(),
                    "Frequency",
                    None,
                    Marks::Histogram {
                        bins: histogram(&values, HISTOGRAM_BINS),
                    },
                )
            }
            ChartKind::Geographic => (
                Field::Longitude.label(),
                Field::Latitude.label(),
                None,
                Marks::Scatter {
                    points: triples(rows, Field::Longitude, Field::Latitude, Field::Temperature),
                    palette: Palette::Coolwarm,
                    color_label: Field::Temperature.label(),
                },
            ),
            ChartKind::Default => (
                Field::Depth.label(),
                Field::Temperature.label(),
                Some(Axis::X),
                Marks::Profile {
                    points: pairs(rows, Field::Depth, Field::Temperature),
                    color: PROFILE_RED,
                },
            ),
        };
        Self::Figure {
            kind,
            title: chart_title(query, kind),
            x_label,
            y_label,
            inverted,
            marks,
        }
    }

    pub fn kind(&self) -> Option<ChartKind> {
        match self {
            Self::Empty => None,
            Self::Figure { kind, .. } => Some(*kind),
        }
    }
}

/// Selects a chart for `query` and rasterizes it. An empty table yields the
/// placeholder figure.
pub fn render_chart(
    query: &str,
    rows: &[ObservationRecord],
    format: ChartFormat,
) -> Result<RenderedArtifact> {
    let plan = ChartPlan::build(query, rows);
    let bytes = match format {
        ChartFormat::Png => draw::render_png(&plan)?,
        ChartFormat::Svg => draw::render_svg(&plan)?,
    };
    Ok(RenderedArtifact::chart(format, &bytes))
}
