use std::io::Cursor;
use std::ops::Range;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDateTime};
use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};

use super::{Axis, ChartPlan, HistogramBin, Marks, Palette, EMPTY_MESSAGE, EMPTY_TITLE};

pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 750;

const FONT: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
// Text drawing on either backend needs a registered font.
static FONT_REGISTERED: Lazy<Result<(), String>> = Lazy::new(|| {
    register_font(FONT, FontStyle::Normal, FONT_BYTES)
        .map_err(|_| "bundled chart font could not be parsed".to_string())
});
const BACKGROUND: RGBColor = RGBColor(0xf8, 0xf9, 0xfa);
const MUTED: RGBColor = RGBColor(0x66, 0x66, 0x66);
const SERIES_BLUE: RGBColor = RGBColor(0x2e, 0x86, 0xab);
const NAVY: RGBColor = RGBColor(0x00, 0x00, 0x80);

const BLUES: &[(u8, u8, u8)] = &[
    (247, 251, 255),
    (198, 219, 239),
    (107, 174, 214),
    (33, 113, 181),
    (8, 48, 107),
];
const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];
const COOLWARM: &[(u8, u8, u8)] = &[
    (59, 76, 192),
    (141, 176, 254),
    (221, 221, 221),
    (244, 154, 123),
    (180, 4, 38),
];

impl Palette {
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Blues => BLUES,
            Self::Viridis => VIRIDIS,
            Self::Coolwarm => COOLWARM,
        }
    }

    /// Linear interpolation between stops; `t` is clamped to `[0, 1]`.
    pub(super) fn color(&self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (stops.len() - 1) as f64;
        let index = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - index as f64;
        let (from, to) = (stops[index], stops[index + 1]);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
        RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
    }
}

fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((low, high)) => Some((low.min(value), high.max(value))),
    })
}

/// Data extent widened by 5% on each side. Degenerate extents widen by one
/// unit; no data gives the unit interval.
fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    match extent(values) {
        None => 0.0..1.0,
        Some((low, high)) if high > low => {
            let pad = (high - low) * 0.05;
            (low - pad)..(high + pad)
        }
        Some((low, high)) => (low - 1.0)..(high + 1.0),
    }
}

fn normalize(value: f64, (low, high): (f64, f64)) -> f64 {
    if high > low {
        (value - low) / (high - low)
    } else {
        0.5
    }
}

/// Depth is plotted negated so that shallow values sit at the top (or the
/// right) of an ordinary increasing axis.
fn orient((x, y): (f64, f64), inverted: Option<Axis>) -> (f64, f64) {
    match inverted {
        Some(Axis::X) => (-x, y),
        Some(Axis::Y) => (x, -y),
        None => (x, y),
    }
}

fn histogram_ranges(bins: &[HistogramBin]) -> (Range<f64>, Range<f64>) {
    let x = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => first.start..last.end,
        _ => 0.0..1.0,
    };
    let peak = bins.iter().map(|bin| bin.count).max().unwrap_or(0).max(1);
    (x, 0.0..peak as f64 * 1.1)
}

fn plot_ranges(marks: &Marks, inverted: Option<Axis>) -> (Range<f64>, Range<f64>) {
    let oriented: Vec<(f64, f64)> = match marks {
        Marks::Profile { points, .. } | Marks::Series { points, .. } => points
            .iter()
            .map(|point| orient(*point, inverted))
            .collect(),
        Marks::Scatter { points, .. } => points
            .iter()
            .map(|(x, y, _)| orient((*x, *y), inverted))
            .collect(),
        Marks::Histogram { bins } => return histogram_ranges(bins),
    };
    (
        padded_range(oriented.iter().map(|point| point.0)),
        padded_range(oriented.iter().map(|point| point.1)),
    )
}

fn date_label(origin: NaiveDateTime, days: f64) -> String {
    let offset = Duration::seconds((days * 86_400.0).round() as i64);
    (origin + offset).format("%Y-%m-%d").to_string()
}

fn draw_placeholder<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>) -> DrawResult<(), DB> {
    let body = root.titled(EMPTY_TITLE, (FONT, 32.0))?;
    let (width, height) = body.dim_in_pixel();
    let style = (FONT, 24.0)
        .into_font()
        .color(&MUTED)
        .pos(Pos::new(HPos::Center, VPos::Center));
    body.draw_text(EMPTY_MESSAGE, &style, (width as i32 / 2, height as i32 / 2))?;
    Ok(())
}

fn draw_plan<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, plan: &ChartPlan) -> DrawResult<(), DB> {
    root.fill(&BACKGROUND)?;
    let ChartPlan::Figure {
        title,
        x_label,
        y_label,
        inverted,
        marks,
        ..
    } = plan
    else {
        return draw_placeholder(root);
    };
    let inverted = *inverted;
    let (x_range, y_range) = plot_ranges(marks, inverted);

    let mut chart = ChartBuilder::on(root)
        .caption(title.as_str(), (FONT, 26.0))
        .margin(24)
        .x_label_area_size(56)
        .y_label_area_size(72)
        .build_cartesian_2d(x_range, y_range)?;

    let depth_tick = |value: &f64| format!("{:.0}", value.abs());
    let origin = match marks {
        Marks::Series { origin, .. } => Some(*origin),
        _ => None,
    };
    let date_tick = |value: &f64| date_label(origin.unwrap_or_default(), *value);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(*x_label).y_desc(*y_label);
        match inverted {
            Some(Axis::X) => {
                mesh.x_label_formatter(&depth_tick);
            }
            Some(Axis::Y) => {
                mesh.y_label_formatter(&depth_tick);
            }
            None => {}
        }
        if origin.is_some() {
            mesh.x_labels(8).x_label_formatter(&date_tick);
        }
        mesh.draw()?;
    }

    match marks {
        Marks::Profile { points, color } => {
            let color = RGBColor(color.0, color.1, color.2);
            let oriented: Vec<(f64, f64)> = points.iter().map(|point| orient(*point, inverted)).collect();
            chart.draw_series(LineSeries::new(oriented.iter().copied(), color.stroke_width(2)))?;
            chart.draw_series(oriented.iter().map(|point| Circle::new(*point, 5, color.filled())))?;
        }
        Marks::Scatter {
            points,
            palette,
            color_label,
        } => {
            let shade_extent = extent(points.iter().map(|point| point.2)).unwrap_or((0.0, 1.0));
            chart.draw_series(points.iter().map(|(x, y, shade)| {
                let color = palette.color(normalize(*shade, shade_extent));
                Circle::new(orient((*x, *y), inverted), 6, color.mix(0.8).filled())
            }))?;
            let (width, _) = root.dim_in_pixel();
            let key = (FONT, 16.0).into_font().color(&MUTED);
            root.draw_text(&format!("Color: {color_label}"), &key, (width as i32 - 260, 48))?;
        }
        Marks::Series { points, trend, .. } => {
            chart
                .draw_series(LineSeries::new(points.iter().copied(), SERIES_BLUE.stroke_width(2)))?
                .label("Temperature")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SERIES_BLUE));
            chart.draw_series(points.iter().map(|point| Circle::new(*point, 4, SERIES_BLUE.filled())))?;
            if let Some(trend) = trend {
                let fitted = points
                    .iter()
                    .enumerate()
                    .map(|(index, (x, _))| (*x, trend.at(index)));
                chart
                    .draw_series(LineSeries::new(fitted, RED.mix(0.8).stroke_width(2)))?
                    .label("Trend")
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
            }
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK.mix(0.5))
                .draw()?;
        }
        Marks::Histogram { bins } => {
            let peak = bins.iter().map(|bin| bin.count).max().unwrap_or(0).max(1) as f64;
            chart.draw_series(bins.iter().map(|bin| {
                let shade = Palette::Blues.color(bin.count as f64 / peak);
                Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], shade.filled())
            }))?;
            chart.draw_series(bins.iter().map(|bin| {
                Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], NAVY.stroke_width(1))
            }))?;
        }
    }
    Ok(())
}

fn ensure_font() -> Result<()> {
    FONT_REGISTERED.clone().map_err(|err| anyhow!(err))
}

pub(super) fn render_png(plan: &ChartPlan) -> Result<Vec<u8>> {
    ensure_font()?;
    let mut buffer = vec![0u8; (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (CANVAS_WIDTH, CANVAS_HEIGHT)).into_drawing_area();
        draw_plan(&root, plan).map_err(|err| anyhow!("failed to draw chart: {err}"))?;
        root.present().map_err(|err| anyhow!("failed to finish chart: {err}"))?;
    }
    let image = RgbImage::from_raw(CANVAS_WIDTH, CANVAS_HEIGHT, buffer)
        .context("chart buffer does not match the canvas size")?;
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .context("failed to encode chart as PNG")?;
    Ok(encoded.into_inner())
}

pub(super) fn render_svg(plan: &ChartPlan) -> Result<Vec<u8>> {
    ensure_font()?;
    let mut markup = String::new();
    {
        let root = SVGBackend::with_string(&mut markup, (CANVAS_WIDTH, CANVAS_HEIGHT)).into_drawing_area();
        draw_plan(&root, plan).map_err(|err| anyhow!("failed to draw chart: {err}"))?;
        root.present().map_err(|err| anyhow!("failed to finish chart: {err}"))?;
    }
    Ok(markup.into_bytes())
}

#[cfg(test)]
mod tests {
    use plotters::style::RGBColor;

    use super::{date_label, orient, padded_range, Palette};
    use crate::chart::Axis;
    use crate::synthetic::midnight;

    fn rgb(color: RGBColor) -> (u8, u8, u8) {
        (color.0, color.1, color.2)
    }

    #[test]
    fn palette_endpoints_match_stops() {
        assert_eq!(rgb(Palette::Blues.color(0.0)), (247, 251, 255));
        assert_eq!(rgb(Palette::Viridis.color(1.0)), (253, 231, 37));
        assert_eq!(rgb(Palette::Coolwarm.color(0.5)), (221, 221, 221));
        assert_eq!(rgb(Palette::Blues.color(f64::NAN)), (247, 251, 255));
    }

    #[test]
    fn ranges_pad_five_percent() {
        let range = padded_range([0.0, 100.0]);
        assert_eq!((range.start, range.end), (-5.0, 105.0));
        let flat = padded_range([3.0]);
        assert_eq!((flat.start, flat.end), (2.0, 4.0));
        let none = padded_range(Vec::new());
        assert_eq!((none.start, none.end), (0.0, 1.0));
    }

    #[test]
    fn depth_axis_is_negated() {
        assert_eq!(orient((12.0, 300.0), Some(Axis::Y)), (12.0, -300.0));
        assert_eq!(orient((300.0, 12.0), Some(Axis::X)), (-300.0, 12.0));
        assert_eq!(orient((1.0, 2.0), None), (1.0, 2.0));
    }

    #[test]
    fn date_ticks_count_days_from_origin() {
        assert_eq!(date_label(midnight(2023, 1, 1), 31.0), "2023-02-01");
    }
}
