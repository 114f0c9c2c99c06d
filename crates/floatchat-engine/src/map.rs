//! Standalone Leaflet page showing float positions.

use askama_escape::{escape, Html};
use floatchat_contracts::records::FloatLocationRecord;
use serde::Serialize;

pub const WIDE_ZOOM: u8 = 3;
pub const REGIONAL_ZOOM: u8 = 6;
pub const HEAT_LAYER_NAME: &str = "ARGO Float Density";

#[derive(Debug, Clone, Serialize)]
struct TileLayer {
    name: &'static str,
    url: &'static str,
    attribution: &'static str,
}

const TILE_LAYERS: &[TileLayer] = &[
    TileLayer {
        name: "OpenStreetMap",
        url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: "&copy; OpenStreetMap contributors",
    },
    TileLayer {
        name: "Light",
        url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
        attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
    },
    TileLayer {
        name: "Dark",
        url: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
        attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
    },
    TileLayer {
        name: "Terrain",
        url: "https://tiles.stadiamaps.com/tiles/stamen_terrain/{z}/{x}/{y}{r}.png",
        attribution: "&copy; Stadia Maps &copy; Stamen Design &copy; OpenStreetMap contributors",
    },
];

#[derive(Debug, Clone, Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    color: &'static str,
    popup: String,
}

#[derive(Debug, Clone, Serialize)]
struct MapConfig {
    center: [f64; 2],
    zoom: u8,
    tiles: &'static [TileLayer],
    markers: Vec<Marker>,
    heat: Vec<[f64; 2]>,
    heat_name: &'static str,
}

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>ARGO Float Locations</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.banner { position: fixed; top: 10px; left: 50%; transform: translateX(-50%); z-index: 1000;
  background: white; padding: 6px 16px; border-radius: 5px; font: bold 16px sans-serif;
  box-shadow: 0 0 6px rgba(0,0,0,0.3); }
.legend { position: fixed; top: 10px; right: 10px; width: 150px; z-index: 1000;
  background: white; border: 2px solid grey; border-radius: 5px; padding: 10px; font: 14px sans-serif; }
.legend i { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 6px; }
</style>
</head>
<body>
<div id="map"></div>
<div class="banner">ARGO Float Locations</div>
<div class="legend">
<p><b>ARGO Float Status</b></p>
<p><i style="background: green"></i>Active</p>
<p><i style="background: blue"></i>Drifting</p>
<p><i style="background: red"></i>Parked</p>
</div>
<script>
const config = __MAP_CONFIG__;
const map = L.map("map").setView(config.center, config.zoom);
const bases = {};
config.tiles.forEach((tile, index) => {
  const layer = L.tileLayer(tile.url, { attribution: tile.attribution });
  if (index === 0) { layer.addTo(map); }
  bases[tile.name] = layer;
});
config.markers.forEach((marker) => {
  L.circleMarker([marker.lat, marker.lon], {
    radius: 8, color: "white", weight: 2, fillColor: marker.color, fillOpacity: 0.8
  }).bindPopup(marker.popup, { maxWidth: 200 }).addTo(map);
});
const overlays = {};
if (config.heat.length > 0) {
  overlays[config.heat_name] = L.heatLayer(config.heat, { radius: 15, blur: 10, maxZoom: 1 }).addTo(map);
}
L.control.layers(bases, overlays).addTo(map);
</script>
</body>
</html>
"#;

pub fn zoom_for(query: &str) -> u8 {
    let lower = query.to_lowercase();
    if lower.contains("ocean") || lower.contains("global") {
        WIDE_ZOOM
    } else {
        REGIONAL_ZOOM
    }
}

/// Mean position of the located rows, or the origin when none are located.
pub fn center_of(rows: &[FloatLocationRecord]) -> (f64, f64) {
    let located: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((row.latitude()?, row.longitude()?)))
        .collect();
    if located.is_empty() {
        return (0.0, 0.0);
    }
    let count = located.len() as f64;
    let (lat_sum, lon_sum) = located
        .iter()
        .fold((0.0, 0.0), |(lat, lon), point| (lat + point.0, lon + point.1));
    (lat_sum / count, lon_sum / count)
}

fn reading(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(value) => format!("{value:.decimals$}{unit}"),
        None => "n/a".to_string(),
    }
}

fn popup(row: &FloatLocationRecord, lat: f64, lon: f64) -> String {
    let observation = &row.observation;
    [
        format!("<b>ARGO Float {}</b>", escape(&row.float_id, Html)),
        format!("Location: {lat:.2}°N, {lon:.2}°E"),
        format!("Status: {}", row.status.title()),
        format!("Temperature: {}", reading(observation.temperature, 1, "°C")),
        format!("Salinity: {}", reading(observation.salinity, 1, " PSU")),
        format!("Depth: {}", reading(observation.depth, 0, "m")),
        format!("Deployed: {}", row.deployment_date.format("%Y-%m-%d")),
    ]
    .join("<br>")
}

/// JSON embedded in a `<script>` block must not close it early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

pub fn render_map(query: &str, rows: &[FloatLocationRecord]) -> anyhow::Result<String> {
    let (lat, lon) = center_of(rows);
    let mut markers = Vec::with_capacity(rows.len());
    let mut heat = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(row_lat), Some(row_lon)) = (row.latitude(), row.longitude()) else {
            continue;
        };
        markers.push(Marker {
            lat: row_lat,
            lon: row_lon,
            color: row.status.marker_color(),
            popup: popup(row, row_lat, row_lon),
        });
        heat.push([row_lat, row_lon]);
    }
    let config = MapConfig {
        center: [lat, lon],
        zoom: zoom_for(query),
        tiles: TILE_LAYERS,
        markers,
        heat,
        heat_name: HEAT_LAYER_NAME,
    };
    let json = serde_json::to_string(&config)?;
    Ok(PAGE.replace("__MAP_CONFIG__", &script_safe(&json)))
}

#[cfg(test)]
mod tests {
    use floatchat_contracts::records::{FloatLocationRecord, FloatStatus, ObservationRecord};

    use super::{center_of, render_map, zoom_for, REGIONAL_ZOOM, WIDE_ZOOM};
    use crate::synthetic::midnight;

    fn float(id: &str, status: FloatStatus, lat: f64, lon: f64) -> FloatLocationRecord {
        FloatLocationRecord {
            float_id: id.to_string(),
            status,
            deployment_date: midnight(2021, 3, 4),
            observation: ObservationRecord {
                temperature: Some(18.26),
                salinity: Some(35.04),
                depth: Some(512.6),
                latitude: Some(lat),
                longitude: Some(lon),
                date: None,
            },
        }
    }

    #[test]
    fn empty_map_centres_on_origin() -> anyhow::Result<()> {
        let html = render_map("where are the floats", &[])?;
        assert!(html.contains(r#""center":[0.0,0.0]"#));
        assert!(html.contains(r#""zoom":6"#));
        assert!(html.contains("ARGO Float Locations"));
        assert!(html.contains("ARGO Float Status"));
        Ok(())
    }

    #[test]
    fn wide_zoom_for_ocean_or_global_queries() {
        assert_eq!(zoom_for("Global float map"), WIDE_ZOOM);
        assert_eq!(zoom_for("map of the OCEAN"), WIDE_ZOOM);
        assert_eq!(zoom_for("floats near Japan"), REGIONAL_ZOOM);
    }

    #[test]
    fn centre_is_mean_position() {
        let rows = vec![
            float("A", FloatStatus::Active, 10.0, -20.0),
            float("B", FloatStatus::Parked, 30.0, -40.0),
        ];
        assert_eq!(center_of(&rows), (20.0, -30.0));
    }

    #[test]
    fn popup_summarizes_the_float() -> anyhow::Result<()> {
        let rows = vec![float("ARGO_000001", FloatStatus::Drifting, 12.3456, -45.6789)];
        let html = render_map("map", &rows)?;
        for expected in [
            "ARGO Float ARGO_000001",
            "Location: 12.35°N, -45.68°E",
            "Status: Drifting",
            "Temperature: 18.3°C",
            "Salinity: 35.0 PSU",
            "Depth: 513m",
            "Deployed: 2021-03-04",
            r#""color":"blue""#,
            "ARGO Float Density",
        ] {
            assert!(html.contains(expected), "missing {expected}");
        }
        Ok(())
    }

    #[test]
    fn embedded_data_cannot_close_the_script() -> anyhow::Result<()> {
        let rows = vec![float("</script><b>", FloatStatus::Unknown, 0.0, 0.0)];
        let html = render_map("map", &rows)?;
        assert_eq!(html.matches("</script>").count(), 3);
        assert!(html.contains("ARGO Float &lt;"));
        assert!(!html.contains("Float <\\/script><b>"));
        Ok(())
    }
}
