use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use floatchat_contracts::records::{FloatLocationRecord, FloatStatus, ObservationRecord};
use floatchat_contracts::regions::{BoundingBox, Region};
use log::{debug, info};
use reqwest::blocking::Client as HttpClient;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::llm::truncate_text;
use crate::synthetic::{PlaceholderMeasurements, SYNTHETIC_SEED};

pub const OBSERVATION_WINDOW_DAYS: i64 = 7;
pub const LOCATION_WINDOW_DAYS: i64 = 30;
const ERDDAP_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Live oceanographic data keyed by time window and bounding box.
pub trait OceanDataSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch_observations(
        &self,
        region: Option<Region>,
        days_back: i64,
    ) -> Result<Vec<ObservationRecord>>;
    fn fetch_float_locations(
        &self,
        region: Option<Region>,
        days_back: i64,
    ) -> Result<Vec<FloatLocationRecord>>;
}

pub struct ErddapSource {
    url: String,
    http: HttpClient,
}

impl ErddapSource {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.fetch_timeout)
            .build()
            .context("failed to build ERDDAP HTTP client")?;
        Ok(Self {
            url: config.erddap_url.clone(),
            http,
        })
    }

    fn query_url(&self, region: Option<Region>, days_back: i64) -> Result<Url> {
        let end = Utc::now().naive_utc();
        let start = end - Duration::days(days_back);
        let bounds = BoundingBox::for_region(region);
        let params = [
            ("time>=", start.format(ERDDAP_TIME_FORMAT).to_string()),
            ("time<=", end.format(ERDDAP_TIME_FORMAT).to_string()),
            ("latitude>=", bounds.min_lat.to_string()),
            ("latitude<=", bounds.max_lat.to_string()),
            ("longitude>=", bounds.min_lon.to_string()),
            ("longitude<=", bounds.max_lon.to_string()),
        ];
        Url::parse_with_params(&self.url, &params)
            .with_context(|| format!("invalid ERDDAP url ({})", self.url))
    }

    fn fetch_table(&self, region: Option<Region>, days_back: i64) -> Result<ErddapTable> {
        let url = self.query_url(region, days_back)?;
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .context("ERDDAP request failed")?;
        let status = response.status();
        let body = response.text().context("ERDDAP response body read failed")?;
        if !status.is_success() {
            bail!(
                "ERDDAP request failed ({}): {}",
                status.as_u16(),
                truncate_text(&body, 256)
            );
        }
        ErddapTable::parse(&body)
    }
}

impl OceanDataSource for ErddapSource {
    fn name(&self) -> &str {
        "erddap"
    }

    fn fetch_observations(
        &self,
        region: Option<Region>,
        days_back: i64,
    ) -> Result<Vec<ObservationRecord>> {
        let rows = self.fetch_table(region, days_back)?.observations();
        info!("erddap returned {} observation rows", rows.len());
        Ok(rows)
    }

    fn fetch_float_locations(
        &self,
        region: Option<Region>,
        days_back: i64,
    ) -> Result<Vec<FloatLocationRecord>> {
        let rows = self.fetch_table(region, days_back)?.float_locations()?;
        info!("erddap returned {} float positions", rows.len());
        Ok(rows)
    }
}

/// Used when live data is switched off; every fetch fails.
pub struct OfflineSource;

impl OceanDataSource for OfflineSource {
    fn name(&self) -> &str {
        "offline"
    }

    fn fetch_observations(&self, _: Option<Region>, _: i64) -> Result<Vec<ObservationRecord>> {
        bail!("live data source disabled (offline mode)")
    }

    fn fetch_float_locations(&self, _: Option<Region>, _: i64) -> Result<Vec<FloatLocationRecord>> {
        bail!("live data source disabled (offline mode)")
    }
}

#[derive(Debug, Deserialize)]
struct ErddapEnvelope {
    table: ErddapTable,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnName {
    Plain(String),
    Described { name: String },
}

impl ColumnName {
    fn as_str(&self) -> &str {
        match self {
            Self::Plain(name) | Self::Described { name } => name,
        }
    }
}

/// `tabledap` JSON: column names plus row-major cells.
#[derive(Debug, Deserialize)]
pub(crate) struct ErddapTable {
    #[serde(rename = "columnNames")]
    column_names: Vec<ColumnName>,
    rows: Vec<Vec<Value>>,
}

impl ErddapTable {
    pub(crate) fn parse(body: &str) -> Result<Self> {
        let envelope: ErddapEnvelope =
            serde_json::from_str(body).context("ERDDAP returned an unexpected payload")?;
        Ok(envelope.table)
    }

    fn column(&self, aliases: &[&str]) -> Option<usize> {
        self.column_names
            .iter()
            .position(|column| aliases.iter().any(|alias| column.as_str() == *alias))
    }

    fn number(row: &[Value], column: Option<usize>) -> Option<f64> {
        match row.get(column?)? {
            Value::Number(value) => value.as_f64(),
            Value::String(raw) => raw.trim().parse().ok(),
            _ => None,
        }
    }

    fn timestamp(row: &[Value], column: Option<usize>) -> Option<NaiveDateTime> {
        match row.get(column?)? {
            Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|value| value.naive_utc())
                .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), ERDDAP_TIME_FORMAT))
                .ok(),
            Value::Number(secs) => {
                DateTime::from_timestamp(secs.as_f64()? as i64, 0).map(|value| value.naive_utc())
            }
            _ => None,
        }
    }

    /// Rows with unusable coordinates are dropped, as are rows whose
    /// measurement cell is present but not numeric. Columns the server did
    /// not send are filled with placeholder values.
    pub(crate) fn observations(&self) -> Vec<ObservationRecord> {
        let lat_col = self.column(&["latitude"]);
        let lon_col = self.column(&["longitude"]);
        let time_col = self.column(&["time"]);
        let temp_col = self.column(&["temperature", "temp"]);
        let sal_col = self.column(&["salinity", "psal"]);
        let depth_col = self.column(&["depth", "pres"]);
        let mut placeholders = PlaceholderMeasurements::new(SYNTHETIC_SEED);

        let mut out = Vec::new();
        for row in &self.rows {
            let (Some(latitude), Some(longitude)) =
                (Self::number(row, lat_col), Self::number(row, lon_col))
            else {
                continue;
            };
            let temperature = match temp_col {
                Some(_) => Self::number(row, temp_col),
                None => Some(placeholders.temperature()),
            };
            let salinity = match sal_col {
                Some(_) => Self::number(row, sal_col),
                None => Some(placeholders.salinity()),
            };
            let depth = match depth_col {
                Some(_) => Self::number(row, depth_col),
                None => Some(placeholders.depth()),
            };
            if temperature.is_none() || salinity.is_none() || depth.is_none() {
                continue;
            }
            out.push(ObservationRecord {
                temperature,
                salinity,
                depth,
                latitude: Some(latitude),
                longitude: Some(longitude),
                date: Self::timestamp(row, time_col),
            });
        }
        out
    }

    /// Latest position per platform, ordered by platform number.
    pub(crate) fn float_locations(&self) -> Result<Vec<FloatLocationRecord>> {
        let Some(platform_col) = self.column(&["platform_number"]) else {
            bail!("ERDDAP table has no platform_number column");
        };
        let lat_col = self.column(&["latitude"]);
        let lon_col = self.column(&["longitude"]);
        let time_col = self.column(&["time"]);

        let mut latest: BTreeMap<String, (f64, f64, Option<NaiveDateTime>)> = BTreeMap::new();
        for row in &self.rows {
            let platform = match row.get(platform_col) {
                Some(Value::String(raw)) => raw.trim().to_string(),
                Some(Value::Number(raw)) => raw.to_string(),
                _ => continue,
            };
            let (Some(latitude), Some(longitude)) =
                (Self::number(row, lat_col), Self::number(row, lon_col))
            else {
                continue;
            };
            latest.insert(platform, (latitude, longitude, Self::timestamp(row, time_col)));
        }

        let now = Utc::now().naive_utc();
        let mut placeholders = PlaceholderMeasurements::new(SYNTHETIC_SEED);
        Ok(latest
            .into_iter()
            .map(|(float_id, (latitude, longitude, time))| FloatLocationRecord {
                float_id,
                status: FloatStatus::Active,
                deployment_date: time.unwrap_or(now),
                observation: ObservationRecord {
                    temperature: Some(placeholders.temperature()),
                    salinity: Some(placeholders.salinity()),
                    depth: Some(placeholders.depth()),
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    date: time,
                },
            })
            .collect())
    }
}
