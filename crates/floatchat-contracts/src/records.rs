use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of oceanographic data.
///
/// Every field is optional: rows are assembled from free text, live fetches
/// or generators, and any of those may leave a measurement unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    /// Practical salinity units.
    pub salinity: Option<f64>,
    /// Metres below the surface.
    pub depth: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<NaiveDateTime>,
}

impl ObservationRecord {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatStatus {
    Active,
    Drifting,
    Parked,
    Unknown,
}

impl FloatStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "drifting" => Self::Drifting,
            "parked" => Self::Parked,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Drifting => "drifting",
            Self::Parked => "parked",
            Self::Unknown => "unknown",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Drifting => "Drifting",
            Self::Parked => "Parked",
            Self::Unknown => "Unknown",
        }
    }

    /// Marker colour on the float map. Unrecognised statuses share the
    /// drifting colour.
    pub fn marker_color(&self) -> &'static str {
        match self {
            Self::Active => "green",
            Self::Parked => "red",
            Self::Drifting | Self::Unknown => "blue",
        }
    }
}

/// A float position for the map, carrying the measurements shown in its
/// popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatLocationRecord {
    pub float_id: String,
    pub status: FloatStatus,
    pub deployment_date: NaiveDateTime,
    pub observation: ObservationRecord,
}

impl FloatLocationRecord {
    pub fn latitude(&self) -> Option<f64> {
        self.observation.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.observation.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::FloatStatus;

    #[test]
    fn status_parse_is_case_insensitive_and_total() {
        assert_eq!(FloatStatus::parse(" Active "), FloatStatus::Active);
        assert_eq!(FloatStatus::parse("PARKED"), FloatStatus::Parked);
        assert_eq!(FloatStatus::parse("lost"), FloatStatus::Unknown);
    }

    #[test]
    fn unknown_status_uses_blue_marker() {
        assert_eq!(FloatStatus::Active.marker_color(), "green");
        assert_eq!(FloatStatus::Drifting.marker_color(), "blue");
        assert_eq!(FloatStatus::Parked.marker_color(), "red");
        assert_eq!(FloatStatus::Unknown.marker_color(), "blue");
    }
}
