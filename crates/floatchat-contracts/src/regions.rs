use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Pacific,
    Atlantic,
    Indian,
    Arctic,
    Southern,
}

/// Detection order: the first keyword present wins.
const REGION_ORDER: &[(&str, Region)] = &[
    ("pacific", Region::Pacific),
    ("atlantic", Region::Atlantic),
    ("indian", Region::Indian),
    ("arctic", Region::Arctic),
    ("southern", Region::Southern),
];

impl Region {
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        REGION_ORDER
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, region)| *region)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pacific => "pacific",
            Self::Atlantic => "atlantic",
            Self::Indian => "indian",
            Self::Arctic => "arctic",
            Self::Southern => "southern",
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        let global = BoundingBox::GLOBAL;
        match self {
            Self::Pacific => BoundingBox {
                min_lon: -180.0,
                max_lon: -100.0,
                ..global
            },
            Self::Atlantic => BoundingBox {
                min_lon: -100.0,
                max_lon: 20.0,
                ..global
            },
            Self::Indian => BoundingBox {
                min_lon: 20.0,
                max_lon: 180.0,
                ..global
            },
            // Polar regions are detected but the live query stays global.
            Self::Arctic | Self::Southern => global,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const GLOBAL: Self = Self {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lon: -180.0,
        max_lon: 180.0,
    };

    pub fn for_region(region: Option<Region>) -> Self {
        region.map(|value| value.bounds()).unwrap_or(Self::GLOBAL)
    }
}

/// Named places that seed synthetic float clusters. A place contributes its
/// anchors when any of its keywords occurs in the text.
struct AnchorGroup {
    keywords: &'static [&'static str],
    anchors: &'static [(f64, f64)],
}

const ANCHOR_GROUPS: &[AnchorGroup] = &[
    AnchorGroup {
        keywords: &["pacific"],
        anchors: &[(20.0, -150.0), (30.0, -120.0), (10.0, -180.0), (40.0, -160.0), (15.0, -140.0)],
    },
    AnchorGroup {
        keywords: &["north pacific"],
        anchors: &[(45.0, -150.0), (50.0, -130.0), (35.0, -180.0), (40.0, -160.0)],
    },
    AnchorGroup {
        keywords: &["south pacific"],
        anchors: &[(-20.0, -150.0), (-30.0, -120.0), (-10.0, -180.0), (-40.0, -160.0)],
    },
    AnchorGroup {
        keywords: &["atlantic"],
        anchors: &[(40.0, -30.0), (20.0, -60.0), (50.0, -20.0), (35.0, -40.0), (25.0, -50.0)],
    },
    AnchorGroup {
        keywords: &["north atlantic"],
        anchors: &[(45.0, -30.0), (50.0, -20.0), (40.0, -40.0), (55.0, -25.0)],
    },
    AnchorGroup {
        keywords: &["south atlantic"],
        anchors: &[(-20.0, -30.0), (-30.0, -20.0), (-15.0, -40.0), (-25.0, -35.0)],
    },
    AnchorGroup {
        keywords: &["indian"],
        anchors: &[(10.0, 80.0), (20.0, 60.0), (30.0, 100.0), (15.0, 70.0), (25.0, 90.0)],
    },
    AnchorGroup {
        keywords: &["arctic"],
        anchors: &[(70.0, -150.0), (80.0, -30.0), (75.0, 0.0), (72.0, -120.0), (78.0, -60.0)],
    },
    AnchorGroup {
        keywords: &["southern", "antarctic"],
        anchors: &[(-60.0, 0.0), (-50.0, 20.0), (-40.0, -30.0), (-55.0, 10.0), (-45.0, -20.0)],
    },
    AnchorGroup {
        keywords: &["california"],
        anchors: &[(35.0, -120.0), (37.0, -122.0), (33.0, -118.0)],
    },
    AnchorGroup {
        keywords: &["japan"],
        anchors: &[(35.0, 140.0), (37.0, 139.0), (33.0, 135.0)],
    },
    AnchorGroup {
        keywords: &["australia"],
        anchors: &[(-25.0, 135.0), (-30.0, 130.0), (-20.0, 140.0)],
    },
    AnchorGroup {
        keywords: &["europe"],
        anchors: &[(50.0, 0.0), (45.0, 5.0), (55.0, -5.0)],
    },
];

/// Region centroids named anywhere in `text`, in table order. Overlapping
/// names ("north pacific" also contains "pacific") contribute both groups.
pub fn named_anchors(text: &str) -> Vec<(f64, f64)> {
    let lower = text.to_lowercase();
    ANCHOR_GROUPS
        .iter()
        .filter(|group| group.keywords.iter().any(|keyword| lower.contains(keyword)))
        .flat_map(|group| group.anchors.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{named_anchors, BoundingBox, Region};

    #[test]
    fn detection_follows_fixed_precedence() {
        assert_eq!(
            Region::detect("Floats drift from the Atlantic into the Pacific"),
            Some(Region::Pacific)
        );
        assert_eq!(Region::detect("ARCTIC sea ice"), Some(Region::Arctic));
        assert_eq!(Region::detect("the Mediterranean"), None);
    }

    #[test]
    fn basin_bounds_narrow_longitude() {
        let pacific = Region::Pacific.bounds();
        assert_eq!((pacific.min_lon, pacific.max_lon), (-180.0, -100.0));
        assert_eq!((pacific.min_lat, pacific.max_lat), (-90.0, 90.0));
        assert_eq!(BoundingBox::for_region(None), BoundingBox::GLOBAL);
    }

    #[test]
    fn polar_regions_query_the_whole_globe() {
        assert_eq!(Region::Arctic.bounds(), BoundingBox::GLOBAL);
        assert_eq!(Region::Southern.bounds(), BoundingBox::GLOBAL);
    }

    #[test]
    fn anchors_accumulate_for_overlapping_names() {
        let anchors = named_anchors("Floats in the North Pacific near Japan");
        // pacific (5) + north pacific (4) + japan (3)
        assert_eq!(anchors.len(), 12);
        assert_eq!(anchors[0], (20.0, -150.0));
        assert!(named_anchors("somewhere unnamed").is_empty());
    }

    #[test]
    fn antarctic_maps_to_southern_anchors() {
        let anchors = named_anchors("Antarctic circumpolar current");
        assert_eq!(anchors.first(), Some(&(-60.0, 0.0)));
    }
}
