//! Keyword classification of a raw user query.
//!
//! All checks are case-insensitive substring membership with no word
//! boundaries, so short keywords such as `hi` or `sea` also fire inside
//! longer words. That imprecision is accepted.

use serde::Serialize;

pub const GREETING_KEYWORDS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "greetings",
    "how are you",
    "how do you do",
    "nice to meet you",
    "what can you do",
    "what do you do",
    "help",
    "assist",
    "support",
    "start",
    "begin",
    "introduction",
    "intro",
    "welcome",
];

pub const DOMAIN_KEYWORDS: &[&str] = &[
    // floats
    "argo",
    "float",
    "profiling",
    "autonomous",
    "drift",
    "buoy",
    // physical oceanography
    "ocean",
    "oceanic",
    "marine",
    "sea",
    "seas",
    "water",
    "salinity",
    "temperature",
    "depth",
    "current",
    "currents",
    "wave",
    "waves",
    "tide",
    "tides",
    "thermocline",
    "halocline",
    "pycnocline",
    // marine science
    "oceanography",
    "hydrography",
    "bathymetry",
    "seabed",
    "continental shelf",
    "abyssal",
    "pelagic",
    "benthic",
    "plankton",
    "phytoplankton",
    "zooplankton",
    "nutrient",
    "oxygen",
    "ph",
    "chlorophyll",
    "primary production",
    "ecosystem",
    "biodiversity",
    // basins and features
    "pacific",
    "atlantic",
    "indian",
    "arctic",
    "southern",
    "antarctic",
    "mediterranean",
    "caribbean",
    "gulf",
    "bay",
    "strait",
    "channel",
    // instruments
    "ctd",
    "rosette",
    "niskin",
    "bottle",
    "sensor",
    "transducer",
    "acoustic",
    "sonar",
    "radar",
    "satellite",
    "remote sensing",
    // climate and weather
    "climate",
    "weather",
    "storm",
    "hurricane",
    "typhoon",
    "cyclone",
    "el nino",
    "la nina",
    "enso",
    "nao",
    "pdo",
    "amo",
    // geography
    "latitude",
    "longitude",
    "coordinates",
    "position",
    "location",
    "equator",
    "tropics",
    "polar",
    "subpolar",
    "temperate",
];

pub const GRAPH_KEYWORDS: &[&str] = &[
    "plot",
    "graph",
    "chart",
    "visualize",
    "visualization",
    "show me a",
    "display a",
    "create a graph",
    "create a plot",
    "create a chart",
    "draw a",
    "make a graph",
    "line graph",
    "bar chart",
    "scatter plot",
    "histogram",
    "heatmap",
    "time series",
    "over time",
    "comparison",
    "distribution",
    "correlation",
];

pub const MAP_KEYWORDS: &[&str] = &[
    "map",
    "show me a map",
    "display a map",
    "create a map",
    "where are",
    "show locations",
    "float location",
    "deployment",
    "tracking",
    "geographic",
    "ocean map",
    "world map",
    "global map",
    "regional map",
    "show me where",
    "locate",
    "find locations",
];

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn is_domain_related(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    contains_any(&lower, GREETING_KEYWORDS) || contains_any(&lower, DOMAIN_KEYWORDS)
}

pub fn is_graph_query(text: &str) -> bool {
    contains_any(&text.to_lowercase(), GRAPH_KEYWORDS)
}

pub fn is_map_query(text: &str) -> bool {
    contains_any(&text.to_lowercase(), MAP_KEYWORDS)
}

/// Classification of one query, computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryIntent {
    pub is_domain: bool,
    pub wants_chart: bool,
    pub wants_map: bool,
}

impl QueryIntent {
    pub fn classify(text: &str) -> Self {
        Self {
            is_domain: is_domain_related(text),
            wants_chart: is_graph_query(text),
            wants_map: is_map_query(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{is_domain_related, is_graph_query, is_map_query, QueryIntent};

    #[test]
    fn greetings_are_in_domain() {
        assert!(is_domain_related("Hello there"));
        assert!(is_domain_related("  GOOD MORNING  "));
    }

    #[test]
    fn unrelated_questions_are_rejected() {
        assert!(!is_domain_related("What's the capital of France?"));
        assert!(!is_domain_related(""));
    }

    #[test]
    fn domain_vocabulary_matches_case_insensitively() {
        assert!(is_domain_related("Explain the THERMOCLINE"));
        assert!(is_domain_related("el nino effects on fisheries"));
    }

    #[test]
    fn substring_matching_over_triggers_inside_words() {
        // "hi" and "ph" both sit inside "graphics"
        assert!(is_domain_related("graphics cards"));
    }

    #[test]
    fn plain_question_wants_neither_chart_nor_map() {
        let text = "Tell me about Argo floats";
        assert!(!is_graph_query(text));
        assert!(!is_map_query(text));
    }

    #[test]
    fn chart_and_map_keywords_can_both_fire() {
        let intent = QueryIntent::classify("Plot a map of float temperature distribution");
        assert!(intent.is_domain);
        assert!(intent.wants_chart);
        assert!(intent.wants_map);
    }

    #[test]
    fn map_keywords_detected() {
        assert!(is_map_query("Where are the Argo floats in the Pacific?"));
        assert!(is_map_query("track float DEPLOYMENT sites"));
        assert!(!is_graph_query("Where are the Argo floats in the Pacific?"));
    }

    #[test]
    fn graph_keywords_detected() {
        assert!(is_graph_query("Show temperature over time"));
        assert!(is_graph_query("salinity HISTOGRAM"));
    }
}
