use super::ChartKind;

/// Query vocabulary that names a focus of the chart, in display order.
const FOCUS_TERMS: &[(&str, &[&str])] = &[
    ("Temperature", &["temperature", "temp", "thermal", "heat", "warm", "cold"]),
    ("Salinity", &["salinity", "salt", "saline"]),
    ("Depth", &["depth", "deep", "shallow", "surface", "bottom"]),
    ("Temporal", &["time", "trend", "change", "temporal", "evolution"]),
    ("Geographic", &["location", "map", "geographic", "position", "coordinates"]),
    ("Distribution", &["distribution", "histogram", "frequency", "pattern"]),
];

/// One wording for a chart kind. An empty trigger list always matches.
struct TitleRule {
    triggers: &'static [&'static str],
    head: &'static str,
    fallback: &'static str,
}

const fn rule(
    triggers: &'static [&'static str],
    head: &'static str,
    fallback: &'static str,
) -> TitleRule {
    TitleRule {
        triggers,
        head,
        fallback,
    }
}

const TEMPERATURE_DEPTH: &[TitleRule] = &[
    rule(&["profile", "vertical"], "Ocean Temperature Profile", "Depth Analysis"),
    rule(&["relationship", "correlation"], "Temperature vs Depth Relationship", "Oceanographic Analysis"),
    rule(&[], "Temperature and Depth Analysis", "Ocean Data"),
];

const SALINITY_DEPTH: &[TitleRule] = &[
    rule(&["profile", "vertical"], "Ocean Salinity Profile", "Depth Analysis"),
    rule(&["relationship", "correlation"], "Salinity vs Depth Relationship", "Oceanographic Analysis"),
    rule(&[], "Salinity and Depth Analysis", "Ocean Data"),
];

const TEMPERATURE_SALINITY: &[TitleRule] = &[
    rule(&["diagram", "ts"], "Temperature-Salinity Diagram", "Ocean Water Mass Analysis"),
    rule(&["relationship", "correlation"], "Temperature vs Salinity Relationship", "Oceanographic Analysis"),
    rule(&[], "Temperature and Salinity Analysis", "Ocean Data"),
];

const TIME_SERIES: &[TitleRule] = &[
    rule(&["trend"], "Temperature Trends Over Time", "Temporal Analysis"),
    rule(&["change", "evolution"], "Temperature Change Over Time", "Temporal Evolution"),
    rule(&[], "Temperature Time Series", "Temporal Data"),
];

const HISTOGRAM: &[TitleRule] = &[
    rule(&["distribution"], "Temperature Distribution", "Statistical Analysis"),
    rule(&["frequency"], "Temperature Frequency Distribution", "Statistical Analysis"),
    rule(&[], "Temperature Histogram", "Data Distribution"),
];

const GEOGRAPHIC: &[TitleRule] = &[
    rule(&["map"], "Ocean Temperature Map", "Geographic Distribution"),
    rule(&["location"], "Temperature by Location", "Geographic Analysis"),
    rule(&[], "Geographic Temperature Analysis", "Spatial Data"),
];

const DEFAULT: &[TitleRule] = &[
    rule(&["profile"], "Ocean Temperature Profile", "Depth Analysis"),
    rule(&[], "Ocean Temperature Analysis", "Oceanographic Data"),
];

fn rules(kind: ChartKind) -> &'static [TitleRule] {
    match kind {
        ChartKind::TemperatureDepth => TEMPERATURE_DEPTH,
        ChartKind::SalinityDepth => SALINITY_DEPTH,
        ChartKind::TemperatureSalinity => TEMPERATURE_SALINITY,
        ChartKind::TimeSeries => TIME_SERIES,
        ChartKind::Histogram => HISTOGRAM,
        ChartKind::Geographic => GEOGRAPHIC,
        ChartKind::Default => DEFAULT,
    }
}

/// Lowercased whitespace tokens with surrounding punctuation removed, so
/// "depth?" still counts as "depth".
fn tokens(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

fn focus_labels(words: &[String]) -> Vec<&'static str> {
    FOCUS_TERMS
        .iter()
        .filter(|(_, terms)| words.iter().any(|word| terms.contains(&word.as_str())))
        .map(|(label, _)| *label)
        .collect()
}

/// `"{head} - {focus}"`, where focus lists the recognised query themes or
/// falls back to the rule's generic suffix. Never fails.
pub fn chart_title(query: &str, kind: ChartKind) -> String {
    let words = tokens(query);
    let has_word = |trigger: &str| words.iter().any(|word| word == trigger);
    let table = rules(kind);
    let Some(chosen) = table
        .iter()
        .find(|candidate| {
            candidate.triggers.is_empty() || candidate.triggers.iter().any(|trigger| has_word(trigger))
        })
    else {
        return "Ocean Data".to_string();
    };
    let focus = focus_labels(&words);
    if focus.is_empty() {
        format!("{} - {}", chosen.head, chosen.fallback)
    } else {
        format!("{} - {}", chosen.head, focus.join(", "))
    }
}
