use serde::Serialize;
use std::collections::BTreeMap;

/// Attendance per program code, one entry for every known program. Never holds a key from
/// [`RESERVED_CHART_KEYS`], since the counts are flattened next to the row label.
pub type ProgramCounts = BTreeMap<String, usize>;

/// Row label keys; a program with one of these codes is left out of the charts.
pub const RESERVED_CHART_KEYS: [&str; 2] = ["year", "country"];

pub fn is_chart_column(program: &str) -> bool {
    !RESERVED_CHART_KEYS.contains(&program)
}

/// One bar of the attendance-by-year chart, serialized as `{"year": .., "<program>": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearChartRow {
    pub year: String,
    #[serde(flatten)]
    pub counts: ProgramCounts,
}

/// One bar of the top-countries chart, serialized as `{"country": .., "<program>": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryChartRow {
    pub country: String,
    #[serde(flatten)]
    pub counts: ProgramCounts,
}

impl YearChartRow {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl CountryChartRow {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}
