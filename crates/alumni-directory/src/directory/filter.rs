use super::domain::{AlumniRecord, RecordField};
use serde::Deserialize;

/// Fields consulted by the free-text query.
const SEARCHABLE_FIELDS: [RecordField; 8] = [
    RecordField::Name,
    RecordField::Country,
    RecordField::Year,
    RecordField::Email,
    RecordField::Role,
    RecordField::Region,
    RecordField::Language,
    RecordField::Comments,
];

/// Free-text search plus exact-match facet selections. Empty strings mean
/// "no constraint", matching how the dropdowns report a cleared selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordFilter {
    #[serde(default, alias = "query")]
    pub q: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
}

impl RecordFilter {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.q = Some(query.into());
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_lowercase)
    }

    fn facet_constraints(&self) -> impl Iterator<Item = (RecordField, &str)> {
        [
            (RecordField::Year, self.year.as_deref()),
            (RecordField::Country, self.country.as_deref()),
            (RecordField::Program, self.program.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.filter(|v| !v.is_empty()).map(|v| (field, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.facet_constraints().next().is_none()
    }

    pub fn matches(&self, record: &AlumniRecord) -> bool {
        self.matches_with(record, self.needle().as_deref())
    }

    fn matches_with(&self, record: &AlumniRecord, needle: Option<&str>) -> bool {
        self.facet_constraints()
            .all(|(field, expected)| record.get(field) == Some(expected))
            && needle.map_or(true, |needle| matches_query(record, needle))
    }

    /// Keeps input order.
    pub fn apply(&self, records: &[AlumniRecord]) -> Vec<AlumniRecord> {
        if self.is_empty() {
            return records.to_vec();
        }
        let needle = self.needle();
        records
            .iter()
            .filter(|record| self.matches_with(record, needle.as_deref()))
            .cloned()
            .collect()
    }
}

fn matches_query(record: &AlumniRecord, needle: &str) -> bool {
    SEARCHABLE_FIELDS.iter().any(|field| {
        record
            .get(*field)
            .is_some_and(|value| value.to_lowercase().contains(needle))
    })
}
