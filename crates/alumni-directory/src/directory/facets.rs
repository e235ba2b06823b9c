use super::domain::{AlumniRecord, RecordField};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Program codes that are always offered, whether or not the data mentions them.
pub const KNOWN_PROGRAMS: [&str; 2] = ["AAVC", "AVCN"];

/// Distinct values of the categorical fields, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSet {
    pub years: Vec<String>,
    pub countries: Vec<String>,
    pub programs: Vec<String>,
}

impl FacetSet {
    pub fn extract(records: &[AlumniRecord]) -> Self {
        Self {
            years: distinct_years(records.iter().filter_map(|r| r.get(RecordField::Year))),
            countries: distinct(records, RecordField::Country).into_iter().collect(),
            programs: distinct(records, RecordField::Program)
                .into_iter()
                .chain(KNOWN_PROGRAMS.iter().map(|code| code.to_string()))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

fn distinct(records: &[AlumniRecord], field: RecordField) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| record.get(field))
        .map(str::to_string)
        .collect()
}

/// Deduplicates and sorts year labels with [`year_order`].
pub(crate) fn distinct_years<'a>(years: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut years: Vec<String> = years
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    years.sort_by(|a, b| year_order(a, b));
    years
}

/// Numeric labels ascend by their leading integer; anything unparsable follows,
/// lexicographically.
pub fn year_order(a: &str, b: &str) -> Ordering {
    match (leading_int(a), leading_int(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Integer prefix of a label, so "2024 cohort" sorts as 2024.
fn leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|number| sign * number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::domain::{RecordFields, RecordId};

    fn record(id: &str, year: Option<&str>, country: Option<&str>, program: Option<&str>) -> AlumniRecord {
        AlumniRecord {
            id: RecordId(id.to_string()),
            fields: RecordFields {
                year: year.map(str::to_string),
                country: country.map(str::to_string),
                program: program.map(str::to_string),
                ..RecordFields::default()
            },
        }
    }

    #[test]
    fn years_sort_numerically_with_unparsable_last() {
        let records = vec![
            record("1", Some("2021"), None, None),
            record("2", Some("AVCN 2024"), None, None),
            record("3", Some("987"), None, None),
            record("4", Some("2021"), None, None),
            record("5", Some("2019 intake"), None, None),
            record("6", Some("Alpha"), None, None),
        ];

        let facets = FacetSet::extract(&records);
        assert_eq!(
            facets.years,
            vec!["987", "2019 intake", "2021", "AVCN 2024", "Alpha"]
        );
    }

    #[test]
    fn programs_always_include_known_codes() {
        let records = vec![
            record("1", None, Some("Kenya"), Some("NIVAP")),
            record("2", None, Some("Fiji"), None),
        ];

        let facets = FacetSet::extract(&records);
        assert_eq!(facets.programs, vec!["AAVC", "AVCN", "NIVAP"]);
        assert_eq!(facets.countries, vec!["Fiji", "Kenya"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let records = vec![
            record("1", Some("2020"), Some("Kenya"), Some("AAVC")),
            record("2", Some("2018"), Some("Benin"), Some("AVCN")),
            record("3", Some("x"), None, Some("AAVC")),
        ];

        assert_eq!(FacetSet::extract(&records), FacetSet::extract(&records));
    }

    #[test]
    fn leading_int_mirrors_prefix_parsing() {
        assert_eq!(leading_int("  42abc"), Some(42));
        assert_eq!(leading_int("-7"), Some(-7));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int(""), None);
    }
}
