use super::views::{is_chart_column, CountryChartRow, ProgramCounts, YearChartRow};
use crate::directory::domain::{AlumniRecord, RecordField};
use crate::directory::facets::{distinct_years, FacetSet};
use serde::Serialize;
use std::collections::HashMap;

/// Number of bars in the top-countries chart.
pub const TOP_COUNTRY_LIMIT: usize = 10;

/// Facets plus both chart datasets, recomputed in full on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryReport {
    pub facets: FacetSet,
    pub attendance_by_year: Vec<YearChartRow>,
    pub top_countries: Vec<CountryChartRow>,
}

impl DirectoryReport {
    pub fn build(records: &[AlumniRecord]) -> Self {
        let facets = FacetSet::extract(records);
        let attendance_by_year = attendance_by_year(records, &facets.programs);
        let top_countries = top_countries(records, &facets.programs, TOP_COUNTRY_LIMIT);
        Self {
            facets,
            attendance_by_year,
            top_countries,
        }
    }
}

/// Counts per `(group, program)` over records carrying both values and a chartable program.
fn tally(records: &[AlumniRecord], group: RecordField) -> HashMap<&str, HashMap<&str, usize>> {
    let mut counts: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
    for record in records {
        if let (Some(key), Some(program)) = (record.get(group), record.get(RecordField::Program)) {
            if !is_chart_column(program) {
                continue;
            }
            *counts.entry(key).or_default().entry(program).or_default() += 1;
        }
    }
    counts
}

fn program_columns(counts: Option<&HashMap<&str, usize>>, programs: &[String]) -> ProgramCounts {
    programs
        .iter()
        .filter(|program| is_chart_column(program))
        .map(|program| {
            let count = counts
                .and_then(|by_program| by_program.get(program.as_str()))
                .copied()
                .unwrap_or(0);
            (program.clone(), count)
        })
        .collect()
}

/// One row per year that has at least one record with a program; years without data are
/// not zero-filled.
pub fn attendance_by_year(records: &[AlumniRecord], programs: &[String]) -> Vec<YearChartRow> {
    let counts = tally(records, RecordField::Year);

    distinct_years(counts.keys().copied())
        .into_iter()
        .map(|year| {
            let columns = program_columns(counts.get(year.as_str()), programs);
            YearChartRow {
                year,
                counts: columns,
            }
        })
        .collect()
}

/// Countries ranked by attendance across all programs. Ties are broken by country name
/// so the cut at `limit` is deterministic.
pub fn top_countries(
    records: &[AlumniRecord],
    programs: &[String],
    limit: usize,
) -> Vec<CountryChartRow> {
    let counts = tally(records, RecordField::Country);

    let mut totals: Vec<(&str, usize)> = counts
        .iter()
        .map(|(country, by_program)| (*country, by_program.values().sum()))
        .collect();
    totals.sort_by(|(a_name, a_total), (b_name, b_total)| {
        b_total.cmp(a_total).then_with(|| a_name.cmp(b_name))
    });

    totals
        .into_iter()
        .take(limit)
        .map(|(country, _)| CountryChartRow {
            country: country.to_string(),
            counts: program_columns(counts.get(country), programs),
        })
        .collect()
}
