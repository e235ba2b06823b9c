mod aggregate;
pub mod views;

pub use aggregate::{attendance_by_year, top_countries, DirectoryReport, TOP_COUNTRY_LIMIT};
pub use views::{CountryChartRow, ProgramCounts, YearChartRow, RESERVED_CHART_KEYS};
