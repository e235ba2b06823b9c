use alumni_directory::config::AppConfig;
use alumni_directory::directory::{
    AlumniRecord, DirectoryReport, DocumentStore, ExportFormat, ExportSheet,
    InMemoryDocumentStore, RecordFilter, ServiceError,
};
use alumni_directory::error::AppError;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// JSON array of alumni records (same shape as the document store)
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Also print the records matching the filters
    #[arg(long)]
    pub(crate) list_records: bool,
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// JSON array of alumni records (same shape as the document store)
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Spreadsheet format to write
    #[arg(long, default_value = "xlsx")]
    pub(crate) format: ExportFormat,
    /// Directory receiving the export (defaults to APP_EXPORT_DIR)
    #[arg(long)]
    pub(crate) out_dir: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FilterArgs {
    /// Free-text search over name, country, year, email, role, region, language and comments
    #[arg(long)]
    pub(crate) query: Option<String>,
    /// Exact year
    #[arg(long)]
    pub(crate) year: Option<String>,
    /// Exact country
    #[arg(long)]
    pub(crate) country: Option<String>,
    /// Exact program code
    #[arg(long)]
    pub(crate) program: Option<String>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter {
            q: args.query,
            year: args.year,
            country: args.country,
            program: args.program,
        }
    }
}

fn load_records(path: &Path) -> Result<Vec<AlumniRecord>, AppError> {
    let store = InMemoryDocumentStore::from_path(path)?;
    Ok(store
        .list()?
        .iter()
        .map(AlumniRecord::from_document)
        .collect())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let records = load_records(&args.data)?;
    let report = DirectoryReport::build(&records);

    println!("Alumni directory report");
    println!("Records: {}", records.len());
    println!("Years: {}", report.facets.years.join(", "));
    println!("Programs: {}", report.facets.programs.join(", "));
    println!();

    println!("Attendance by year");
    if report.attendance_by_year.is_empty() {
        println!("- no year data");
    }
    for row in &report.attendance_by_year {
        println!("- {}: {}", row.year, format_counts(&row.counts));
    }
    println!();

    println!("Top countries");
    if report.top_countries.is_empty() {
        println!("- no country data");
    }
    for row in &report.top_countries {
        println!(
            "- {} ({} total): {}",
            row.country,
            row.total(),
            format_counts(&row.counts)
        );
    }

    if args.list_records {
        let filtered = RecordFilter::from(args.filter).apply(&records);
        println!();
        println!("Matching records ({})", filtered.len());
        let rendered = serde_json::to_string_pretty(&filtered).map_err(std::io::Error::from)?;
        println!("{rendered}");
    }

    Ok(())
}

fn format_counts(counts: &alumni_directory::directory::report::ProgramCounts) -> String {
    counts
        .iter()
        .map(|(program, count)| format!("{program}={count}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let records = load_records(&args.data)?;
    let filtered = RecordFilter::from(args.filter).apply(&records);

    let file = ExportSheet::from_records(&filtered)
        .encode(args.format)
        .map_err(ServiceError::from)?;

    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => AppConfig::load()?.directory.export_dir,
    };
    let path = out_dir.join(&file.file_name);
    std::fs::write(&path, &file.bytes)?;
    println!("Wrote {} rows to {}", filtered.len(), path.display());
    Ok(())
}
