use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Deserialize;

use super::domain::{AlumniRecord, RecordField};

pub const EXPORT_FILE_STEM: &str = "Alumni_Report";
pub const EXPORT_SHEET_NAME: &str = "Alumni Data";

/// Column headers, in export order.
pub fn export_headers() -> [&'static str; 13] {
    RecordField::ALL.map(RecordField::header)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn file_name(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported export format '{other}' (use xlsx or csv)")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No alumni to export. Please adjust your filters.")]
    Empty,
    #[error("failed to encode spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to encode csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish csv output: {0}")]
    CsvFlush(String),
}

/// Flat, human-readable table of the currently filtered records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSheet {
    rows: Vec<[String; 13]>,
}

impl ExportSheet {
    pub fn from_records(records: &[AlumniRecord]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                RecordField::ALL.map(|field| record.get(field).unwrap_or_default().to_string())
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[[String; 13]] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn encode(&self, format: ExportFormat) -> Result<ExportFile, ExportError> {
        if self.is_empty() {
            return Err(ExportError::Empty);
        }
        let bytes = match format {
            ExportFormat::Xlsx => self.to_xlsx()?,
            ExportFormat::Csv => self.to_csv()?,
        };
        Ok(ExportFile {
            file_name: format.file_name(),
            content_type: format.content_type(),
            bytes,
        })
    }

    fn to_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(EXPORT_SHEET_NAME)?;

        for (col, header) in export_headers().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (index, row) in self.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(row_num, col as u16, value)?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(export_headers())?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|err| ExportError::CsvFlush(err.to_string()))
    }
}

/// Encoded export ready to be written to disk or returned as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::domain::{RecordFields, RecordId};

    fn records() -> Vec<AlumniRecord> {
        vec![AlumniRecord {
            id: RecordId("1".to_string()),
            fields: RecordFields {
                name: Some("Ngozi, A.".to_string()),
                program: Some("AVCN".to_string()),
                year: Some("2023".to_string()),
                is_nitag_member: Some("Yes".to_string()),
                ..RecordFields::default()
            },
        }]
    }

    #[test]
    fn headers_are_fixed() {
        assert_eq!(
            export_headers(),
            [
                "Name",
                "Program",
                "Year",
                "Country",
                "Nationality",
                "Email",
                "Role",
                "Current Position",
                "Institution",
                "NITAG Member",
                "Region",
                "Language",
                "Comments",
            ]
        );
    }

    #[test]
    fn empty_sheet_is_rejected() {
        let sheet = ExportSheet::from_records(&[]);
        assert!(matches!(
            sheet.encode(ExportFormat::Xlsx),
            Err(ExportError::Empty)
        ));
    }

    #[test]
    fn csv_export_quotes_and_blanks_missing_cells() {
        let file = ExportSheet::from_records(&records())
            .encode(ExportFormat::Csv)
            .expect("csv encodes");

        assert_eq!(file.file_name, "Alumni_Report.csv");
        let text = String::from_utf8(file.bytes).expect("utf8");
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Name,Program,Year,Country"));
        assert_eq!(
            lines.next().unwrap(),
            "\"Ngozi, A.\",AVCN,2023,,,,,,,Yes,,,"
        );
    }

    #[test]
    fn xlsx_export_produces_a_zip_container() {
        let file = ExportSheet::from_records(&records())
            .encode(ExportFormat::Xlsx)
            .expect("xlsx encodes");

        assert_eq!(file.file_name, "Alumni_Report.xlsx");
        assert!(file.bytes.starts_with(b"PK"));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("Excel".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
