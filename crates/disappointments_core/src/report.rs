//! Report Exporter
//!
//! Writes the ledger to an xlsx workbook at a fixed path, replacing whatever
//! was there before. The workbook is written next to the destination and
//! renamed over it, so readers only ever see a complete file.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::{CoreError, Result, disappointment::Disappointment};

pub const SHEET_NAME: &str = "All disappointments";
pub const TITLES: [&str; 4] = ["Created at", "From user", "To User", "Reason"];
pub const COLUMN_WIDTHS: [f64; 4] = [15.0, 10.0, 10.0, 100.0];
pub const DATE_FORMAT: &str = "mmmm d yyyy";

/// One data row of the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Local time, already shifted by the exporter's offset
    pub created_at: NaiveDateTime,
    pub from_user: String,
    pub to_user: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ReportExporter {
    path: PathBuf,
    utc_offset: Duration,
    /// Serializes writers sharing the staging file
    write_lock: Arc<Mutex<()>>,
}

impl ReportExporter {
    pub fn new(path: impl Into<PathBuf>, utc_offset: Duration) -> Self {
        Self {
            path: path.into(),
            utc_offset,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self, entries: &[Disappointment]) -> Vec<ReportRow> {
        entries
            .iter()
            .map(|d| ReportRow {
                created_at: (d.created_at + self.utc_offset).naive_utc(),
                from_user: d.from_user.name.clone(),
                to_user: d.to_user.name.clone(),
                reason: d.reason.clone(),
            })
            .collect()
    }

    /// Write `entries` to the configured path and return it
    pub fn export(&self, entries: &[Disappointment]) -> Result<PathBuf> {
        self.export_to(entries, &self.path)?;
        Ok(self.path.clone())
    }

    /// Write `entries` to an explicit destination
    pub fn export_to(&self, entries: &[Disappointment], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| CoreError::ReportFailed {
                    path: path.display().to_string(),
                    cause: XlsxError::IoError(e),
                })?;
            }
        }

        let rows = self.rows(entries);
        let staging = staging_path(path);

        let _guard = self.write_lock.lock();
        write_workbook(&rows, &staging)
            .and_then(|()| std::fs::rename(&staging, path).map_err(XlsxError::IoError))
            .map_err(|cause| {
                let _ = std::fs::remove_file(&staging);
                CoreError::ReportFailed {
                    path: path.display().to_string(),
                    cause,
                }
            })?;

        tracing::info!("Exported {} disappointments to {}", rows.len(), path.display());
        Ok(())
    }
}

/// `report.xlsx` is staged as `report.xlsx.tmp` in the same directory
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("report.xlsx"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_workbook(rows: &[ReportRow], path: &Path) -> std::result::Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let title_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (col, title) in TITLES.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &title_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let line = i as u32 + 1;
        worksheet.write_datetime_with_format(line, 0, &row.created_at, &date_format)?;
        worksheet.write_string(line, 1, row.from_user.as_str())?;
        worksheet.write_string(line, 2, row.to_user.as_str())?;
        worksheet.write_string(line, 3, row.reason.as_str())?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        id::{DisappointmentId, ExternalId, UserId},
        users::User,
    };
    use chrono::{NaiveDate, TimeZone, Utc};

    fn entry(from: &str, to: &str, hour: u32) -> Disappointment {
        let user = |name: &str| User {
            id: UserId::generate(),
            name: name.to_string(),
            external_id: ExternalId(7),
            quota: 3,
        };
        Disappointment {
            id: DisappointmentId::generate(),
            reason: "late again".to_string(),
            from_user: user(from),
            to_user: user(to),
            created_at: Utc.with_ymd_and_hms(2023, 1, 31, hour, 30, 0).unwrap(),
        }
    }

    /// Unzip one part of a written workbook
    fn read_part(path: &Path, name: &str) -> String {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        std::io::Read::read_to_string(&mut part, &mut xml).unwrap();
        xml
    }

    /// The XML of one element, from its opening tag to `end`
    fn element<'a>(xml: &'a str, start: &str, end: &str) -> &'a str {
        let from = xml.find(start).unwrap_or_else(|| panic!("{start} missing"));
        let rest = &xml[from..];
        let to = rest.find(end).unwrap_or_else(|| panic!("{start} unterminated"));
        &rest[..to + end.len()]
    }

    fn attribute(element: &str, name: &str) -> String {
        let start = format!(r#" {name}=""#);
        let from = element.find(&start).unwrap() + start.len();
        let len = element[from..].find('"').unwrap();
        element[from..from + len].to_string()
    }

    /// Width of a 1-based column; ranges of equal columns may share a `<col>`
    fn column_width(sheet: &str, column: u32) -> f64 {
        sheet
            .match_indices("<col ")
            .map(|(i, _)| element(&sheet[i..], "<col ", "/>"))
            .find(|col| {
                let min: u32 = attribute(col, "min").parse().unwrap();
                let max: u32 = attribute(col, "max").parse().unwrap();
                (min..=max).contains(&column)
            })
            .map(|col| attribute(col, "width").parse().unwrap())
            .unwrap_or_else(|| panic!("no width for column {column}"))
    }

    #[test]
    fn test_written_sheet_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let exporter = ReportExporter::new(&path, Duration::hours(6));
        exporter
            .export(&[entry("Eldos", "Rustam", 20), entry("Rustam", "Eldos", 9)])
            .unwrap();

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<dimension ref="A1:D3"/>"#));

        // Header is bold, dates use the month-day-year format
        let styles = read_part(&path, "xl/styles.xml");
        assert!(styles.contains("<b/>"));
        assert!(styles.contains(r#"formatCode="mmmm d yyyy""#));
        assert!(element(&sheet, r#"<c r="A1""#, ">").contains(r#"s="1""#));
        assert!(element(&sheet, r#"<c r="D1""#, ">").contains(r#"s="1""#));

        // 2023-01-31 20:30 UTC is 2023-02-01 02:30 at +6
        let a2 = element(&sheet, r#"<c r="A2""#, "</c>");
        assert!(a2.contains(r#"s="2""#));
        assert!(a2.contains("<v>44958.10416"), "{a2}");

        for (col, expected) in COLUMN_WIDTHS.iter().enumerate() {
            let width = column_width(&sheet, col as u32 + 1);
            // Stored widths carry the cell padding on top of the requested width
            assert!(width >= *expected && width < expected + 1.0, "column {col}: {width}");
        }

        let workbook = read_part(&path, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="All disappointments""#));
    }

    #[test]
    fn test_concurrent_exports_leave_a_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let exporter = ReportExporter::new(&path, Duration::hours(6));
        let entries: Vec<Disappointment> =
            (0..50).map(|i| entry("Eldos", "Rustam", i % 24)).collect();

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let exporter = exporter.clone();
                let entries = entries.clone();
                std::thread::spawn(move || exporter.export(&entries).unwrap())
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<dimension ref="A1:D51"/>"#));
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_failed_export_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        // The destination is a directory, so the final rename fails
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        let exporter = ReportExporter::new(&path, Duration::hours(6));

        let err = exporter.export(&[entry("Eldos", "Rustam", 1)]).unwrap_err();
        assert!(matches!(err, CoreError::ReportFailed { .. }));
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_rows_shift_timestamps() {
        let exporter = ReportExporter::new("unused.xlsx", Duration::hours(6));
        let rows = exporter.rows(&[entry("Eldos", "Rustam", 20)]);

        let expected = NaiveDate::from_ymd_opt(2023, 2, 1)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(rows[0].created_at, expected);
        assert_eq!(rows[0].from_user, "Eldos");
        assert_eq!(rows[0].to_user, "Rustam");
    }

    #[test]
    fn test_export_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.xlsx");
        let exporter = ReportExporter::new(&path, Duration::hours(6));

        exporter.export(&[entry("Eldos", "Rustam", 1)]).unwrap();
        let first = std::fs::metadata(&path).unwrap().len();
        assert!(first > 0);

        let written = exporter.export(&[]).unwrap();
        assert_eq!(written, path);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
