//! Export writer: copies marked documents into `exports/<mark>/` and writes
//! `report.csv` and `report.xlsx` next to them.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::mark::Mark;

/// One copied document, as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mark: Mark,
    /// Absolute destination path.
    pub path: PathBuf,
}

/// Owns the exports directory for the duration of one export.
pub struct ExportWriter {
    dir: PathBuf,
    written: Vec<ExportedFile>,
}

impl ExportWriter {
    /// Wipe and recreate the exports directory. Every export starts clean.
    pub fn reset(dir: &Path) -> CatalogResult<Self> {
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(|e| CatalogError::Export {
                message: format!("clear {}: {e}", dir.display()),
            })?;
        }
        std::fs::create_dir_all(dir).map_err(|e| CatalogError::Export {
            message: format!("create {}: {e}", dir.display()),
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: Vec::new(),
        })
    }

    /// Copy `source` to `<dir>/<mark>/<filename>`.
    pub fn copy(&mut self, source: &Path, filename: &str, mark: Mark) -> CatalogResult<()> {
        let subdir = self.dir.join(mark.as_str());
        std::fs::create_dir_all(&subdir).map_err(|e| CatalogError::Export {
            message: format!("create {}: {e}", subdir.display()),
        })?;
        let dest = subdir.join(filename);
        std::fs::copy(source, &dest).map_err(|e| CatalogError::Export {
            message: format!("copy {} -> {}: {e}", source.display(), dest.display()),
        })?;
        let path = std::path::absolute(&dest).unwrap_or(dest);
        tracing::debug!(file = filename, %mark, dest = %path.display(), "exported");
        self.written.push(ExportedFile {
            filename: filename.to_string(),
            mark,
            path,
        });
        Ok(())
    }

    /// Write both reports and return the exported files.
    pub fn finish(self) -> CatalogResult<Vec<ExportedFile>> {
        write_report(&self.dir.join("report.csv"), &self.written)?;
        write_xlsx_report(&self.dir.join("report.xlsx"), &self.written)?;
        Ok(self.written)
    }
}

const REPORT_HEADER: [&str; 3] = ["filename", "mark", "path"];

fn write_report(path: &Path, rows: &[ExportedFile]) -> CatalogResult<()> {
    let csv_err = |e: csv::Error| CatalogError::Export {
        message: format!("write {}: {e}", path.display()),
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record(REPORT_HEADER)
        .map_err(csv_err)?;
    for row in rows {
        let dest = row.path.display().to_string();
        writer
            .write_record([row.filename.as_str(), row.mark.as_str(), dest.as_str()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| CatalogError::Export {
        message: format!("flush {}: {e}", path.display()),
    })
}

/// Same rows as the CSV report, one worksheet with a bold header.
fn write_xlsx_report(path: &Path, rows: &[ExportedFile]) -> CatalogResult<()> {
    let xlsx_err = |e: XlsxError| CatalogError::Export {
        message: format!("write {}: {e}", path.display()),
    };
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("report").map_err(xlsx_err)?;

    let bold = Format::new().set_bold();
    for (col, title) in (0u16..).zip(REPORT_HEADER) {
        sheet
            .write_string_with_format(0, col, title, &bold)
            .map_err(xlsx_err)?;
    }
    for (row, file) in (1u32..).zip(rows) {
        let dest = file.path.display().to_string();
        sheet.write_string(row, 0, &file.filename).map_err(xlsx_err)?;
        sheet.write_string(row, 1, file.mark.as_str()).map_err(xlsx_err)?;
        sheet.write_string(row, 2, &dest).map_err(xlsx_err)?;
    }
    workbook.save(path).map_err(xlsx_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_previous_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("exports");
        std::fs::create_dir_all(dir.join("A")).unwrap();
        std::fs::write(dir.join("A").join("old.txt"), "old").unwrap();

        let writer = ExportWriter::reset(&dir).unwrap();
        assert!(!dir.join("A").exists());
        let written = writer.finish().unwrap();
        assert!(written.is_empty());

        let report = std::fs::read_to_string(dir.join("report.csv")).unwrap();
        assert_eq!(report, "filename,mark,path\n");
        assert!(dir.join("report.xlsx").is_file());
    }

    #[test]
    fn copies_into_mark_subdirectory_and_reports() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("a.txt");
        std::fs::write(&src, "alpha").unwrap();
        let dir = tmp.path().join("exports");

        let mut writer = ExportWriter::reset(&dir).unwrap();
        writer.copy(&src, "a.txt", Mark::B).unwrap();
        let written = writer.finish().unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].path.is_absolute());
        assert_eq!(std::fs::read_to_string(dir.join("B").join("a.txt")).unwrap(), "alpha");

        let mut reader = csv::Reader::from_path(dir.join("report.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "a.txt");
        assert_eq!(&rows[0][1], "B");

        let xlsx = std::fs::read(dir.join("report.xlsx")).unwrap();
        // XLSX is a zip container.
        assert!(xlsx.starts_with(b"PK"));
    }
}
