//! Persisting finished reports and the metadata kept about them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::chart::ChartRenderer;
use crate::config::LayoutConfig;
use crate::error::Error;
use crate::model::{ReportData, ReportKind};
use crate::report;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    pub kind: ReportKind,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Human-readable, e.g. `"48.12 KB"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Local>,
}

impl ReportRecord {
    pub fn new(id: impl Into<String>, kind: ReportKind) -> Self {
        ReportRecord {
            id: id.into(),
            kind,
            status: ReportStatus::Pending,
            file_path: None,
            file_size: None,
            error: None,
            created_at: Local::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredReport {
    pub path: PathBuf,
    pub size: String,
}

pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{:.2} MB", b / (KB * KB))
    }
}

fn validate_id(report_id: &str) -> Result<(), Error> {
    let bad = report_id.trim().is_empty()
        || report_id == "."
        || report_id == ".."
        || report_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidInput(format!(
            "report id '{report_id}' cannot be used as a file name"
        )));
    }
    Ok(())
}

/// Write `<dir>/<report_id>.pdf`, creating `dir` if needed.
pub fn save_report(dir: &Path, report_id: &str, bytes: &[u8]) -> Result<StoredReport, Error> {
    validate_id(report_id)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{report_id}.pdf"));
    std::fs::write(&path, bytes).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    log::info!("saved report {} ({} bytes)", path.display(), bytes.len());
    Ok(StoredReport {
        path,
        size: format_size(bytes.len()),
    })
}

/// Generate and persist the report described by `record`, updating its
/// status. On failure nothing is written and the error is kept on the
/// record as well as returned.
pub fn run_report(
    record: &mut ReportRecord,
    data: &ReportData,
    config: LayoutConfig,
    charts: &dyn ChartRenderer,
    out_dir: &Path,
) -> Result<StoredReport, Error> {
    let result = validate_id(&record.id)
        .and_then(|()| report::generate(data, record.kind, config, charts))
        .and_then(|bytes| save_report(out_dir, &record.id, &bytes));

    match result {
        Ok(stored) => {
            record.status = ReportStatus::Completed;
            record.file_path = Some(stored.path.clone());
            record.file_size = Some(stored.size.clone());
            record.error = None;
            Ok(stored)
        }
        Err(e) => {
            log::error!("report {} failed: {e}", record.id);
            record.status = ReportStatus::Failed;
            record.file_path = None;
            record.file_size = None;
            record.error = Some(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn ids_must_be_plain_file_names() {
        assert!(validate_id("r-2024-03").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("a\\b").is_err());
    }

    #[test]
    fn new_records_are_pending() {
        let record = ReportRecord::new("r1", ReportKind::Glucose);
        assert_eq!(record.status, ReportStatus::Pending);
        assert!(record.file_path.is_none());
    }
}
