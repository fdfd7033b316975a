//! Date stamps for output file names
//!
//! The final output can carry an ISO date suffix (`report_2024-11-20.pdf`),
//! and every intermediate artifact is named after the output plus its stage
//! and the date (`report_merged_2024-11-20.pdf`).

use std::path::{Path, PathBuf};
use chrono::{Local, NaiveDate};

const DEFAULT_EXTENSION: &str = "pdf";

/// Today's date in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date as `YYYY-MM-DD`
pub fn iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Insert `_YYYY-MM-DD` between the file stem and extension
///
/// `out/report.pdf` becomes `out/report_2024-11-20.pdf`. A path without an
/// extension gets `.pdf`.
pub fn dated_path(path: &Path, date: &NaiveDate) -> PathBuf {
    with_stem_suffix(path, &iso_date(date))
}

/// Path of an intermediate artifact for `stage`, next to the final output
pub fn artifact_path(output: &Path, stage: &str, date: &NaiveDate) -> PathBuf {
    with_stem_suffix(output, &format!("{}_{}", stage, iso_date(date)))
}

fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    path.with_file_name(format!("{}_{}.{}", stem, suffix, extension))
}
