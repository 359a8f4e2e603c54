//! Standalone validation of sample files.

use super::csv::{decode_line, parse_header, parse_row};
use crate::config::DataConfig;
use crate::error::{KohonenError, Result};
use log::{info, warn};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A problem found on one line of a validated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based line number (the header is line 1).
    pub line: usize,
    /// Description of the problem.
    pub message: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Outcome of validating a sample file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of data rows that parsed cleanly.
    pub valid_rows: usize,
    /// Every problem found, in file order.
    pub issues: Vec<RowIssue>,
}

impl ValidationReport {
    /// True when the header and every row are well formed.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Total number of data rows inspected.
    pub fn total_rows(&self) -> usize {
        self.valid_rows + self.issues.iter().filter(|i| i.line > 1).count()
    }
}

/// Validates a sample file without loading it into a dataset.
///
/// Unlike [`Dataset::load`](super::Dataset::load), this keeps scanning after
/// a bad row so every offending line is reported. Only a file that cannot be
/// opened or read is an error.
pub fn validate_file<P: AsRef<Path>>(
    path: P,
    input_size: usize,
    config: &DataConfig,
) -> Result<ValidationReport> {
    let path = path.as_ref();
    config.validate()?;
    let file = File::open(path).map_err(|e| KohonenError::unavailable(path, e))?;
    let mut lines = BufReader::new(file).lines();
    let mut report = ValidationReport::default();

    match lines.next() {
        Some(header) => {
            let checked = decode_line(header)?
                .and_then(|header| parse_header(&header, input_size, config));
            if let Err(message) = checked {
                report.issues.push(RowIssue { line: 1, message });
            }
        }
        None => {
            report.issues.push(RowIssue {
                line: 1,
                message: "empty file or no header".to_string(),
            });
            return Ok(report);
        }
    }

    for (i, line) in lines.enumerate() {
        let line = match decode_line(line)? {
            Ok(line) => line,
            Err(message) => {
                report.issues.push(RowIssue { line: i + 2, message });
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(&line, input_size, config) {
            Ok(_) => report.valid_rows += 1,
            Err(message) => report.issues.push(RowIssue { line: i + 2, message }),
        }
    }

    if report.is_valid() {
        info!("Validated {} rows in {}", report.valid_rows, path.display());
    } else {
        for issue in &report.issues {
            warn!("{}: {}", path.display(), issue);
        }
    }
    Ok(report)
}
