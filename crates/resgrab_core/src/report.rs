//! Grab report models, summary view and the `missing.txt` writer.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::spec::{ResGrabError, Result, SpecResourceOutcome, SpecRunContext};

/// Per-entry outcomes and diagnostics for one grab run.
#[derive(Debug, Default, Clone)]
pub struct ReportGrab {
    /// One outcome per manifest entry, in manifest order.
    pub outcomes: Vec<SpecResourceOutcome>,
    /// Non-fatal warnings collected during the run.
    pub warnings: Vec<String>,
    /// `<output_root>/<artifact_name>`.
    pub path_dir_output: PathBuf,
    /// Whether the run only recorded what would happen.
    pub if_dry_run: bool,
}

impl ReportGrab {
    pub fn cnt_total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn cnt_missing(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_missing()).count()
    }

    pub fn cnt_copied(&self) -> usize {
        self.cnt_total() - self.cnt_missing()
    }

    /// Original relative entries that were not copied, in manifest order.
    pub fn missing_entries(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_missing())
            .map(|o| o.entry.as_str())
            .collect()
    }

    /// Display view; recomputed on every call.
    pub fn summary(&self) -> SpecSummary {
        SpecSummary {
            cnt_total: self.cnt_total(),
            cnt_copied: self.cnt_copied(),
            cnt_missing: self.cnt_missing(),
            path_dir_output: self.path_dir_output.clone(),
            if_dry_run: self.if_dry_run,
        }
    }
}

/// Derived counters for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSummary {
    pub cnt_total: usize,
    pub cnt_copied: usize,
    pub cnt_missing: usize,
    pub path_dir_output: PathBuf,
    pub if_dry_run: bool,
}

impl SpecSummary {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_total".to_string(), self.cnt_total as u64);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied as u64);
        dict_counts.insert("cnt_missing".to_string(), self.cnt_missing as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let c_verb = if self.if_dry_run { "would_copy" } else { "copied" };
        format!(
            "{prefix} total={} {c_verb}={} missing={} output={}",
            self.cnt_total,
            self.cnt_copied,
            self.cnt_missing,
            self.path_dir_output.display()
        )
    }
}

impl fmt::Display for SpecSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[GRAB]"))
    }
}

/// Mutable accumulator for grab outcomes.
#[derive(Debug, Default, Clone)]
pub struct ReportGrabBuilder {
    /// See [`ReportGrab::outcomes`].
    pub outcomes: Vec<SpecResourceOutcome>,
    /// See [`ReportGrab::warnings`].
    pub warnings: Vec<String>,
}

impl ReportGrabBuilder {
    /// Record the outcome of one entry.
    pub fn add_outcome(&mut self, outcome: SpecResourceOutcome) {
        self.outcomes.push(outcome);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Finalize builder into report.
    pub fn build(self, path_dir_output: PathBuf, if_dry_run: bool) -> ReportGrab {
        ReportGrab {
            outcomes: self.outcomes,
            warnings: self.warnings,
            path_dir_output,
            if_dry_run,
        }
    }
}

/// Write the missing entries of a run to `missing.txt`, one per line.
///
/// With no missing entries nothing is written and a report left by an earlier
/// run is removed. The file is staged next to its final location and renamed
/// so readers never observe a partial report.
///
/// Returns the report path when a file was written.
pub fn write_missing_report<S: AsRef<str>>(
    spec_run_ctx: &SpecRunContext,
    missing: &[S],
) -> Result<Option<PathBuf>> {
    let path_file_report = spec_run_ctx.path_file_report_missing();
    let map_err = |source: io::Error| ResGrabError::ReportWriteFailed {
        path: path_file_report.clone(),
        source,
    };

    if missing.is_empty() {
        match fs::remove_file(&path_file_report) {
            Ok(()) => info!(report = %path_file_report.display(), "Removed stale report"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(map_err(e)),
        }
        return Ok(None);
    }

    let mut txt = String::new();
    for entry in missing {
        txt.push_str(entry.as_ref());
        txt.push('\n');
    }

    if let Some(path_dir_parent) = path_file_report.parent() {
        fs::create_dir_all(path_dir_parent).map_err(map_err)?;
    }
    write_file_atomic(&path_file_report, txt.as_bytes()).map_err(map_err)?;
    info!(
        report = %path_file_report.display(),
        missing = missing.len(),
        "Missing-file report written"
    );
    Ok(Some(path_file_report))
}

fn write_file_atomic(path_file: &Path, raw: &[u8]) -> Result<(), io::Error> {
    let mut c_name_tmp = path_file
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    c_name_tmp.push(".tmp");
    let path_file_tmp = path_file.with_file_name(c_name_tmp);

    fs::write(&path_file_tmp, raw)?;
    if let Err(e) = fs::rename(&path_file_tmp, path_file) {
        let _ = fs::remove_file(&path_file_tmp);
        return Err(e);
    }
    Ok(())
}
