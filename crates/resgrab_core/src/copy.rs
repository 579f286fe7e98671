//! Manifest entry resolution and copy orchestration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::report::{ReportGrab, ReportGrabBuilder};
use crate::spec::{
    EnumMissingReason, EnumResourceStatus, ResGrabError, Result, SpecGrabOptions,
    SpecResourceOutcome, SpecRunContext,
};
use crate::util::{copy_file_with_metadata, derive_entry_path, validate_destination_path_safety};

#[derive(Debug)]
struct SpecGrabContext {
    path_dir_content_root: PathBuf,
    path_dir_output: PathBuf,
    if_dry_run: bool,
    builder_grab_report: ReportGrabBuilder,
}

/// Resolve every entry against the content root and copy it into the map
/// output directory, mirroring the entry's relative path.
///
/// This function performs, per entry and in manifest order:
/// 1. Source resolution under `<map dir>/..` and destination derivation under
///    `<output_root>/<artifact_name>`.
/// 2. Destination safety check (no escape from the output directory).
/// 3. Parent directory creation (idempotent).
/// 4. Metadata-preserving copy when the source is a regular file.
///
/// Every entry yields exactly one outcome; a failed entry is recorded as
/// missing and never stops the run. Returns [`ResGrabError`] only when the
/// output directory cannot be created or `flag_interrupt` is raised.
pub fn grab_resources<S: AsRef<str>>(
    spec_run_ctx: &SpecRunContext,
    entries: &[S],
    spec_grab_options: &SpecGrabOptions,
    flag_interrupt: &AtomicBool,
) -> Result<ReportGrab> {
    let path_dir_output = spec_run_ctx.path_dir_output();
    if spec_grab_options.if_dry_run {
        info!(output = %path_dir_output.display(), "Dry run; filesystem is left untouched");
    } else {
        info!(output = %path_dir_output.display(), "Creating output directory");
        fs::create_dir_all(&path_dir_output).map_err(|e| {
            ResGrabError::DestinationInitFailed {
                path: path_dir_output.clone(),
                message: e.to_string(),
            }
        })?;
    }

    let mut spec_grab_ctx = SpecGrabContext {
        path_dir_content_root: spec_run_ctx.path_dir_content_root(),
        path_dir_output,
        if_dry_run: spec_grab_options.if_dry_run,
        builder_grab_report: ReportGrabBuilder::default(),
    };

    for entry in entries {
        if flag_interrupt.load(Ordering::SeqCst) {
            return Err(ResGrabError::Interrupted);
        }
        let outcome = handle_entry(entry.as_ref(), &spec_grab_ctx);
        if let EnumResourceStatus::Missing(EnumMissingReason::CopyFailed(message)) = &outcome.status
        {
            spec_grab_ctx
                .builder_grab_report
                .add_warning(format!("{}: {message}", outcome.entry));
        }
        spec_grab_ctx.builder_grab_report.add_outcome(outcome);
    }

    Ok(spec_grab_ctx
        .builder_grab_report
        .build(spec_grab_ctx.path_dir_output, spec_grab_ctx.if_dry_run))
}

fn handle_entry(entry: &str, spec_grab_ctx: &SpecGrabContext) -> SpecResourceOutcome {
    let path_file_src = derive_entry_path(&spec_grab_ctx.path_dir_content_root, entry);
    let path_file_dst = derive_entry_path(&spec_grab_ctx.path_dir_output, entry);
    let status = resolve_status(
        &path_file_src,
        &path_file_dst,
        &spec_grab_ctx.path_dir_output,
        spec_grab_ctx.if_dry_run,
    );

    match &status {
        EnumResourceStatus::Copied => debug!(entry, "Copied"),
        EnumResourceStatus::Missing(reason) => warn!(entry, ?reason, "Missing"),
    }
    SpecResourceOutcome {
        entry: entry.to_string(),
        path_file_src,
        path_file_dst,
        status,
    }
}

fn resolve_status(
    path_file_src: &Path,
    path_file_dst: &Path,
    path_dir_output: &Path,
    if_dry_run: bool,
) -> EnumResourceStatus {
    if let Err(message) = validate_destination_path_safety(path_file_dst, path_dir_output) {
        return EnumResourceStatus::Missing(EnumMissingReason::UnsafeDestination(message));
    }

    if !if_dry_run {
        if let Some(path_dir_parent) = path_file_dst.parent() {
            if let Err(e) = fs::create_dir_all(path_dir_parent) {
                return EnumResourceStatus::Missing(EnumMissingReason::CopyFailed(format!(
                    "Failed to create {} ({e})",
                    path_dir_parent.display()
                )));
            }
        }
    }

    match fs::metadata(path_file_src) {
        Ok(meta_src) if meta_src.is_file() => {}
        Ok(_) => return EnumResourceStatus::Missing(EnumMissingReason::NotRegularFile),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return EnumResourceStatus::Missing(EnumMissingReason::NotFound);
        }
        Err(e) => {
            return EnumResourceStatus::Missing(EnumMissingReason::CopyFailed(e.to_string()));
        }
    }

    if if_dry_run {
        return EnumResourceStatus::Copied;
    }
    match copy_resource(path_file_src, path_file_dst) {
        Ok(_) => EnumResourceStatus::Copied,
        Err(e) => EnumResourceStatus::Missing(EnumMissingReason::CopyFailed(e.to_string())),
    }
}

fn copy_resource(path_file_src: &Path, path_file_dst: &Path) -> Result<u64> {
    copy_file_with_metadata(path_file_src, path_file_dst).map_err(|e| ResGrabError::CopyFailed {
        path: path_file_src.to_path_buf(),
        message: e.to_string(),
    })
}
