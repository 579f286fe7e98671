//! Stage driver: acquire → parse → filter → copy → report.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::copy::grab_resources;
use crate::manifest::{EnumManifestSource, ManifestGenerator, acquire_manifest, read_manifest};
use crate::pattern::SpecEntryPatterns;
use crate::report::{ReportGrab, write_missing_report};
use crate::spec::{ResGrabError, Result, SpecGrabOptions, SpecRunContext};

/// How a run ended when no fatal error occurred.
#[derive(Debug)]
pub enum EnumRunOutcome {
    /// Manifest referenced nothing (after filters); no output was created.
    NoResources { manifest: EnumManifestSource },
    /// Copy phase ran; `path_file_report` is set when `missing.txt` was written.
    Completed {
        manifest: EnumManifestSource,
        report: ReportGrab,
        path_file_report: Option<std::path::PathBuf>,
    },
}

/// Run the whole grab pipeline for one map.
///
/// Manifest acquisition and read failures are returned as errors. A failed
/// report write is downgraded to a warning stored in the report.
pub fn run_grab<F, G>(
    spec_run_ctx: &SpecRunContext,
    spec_grab_options: &SpecGrabOptions,
    derive_generator: F,
    flag_interrupt: &AtomicBool,
) -> Result<EnumRunOutcome>
where
    F: FnOnce() -> Result<G>,
    G: ManifestGenerator,
{
    let spec_pats = SpecEntryPatterns::from_options(spec_grab_options)?;

    let manifest = acquire_manifest(spec_run_ctx, derive_generator)?;
    if flag_interrupt.load(Ordering::SeqCst) {
        return Err(ResGrabError::Interrupted);
    }

    let l_entries = spec_pats.apply(read_manifest(manifest.path())?);
    if l_entries.is_empty() {
        warn!(manifest = %manifest.path().display(), "No resources found in the manifest");
        return Ok(EnumRunOutcome::NoResources { manifest });
    }
    info!(count = l_entries.len(), "Resources detected");

    let mut report = grab_resources(spec_run_ctx, &l_entries, spec_grab_options, flag_interrupt)?;

    let mut path_file_report = None;
    if !spec_grab_options.if_dry_run {
        let res_report = write_missing_report(spec_run_ctx, &report.missing_entries());
        match res_report {
            Ok(v) => path_file_report = v,
            Err(e) => {
                warn!(error = %e, "Could not save missing-file report");
                report.warnings.push(e.to_string());
            }
        }
    }

    Ok(EnumRunOutcome::Completed {
        manifest,
        report,
        path_file_report,
    })
}
