//! Run context, options, per-entry outcome models and the error type.

use std::io;
use std::path::{Path, PathBuf};

use crate::conf::{C_EXT_MANIFEST, C_NAME_REPORT_MISSING};
use crate::util::{absolutize_path, normalize_path_lexical};

/// Crate-wide result alias.
pub type Result<T, E = ResGrabError> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Pattern matching mode for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// Why an entry ended up in the missing list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumMissingReason {
    /// Source path does not exist under the content root.
    NotFound,
    /// Source path exists but is a directory or special file.
    NotRegularFile,
    /// Destination would land outside the map output directory.
    UnsafeDestination(String),
    /// Directory creation or copy failed.
    CopyFailed(String),
}

/// Resolution result for one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumResourceStatus {
    /// Source copied to destination (or would be, in dry-run).
    Copied,
    /// Source not found or not copied.
    Missing(EnumMissingReason),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Immutable per-run context shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRunContext {
    path_dir_output_root: PathBuf,
    path_file_artifact: PathBuf,
    name_artifact: String,
}

impl SpecRunContext {
    /// Build a context for `file_artifact`, writing under `dir_output_root`.
    ///
    /// Both paths are made absolute. Fails with
    /// [`ResGrabError::ArtifactNotFound`] when the map is not a regular file.
    pub fn new<P, Q>(dir_output_root: P, file_artifact: Q) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let path_file_artifact = normalize_path_lexical(&absolutize_path(file_artifact.as_ref()));
        if !path_file_artifact.is_file() {
            return Err(ResGrabError::ArtifactNotFound(path_file_artifact));
        }
        let name_artifact = path_file_artifact
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| ResGrabError::ArtifactNotFound(path_file_artifact.clone()))?;

        Ok(Self {
            path_dir_output_root: normalize_path_lexical(&absolutize_path(
                dir_output_root.as_ref(),
            )),
            path_file_artifact,
            name_artifact,
        })
    }

    /// Output root chosen by the operator.
    pub fn path_dir_output_root(&self) -> &Path {
        &self.path_dir_output_root
    }

    /// Absolute path of the map file.
    pub fn path_file_artifact(&self) -> &Path {
        &self.path_file_artifact
    }

    /// Map file name without extension.
    pub fn name_artifact(&self) -> &str {
        &self.name_artifact
    }

    /// Directory containing the map file.
    pub fn path_dir_artifact(&self) -> &Path {
        self.path_file_artifact
            .parent()
            .unwrap_or(Path::new("/"))
    }

    /// Directory manifest entries are relative to: one level above the map directory.
    pub fn path_dir_content_root(&self) -> PathBuf {
        normalize_path_lexical(&self.path_dir_artifact().join(".."))
    }

    /// `<output_root>/<artifact_name>`.
    pub fn path_dir_output(&self) -> PathBuf {
        self.path_dir_output_root.join(&self.name_artifact)
    }

    /// Sibling manifest path (`<map dir>/<name>.res`).
    pub fn path_file_manifest(&self) -> PathBuf {
        self.path_file_artifact.with_extension(C_EXT_MANIFEST)
    }

    /// `<output_root>/<artifact_name>/missing.txt`.
    pub fn path_file_report_missing(&self) -> PathBuf {
        self.path_dir_output().join(C_NAME_REPORT_MISSING)
    }
}

/// Input options for one grab run.
#[derive(Debug, Clone, Default)]
pub struct SpecGrabOptions {
    /// Keep only entries matching one of these patterns.
    pub patterns_include: Option<Vec<String>>,
    /// Drop entries matching one of these patterns.
    pub patterns_exclude: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumPatternMode,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

/// Outcome of one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecResourceOutcome {
    /// Original relative manifest entry.
    pub entry: String,
    /// Resolved source path under the content root.
    pub path_file_src: PathBuf,
    /// Mirrored destination path under the map output directory.
    pub path_file_dst: PathBuf,
    /// Copied or missing (with reason).
    pub status: EnumResourceStatus,
}

impl SpecResourceOutcome {
    pub fn is_missing(&self) -> bool {
        matches!(self.status, EnumResourceStatus::Missing(_))
    }
}

/// Errors raised by the grab pipeline.
///
/// Manifest acquisition failures stop the run. `CopyFailed` and
/// `ReportWriteFailed` are local and never abort a run on their own.
#[derive(Debug, thiserror::Error)]
pub enum ResGrabError {
    #[error("Map file does not exist: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Generator not found or not executable: {} ({message})", .path.display())]
    GeneratorNotFound { path: PathBuf, message: String },

    #[error("Generator {} failed with {status}", .path.display())]
    GeneratorExecutionError { path: PathBuf, status: String },

    #[error("Manifest was not generated: {}", .0.display())]
    ManifestNotProduced(PathBuf),

    #[error("Could not read manifest {}: {source}", .path.display())]
    ManifestReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {}: {message}", .path.display())]
    CopyFailed { path: PathBuf, message: String },

    #[error("Failed to write report {}: {source}", .path.display())]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed { path: PathBuf, message: String },

    #[error("Invalid pattern in include/exclude: {0}")]
    InvalidPattern(String),

    #[error("Interrupted by user")]
    Interrupted,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ResGrabError, SpecRunContext};

    #[test]
    fn run_context_derives_namespaced_paths() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = tmp.path().join("cstrike/maps/de_dust2.bsp");
        std::fs::create_dir_all(path_file_bsp.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path_file_bsp, b"bsp").expect("write bsp");

        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");
        assert_eq!(spec_ctx.name_artifact(), "de_dust2");
        assert_eq!(spec_ctx.path_dir_content_root(), tmp.path().join("cstrike"));
        assert_eq!(spec_ctx.path_dir_output(), tmp.path().join("out/de_dust2"));
        assert_eq!(
            spec_ctx.path_file_manifest(),
            tmp.path().join("cstrike/maps/de_dust2.res")
        );
        assert_eq!(
            spec_ctx.path_file_report_missing(),
            tmp.path().join("out/de_dust2/missing.txt")
        );
    }

    #[test]
    fn run_context_rejects_missing_artifact() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = SpecRunContext::new(tmp.path(), tmp.path().join("nope.bsp")).unwrap_err();
        assert!(matches!(err, ResGrabError::ArtifactNotFound(_)));

        let err = SpecRunContext::new(tmp.path(), tmp.path()).unwrap_err();
        assert!(matches!(err, ResGrabError::ArtifactNotFound(_)));
    }
}
