//! Manifest and report constants.

/// Extension of the manifest file written next to the map.
pub const C_EXT_MANIFEST: &str = "res";
/// Lines starting with this marker are comments.
pub const C_MARKER_COMMENT: &str = "//";
/// Name of the unresolved-entry report inside the map output directory.
pub const C_NAME_REPORT_MISSING: &str = "missing.txt";
