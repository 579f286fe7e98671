//! `resgrab_core` v1:
//! Resolve a map's resource manifest and materialize the referenced assets.
//!
//! Modules follow the pipeline order:
//! - `conf`     : constants
//! - `spec`     : context/options/outcomes/errors
//! - `manifest` : manifest acquisition and parsing
//! - `pattern`  : optional entry filters
//! - `copy`     : entry resolution and copy engine
//! - `report`   : run-time report model and `missing.txt` writer
//! - `pipeline` : stage driver
//! - `util`     : shared helper functions

pub mod conf;
pub mod copy;
pub mod manifest;
pub mod pattern;
pub mod pipeline;
pub mod report;
pub mod spec;
mod util;

pub use conf::{C_EXT_MANIFEST, C_MARKER_COMMENT, C_NAME_REPORT_MISSING};
pub use copy::grab_resources;
pub use manifest::{
    EnumManifestSource, ManifestGenerator, ProcessGenerator, acquire_manifest,
    decode_manifest_bytes, derive_manifest_path, parse_manifest, read_manifest,
};
pub use pattern::filter_entries;
pub use pipeline::{EnumRunOutcome, run_grab};
pub use report::{ReportGrab, ReportGrabBuilder, SpecSummary, write_missing_report};
pub use spec::{
    EnumMissingReason, EnumPatternMode, EnumResourceStatus, ResGrabError, Result,
    SpecGrabOptions, SpecResourceOutcome, SpecRunContext,
};
