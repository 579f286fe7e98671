//! Manifest acquisition (existing `.res` or generator run) and parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::conf::{C_EXT_MANIFEST, C_MARKER_COMMENT};
use crate::spec::{ResGrabError, Result, SpecRunContext};
use crate::util::absolutize_path;

////////////////////////////////////////////////////////////////////////////////
// #region ManifestSource

/// Where the manifest used by a run came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumManifestSource {
    /// Manifest was already present next to the map.
    Existing(PathBuf),
    /// Manifest was produced by the generator during this run.
    Generated(PathBuf),
}

impl EnumManifestSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Existing(path) | Self::Generated(path) => path,
        }
    }
}

/// External tool that writes `<name>.res` next to a map file.
pub trait ManifestGenerator {
    /// Run against `path_file_artifact` with `path_dir_work` as working directory.
    fn generate(&self, path_file_artifact: &Path, path_dir_work: &Path) -> Result<()>;
}

/// Generator backed by an executable on disk (e.g. `resgen`).
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    path_file_exe: PathBuf,
}

impl ProcessGenerator {
    pub fn new<P: AsRef<Path>>(file_exe: P) -> Self {
        Self {
            path_file_exe: absolutize_path(file_exe.as_ref()),
        }
    }

    pub fn path_file_exe(&self) -> &Path {
        &self.path_file_exe
    }
}

impl ManifestGenerator for ProcessGenerator {
    fn generate(&self, path_file_artifact: &Path, path_dir_work: &Path) -> Result<()> {
        info!(generator = %self.path_file_exe.display(), "Running manifest generator");
        let status = Command::new(&self.path_file_exe)
            .arg(path_file_artifact)
            .current_dir(path_dir_work)
            .status()
            .map_err(|e| ResGrabError::GeneratorNotFound {
                path: self.path_file_exe.clone(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(ResGrabError::GeneratorExecutionError {
                path: self.path_file_exe.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// `<map dir>/<map name>.res` for the given map file.
pub fn derive_manifest_path<P: AsRef<Path>>(file_artifact: P) -> PathBuf {
    file_artifact.as_ref().with_extension(C_EXT_MANIFEST)
}

/// Locate the manifest for the run's map, generating it when absent.
///
/// `derive_generator` is only called when the manifest has to be generated,
/// so callers may defer asking for the generator location until then.
///
/// # Errors
/// - [`ResGrabError::GeneratorNotFound`] when the generator cannot be launched.
/// - [`ResGrabError::GeneratorExecutionError`] when it exits unsuccessfully.
/// - [`ResGrabError::ManifestNotProduced`] when it succeeds without writing the manifest.
pub fn acquire_manifest<F, G>(
    spec_run_ctx: &SpecRunContext,
    derive_generator: F,
) -> Result<EnumManifestSource>
where
    F: FnOnce() -> Result<G>,
    G: ManifestGenerator,
{
    let path_file_manifest = spec_run_ctx.path_file_manifest();
    if path_file_manifest.is_file() {
        info!(manifest = %path_file_manifest.display(), "Manifest found");
        return Ok(EnumManifestSource::Existing(path_file_manifest));
    }

    info!(
        manifest = %path_file_manifest.display(),
        "Manifest not found; generating"
    );
    let generator = derive_generator()?;
    generator.generate(
        spec_run_ctx.path_file_artifact(),
        spec_run_ctx.path_dir_artifact(),
    )?;

    if !path_file_manifest.is_file() {
        return Err(ResGrabError::ManifestNotProduced(path_file_manifest));
    }
    info!(manifest = %path_file_manifest.display(), "Manifest generated");
    Ok(EnumManifestSource::Generated(path_file_manifest))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ManifestParser

/// Decode manifest bytes as UTF-8, dropping invalid sequences and a leading BOM.
pub fn decode_manifest_bytes(raw: &[u8]) -> String {
    let mut txt = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        txt.push_str(chunk.valid());
    }
    match txt.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => txt,
    }
}

/// Normalize raw manifest text into ordered relative entries.
///
/// Lines end at `\n`, `\r\n` or a lone `\r` and are trimmed; blank lines and
/// `//` comments are dropped; `\` becomes `/`.
pub fn parse_manifest(txt: &str) -> Vec<String> {
    txt.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(C_MARKER_COMMENT))
        .map(|line| line.replace('\\', "/"))
        .collect()
}

/// Read, decode and parse a manifest file.
pub fn read_manifest<P: AsRef<Path>>(file_manifest: P) -> Result<Vec<String>> {
    let path_file_manifest = file_manifest.as_ref();
    let raw = fs::read(path_file_manifest).map_err(|source| ResGrabError::ManifestReadError {
        path: path_file_manifest.to_path_buf(),
        source,
    })?;
    let l_entries = parse_manifest(&decode_manifest_bytes(&raw));
    debug!(
        manifest = %path_file_manifest.display(),
        entries = l_entries.len(),
        "Parsed manifest"
    );
    Ok(l_entries)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};

    use super::{
        EnumManifestSource, ManifestGenerator, ProcessGenerator, acquire_manifest,
        decode_manifest_bytes, derive_manifest_path, parse_manifest, read_manifest,
    };
    use crate::spec::{ResGrabError, Result, SpecRunContext};

    struct FakeGenerator {
        write_manifest: bool,
        calls: Cell<usize>,
    }

    impl ManifestGenerator for &FakeGenerator {
        fn generate(&self, path_file_artifact: &Path, path_dir_work: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(path_file_artifact.parent(), Some(path_dir_work));
            if self.write_manifest {
                std::fs::write(derive_manifest_path(path_file_artifact), "models/a.mdl\n")
                    .expect("write manifest");
            }
            Ok(())
        }
    }

    fn setup_map(root: &Path, name: &str) -> PathBuf {
        let path_file_bsp = root.join("valve/maps").join(format!("{name}.bsp"));
        std::fs::create_dir_all(path_file_bsp.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path_file_bsp, b"bsp").expect("write bsp");
        path_file_bsp
    }

    #[test]
    fn parse_manifest_drops_comments_and_blanks() {
        let txt = "// resgen output\n\n  models/foo.mdl  \r\n   \n//another\nsound\\foo.wav\n";
        assert_eq!(parse_manifest(txt), vec!["models/foo.mdl", "sound/foo.wav"]);

        // Lone carriage returns also end a line.
        assert_eq!(
            parse_manifest("models/a.mdl\rsound/b.wav\r"),
            vec!["models/a.mdl", "sound/b.wav"]
        );
    }

    #[test]
    fn parse_manifest_is_idempotent() {
        let txt = "gfx\\env\\sky.tga\n // indented comment\n\t\nmaps/x.txt\n";
        let l_first = parse_manifest(txt);
        let l_second = parse_manifest(&l_first.join("\n"));
        assert_eq!(l_first, l_second);
        assert_eq!(l_first, vec!["gfx/env/sky.tga", "maps/x.txt"]);
    }

    #[test]
    fn parse_manifest_separator_variants_match() {
        assert_eq!(
            parse_manifest("sound\\ambience\\wind.wav"),
            parse_manifest("sound/ambience/wind.wav")
        );
    }

    #[test]
    fn parse_manifest_empty_and_comment_only() {
        assert!(parse_manifest("").is_empty());
        assert!(parse_manifest("// a\n//b\n   \n").is_empty());
    }

    #[test]
    fn decode_manifest_bytes_drops_invalid_sequences() {
        let raw = b"\xef\xbb\xbfmodels/a\xffb.mdl\nsound/c.wav\n";
        assert_eq!(decode_manifest_bytes(raw), "models/ab.mdl\nsound/c.wav\n");
    }

    #[test]
    fn read_manifest_missing_file_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = read_manifest(tmp.path().join("gone.res")).unwrap_err();
        assert!(matches!(err, ResGrabError::ManifestReadError { .. }));
    }

    #[test]
    fn acquire_manifest_prefers_existing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = setup_map(tmp.path(), "crossfire");
        std::fs::write(derive_manifest_path(&path_file_bsp), "models/a.mdl\n").expect("res");
        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");

        let src = acquire_manifest(&spec_ctx, || -> Result<ProcessGenerator> {
            panic!("generator must not be requested")
        })
        .expect("acquire");
        assert_eq!(
            src,
            EnumManifestSource::Existing(tmp.path().join("valve/maps/crossfire.res"))
        );
    }

    #[test]
    fn acquire_manifest_runs_generator_when_absent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = setup_map(tmp.path(), "stalkyard");
        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");
        let generator = FakeGenerator {
            write_manifest: true,
            calls: Cell::new(0),
        };

        let src = acquire_manifest(&spec_ctx, || Ok(&generator)).expect("acquire");
        assert!(matches!(src, EnumManifestSource::Generated(_)));
        assert_eq!(generator.calls.get(), 1);
        assert_eq!(read_manifest(src.path()).expect("read"), vec!["models/a.mdl"]);
    }

    #[test]
    fn acquire_manifest_reports_not_produced() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = setup_map(tmp.path(), "bounce");
        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");
        let generator = FakeGenerator {
            write_manifest: false,
            calls: Cell::new(0),
        };

        let err = acquire_manifest(&spec_ctx, || Ok(&generator)).unwrap_err();
        assert!(matches!(err, ResGrabError::ManifestNotProduced(_)));
    }

    #[test]
    fn acquire_manifest_generator_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = setup_map(tmp.path(), "datacore");
        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");

        let err = acquire_manifest(&spec_ctx, || {
            Ok(ProcessGenerator::new(tmp.path().join("no/such/resgen")))
        })
        .unwrap_err();
        assert!(matches!(err, ResGrabError::GeneratorNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn process_generator_runs_in_map_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = setup_map(tmp.path(), "snark_pit");
        // `sh <map>` executes the map file; it stands in for a real generator.
        std::fs::write(&path_file_bsp, "printf 'sound/a.wav\\n' > snark_pit.res\n")
            .expect("write script");
        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");

        let src = acquire_manifest(&spec_ctx, || Ok(ProcessGenerator::new("/bin/sh")))
            .expect("acquire");
        assert_eq!(read_manifest(src.path()).expect("read"), vec!["sound/a.wav"]);
    }

    #[cfg(unix)]
    #[test]
    fn process_generator_non_zero_exit() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_bsp = setup_map(tmp.path(), "frenzy");
        std::fs::write(&path_file_bsp, "exit 3\n").expect("write script");
        let spec_ctx = SpecRunContext::new(tmp.path().join("out"), &path_file_bsp).expect("ctx");

        let err = acquire_manifest(&spec_ctx, || Ok(ProcessGenerator::new("/bin/sh")))
            .unwrap_err();
        assert!(matches!(err, ResGrabError::GeneratorExecutionError { .. }));
    }
}
