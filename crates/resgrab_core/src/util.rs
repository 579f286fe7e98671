//! Path normalization, destination safety checks and metadata-preserving copy.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

pub(crate) fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` above the root of an absolute path stays at the root; on a relative
/// path it is kept as a leading `..`.
pub(crate) fn normalize_path_lexical(path: &Path) -> PathBuf {
    let mut l_parts: Vec<Component<'_>> = Vec::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => match l_parts.last() {
                Some(Component::Normal(_)) => {
                    l_parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => l_parts.push(part),
            },
            _ => l_parts.push(part),
        }
    }
    if l_parts.is_empty() {
        return PathBuf::from(".");
    }
    l_parts.iter().map(|c| c.as_os_str()).collect()
}

/// Join a manifest entry onto `path_dir_base` and normalize the result.
///
/// # Examples
/// ```ignore
/// use std::path::Path;
/// let path = derive_entry_path(Path::new("/game/cstrike"), "models/../sound/a.wav");
/// assert_eq!(path, Path::new("/game/cstrike/sound/a.wav"));
/// ```
pub(crate) fn derive_entry_path(path_dir_base: &Path, entry: &str) -> PathBuf {
    normalize_path_lexical(&path_dir_base.join(entry))
}

/// Reject destinations outside `path_dir_dst_root` or routed through a symlink.
pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), String> {
    let path_dir_dst_root_abs = normalize_path_lexical(&absolutize_path(path_dir_dst_root));
    let path_dst_item_abs = normalize_path_lexical(&absolutize_path(path_dst_item));

    if !path_dst_item_abs.starts_with(&path_dir_dst_root_abs) {
        return Err(format!(
            "Unsafe destination path escapes output directory: {} (root={})",
            path_dst_item.display(),
            path_dir_dst_root.display()
        ));
    }

    let path_parent_dst = path_dst_item_abs.parent().ok_or_else(|| {
        format!(
            "Failed to derive parent directory: {}",
            path_dst_item.display()
        )
    })?;
    let path_parent_rel = path_parent_dst
        .strip_prefix(&path_dir_dst_root_abs)
        .map_err(|_| {
            format!(
                "Unsafe destination parent escapes output directory: {} (root={})",
                path_dst_item.display(),
                path_dir_dst_root.display()
            )
        })?;

    let mut path_cursor = path_dir_dst_root_abs.clone();
    for part_rel in path_parent_rel.components() {
        path_cursor.push(part_rel.as_os_str());
        match fs::symlink_metadata(&path_cursor) {
            Ok(meta_cursor) => {
                if meta_cursor.file_type().is_symlink() {
                    return Err(format!(
                        "Unsafe destination path traverses symlink component: {}",
                        path_cursor.display()
                    ));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => {
                return Err(format!(
                    "Failed to inspect destination path component {} ({e})",
                    path_cursor.display()
                ));
            }
        }
    }

    match fs::symlink_metadata(&path_dst_item_abs) {
        Ok(meta_dst_item) if meta_dst_item.file_type().is_symlink() => Err(format!(
            "Unsafe destination path is an existing symlink: {}",
            path_dst_item.display()
        )),
        Ok(meta_dst_item) if meta_dst_item.is_dir() => Err(format!(
            "Destination is a directory: {}",
            path_dst_item.display()
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!(
            "Failed to inspect destination path {} ({e})",
            path_dst_item.display()
        )),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy bytes, then permissions, timestamps and (on Linux) extended attributes.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<u64, io::Error> {
    clear_readonly(path_file_dst)?;
    let n_bytes = fs::copy(path_file_src, path_file_dst)?;
    apply_metadata(path_file_src, path_file_dst)?;
    Ok(n_bytes)
}

/// A read-only destination left by a previous run must stay overwritable.
fn clear_readonly(path_file_dst: &Path) -> Result<(), io::Error> {
    let meta_dst = match fs::metadata(path_file_dst) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let mut perms_dst = meta_dst.permissions();
    if perms_dst.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms_dst.set_readonly(false);
        fs::set_permissions(path_file_dst, perms_dst)?;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
