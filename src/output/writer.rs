//! Atomic writes into the output tree

use crate::{MirrorError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Prefix of the temporary files created next to their targets
pub const TEMP_PREFIX: &str = ".siteclone-";

/// Writes `bytes` to `root/relative` atomically
///
/// The content goes to a temporary file in the target directory which is then
/// renamed over the final path, so readers never observe a partial file. Parent
/// directories are created as needed.
///
/// # Errors
///
/// Returns `MirrorError::Io` when the path escapes `root` or a directory cannot be
/// created, and `MirrorError::Persist` when the rename fails.
pub fn write_atomic(root: &Path, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
    let target = contained_path(root, relative)?;
    let parent = target.parent().unwrap_or(root);
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    persist(temp, &target)?;

    tracing::trace!("Wrote {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}

/// Returns true for files left behind by an interrupted write
pub fn is_temp_file(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}

fn persist(temp: NamedTempFile, target: &Path) -> Result<()> {
    temp.persist(target).map_err(|e| MirrorError::Persist {
        path: target.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}

/// Joins `relative` onto `root`, refusing anything but plain segments
fn contained_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => {
                return Err(MirrorError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("path escapes output directory: {}", relative),
                )))
            }
        }
    }
    if path == root {
        return Err(MirrorError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty output path",
        )));
    }
    Ok(path)
}
