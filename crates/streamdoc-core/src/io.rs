use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from leaving half a section on disk.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Build the path a backup copy of `path` is written to.
///
/// `doc.md` with suffix `.bak` becomes `doc.md.bak`, or
/// `doc.md.20261017T120000.bak` when `stamp` is given.
pub fn backup_path(path: &Path, suffix: &str, stamp: Option<&str>) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    if let Some(stamp) = stamp {
        name.push(".");
        name.push(stamp);
    }
    name.push(suffix);
    path.with_file_name(name)
}

/// Copy `path` next to itself before a destructive rewrite. Returns the copy's path.
pub fn write_backup(path: &Path, suffix: &str, stamp: Option<&str>) -> Result<PathBuf> {
    let dest = backup_path(path, suffix, stamp);
    let data = std::fs::read(path)?;
    atomic_write(&dest, &data)?;
    Ok(dest)
}
