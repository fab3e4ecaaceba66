//! Atomic file write helpers.
//!
//! Uses a temp file + rename pattern so a reader never observes a half-written
//! file. Where rename-over-existing fails, the previous file is moved aside to
//! `<name>.bak` first and restored if the rename still fails.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Who may read the persisted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Inherit the process umask.
    Default,
    /// Owner read/write only (0o600 on Unix). Drafts contain contact details.
    #[default]
    OwnerOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// fsync the file, then best-effort fsync its directory.
    Durable,
    Skip,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomicWriteOptions {
    pub sync: SyncPolicy,
    pub visibility: Visibility,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self {
            sync: SyncPolicy::Durable,
            visibility: Visibility::OwnerOnly,
        }
    }
}

/// Restore `path` from `path.bak` left behind by an interrupted write.
///
/// Returns true when a backup was restored.
pub fn recover_bak_file(path: &Path) -> bool {
    let backup = path.with_extension("bak");
    if path.exists() || !backup.exists() {
        return false;
    }
    match fs::rename(&backup, path) {
        Ok(()) => {
            tracing::warn!(
                path = %path.display(),
                "Recovered .bak file from interrupted atomic write"
            );
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to recover .bak file: {e}");
            false
        }
    }
}

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write_with_options(path, bytes, AtomicWriteOptions::default())
}

pub fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    restrict_permissions(tmp.path(), options.visibility)?;

    tmp.write_all(bytes)?;
    if options.sync == SyncPolicy::Durable {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup_path = path.with_extension("bak");
        let _ = fs::remove_file(&backup_path);
        fs::rename(path, &backup_path)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup_path, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup_path) {
            tracing::warn!(
                path = %backup_path.display(),
                "Failed to remove .bak after atomic write: {e}"
            );
        }
    }

    restrict_permissions(path, options.visibility)?;

    if options.sync == SyncPolicy::Durable {
        best_effort_sync_dir(parent);
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, visibility: Visibility) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if visibility == Visibility::OwnerOnly {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _visibility: Visibility) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn best_effort_sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), "Directory sync_all failed (best-effort): {e}");
    }
}

#[cfg(not(unix))]
fn best_effort_sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fast() -> AtomicWriteOptions {
        AtomicWriteOptions {
            sync: SyncPolicy::Skip,
            visibility: Visibility::Default,
        }
    }

    #[test]
    fn overwrites_existing_and_cleans_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draft.json");

        atomic_write_with_options(&path, b"one", fast()).expect("write one");
        atomic_write_with_options(&path, b"two", fast()).expect("write two");

        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!path.with_extension("bak").exists());
    }

    #[test]
    fn recovers_backup_when_target_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draft.json");
        fs::write(path.with_extension("bak"), b"saved").expect("write bak");

        assert!(recover_bak_file(&path));
        assert_eq!(fs::read_to_string(&path).expect("read"), "saved");
        assert!(!recover_bak_file(&path));
    }

    #[cfg(unix)]
    #[test]
    fn owner_only_by_default() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draft.json");
        atomic_write(&path, b"{}").expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
