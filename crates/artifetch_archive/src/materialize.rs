use std::{
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use artifetch_consts::consts;
use fs_err as fs;

use crate::{
    decode::{ArchiveEntry, EntrySource},
    error::{DecodeError, MaterializeError},
    path::enclosed_path,
};

/// What [`materialize`] wrote to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Writes every entry of `source` beneath `root`.
///
/// Each entry path is validated before anything is written for it. Files
/// are created or truncated and receive the permission bits recorded in
/// the archive. Directory permissions are applied once all entries have
/// been written so that a read-only directory does not prevent its own
/// children from being extracted.
///
/// Entries written before a failure are left in place.
pub fn materialize<S>(source: &mut S, root: &Path) -> Result<MaterializeSummary, MaterializeError>
where
    S: EntrySource + ?Sized,
{
    let mut summary = MaterializeSummary::default();
    let mut directory_modes: Vec<(PathBuf, u32)> = Vec::new();

    while let Some(entry) = source.next_entry() {
        let mut entry = entry?;
        let target = enclosed_path(root, &entry.path, entry.is_dir)?;

        if entry.is_dir && target == root {
            // `./` and the like name the destination itself.
            fs::create_dir_all(root).map_err(|err| MaterializeError::write(root, err))?;
            continue;
        }
        if entry.is_dir {
            tracing::trace!("creating directory {}", target.display());
            fs::create_dir_all(&target).map_err(|err| MaterializeError::write(&target, err))?;
            if let Some(mode) = entry.mode {
                directory_modes.push((target, mode));
            }
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| MaterializeError::write(parent, err))?;
        }
        tracing::trace!("writing {}", target.display());
        summary.bytes += write_entry(&mut entry, &target)?;
        if let Some(mode) = entry.mode {
            set_mode(&target, mode)?;
        }
        summary.files += 1;
    }

    // Deepest directories first, a parent may revoke our write access.
    directory_modes.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));
    for (path, mode) in directory_modes {
        set_mode(&path, mode)?;
    }

    Ok(summary)
}

/// Copies the content of `entry` into a freshly truncated file at `target`.
fn write_entry(entry: &mut ArchiveEntry<'_>, target: &Path) -> Result<u64, MaterializeError> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(target)
        .map_err(|err| MaterializeError::write(target, err))?;

    let mut buf = vec![0u8; consts::COPY_BUFFER_SIZE];
    let mut written = 0u64;
    loop {
        let read = match entry.content.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(DecodeError::Entry {
                    name: entry.path.clone(),
                    source: Arc::new(err),
                }
                .into());
            }
        };
        file.write_all(&buf[..read])
            .map_err(|err| MaterializeError::write(target, err))?;
        written += read as u64;
    }
    file.flush()
        .map_err(|err| MaterializeError::write(target, err))?;

    Ok(written)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), MaterializeError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = std::fs::Permissions::from_mode(mode & consts::PERMISSION_BITS);
    fs::set_permissions(path, permissions).map_err(|err| MaterializeError::write(path, err))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), MaterializeError> {
    Ok(())
}
