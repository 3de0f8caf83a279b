//! Mapping of archive entry names onto the destination directory.

use std::path::{Component, Path, PathBuf};

use crate::error::MaterializeError;

/// Lexically normalizes an archive entry name into a relative path.
///
/// Both `/` and `\` are accepted as separators. Empty and `.` components are
/// dropped and `..` removes the previous component. A name such as `./`
/// normalizes to the empty path, which stands for the starting point itself.
/// Returns `None` if the name is absolute, carries a drive prefix or climbs
/// above its starting point.
pub fn normalize_entry_path(name: &str) -> Option<PathBuf> {
    if name.starts_with('/') || name.starts_with('\\') {
        return None;
    }

    let mut components: Vec<&str> = Vec::new();
    for component in name.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop()?;
            }
            other => {
                // Anything the host platform does not see as a plain file
                // name (e.g. `C:` on windows) is rejected.
                let mut parsed = Path::new(other).components();
                match (parsed.next(), parsed.next()) {
                    (Some(Component::Normal(_)), None) => components.push(other),
                    _ => return None,
                }
            }
        }
    }

    Some(components.iter().collect())
}

/// Resolves `name` beneath `root`, failing if it would escape it.
///
/// Only a directory entry may resolve to `root` itself, a file would replace
/// the destination directory.
pub fn enclosed_path(root: &Path, name: &str, is_dir: bool) -> Result<PathBuf, MaterializeError> {
    let traversal = || MaterializeError::PathTraversal {
        entry: name.to_string(),
        root: root.to_path_buf(),
    };
    let relative = normalize_entry_path(name).ok_or_else(traversal)?;
    if relative.as_os_str().is_empty() {
        return if is_dir {
            Ok(root.to_path_buf())
        } else {
            Err(traversal())
        };
    }
    let target = root.join(relative);
    debug_assert!(target.starts_with(root));
    Ok(target)
}
