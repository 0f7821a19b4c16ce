// Path resolution against a connector's working directory

use std::path::{Component, Path, PathBuf};

/// Resolve `dest` the way every connector operation sees it.
///
/// - empty input is returned unchanged
/// - a leading `~/` expands to the home directory
/// - anything else becomes absolute relative to `cwd`
pub fn resolve_path(dest: &str, cwd: &str) -> PathBuf {
    if dest.is_empty() {
        return PathBuf::new();
    }

    if let Some(rest) = dest.strip_prefix("~/") {
        return normalize(&home_dir().join(rest));
    }

    normalize(&working_dir(cwd).join(dest))
}

/// Absolute form of a (possibly `~`-relative) working directory
pub fn working_dir(cwd: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(cwd).as_ref());
    if expanded.is_absolute() {
        normalize(&expanded)
    } else {
        let base = std::env::current_dir().unwrap_or_default();
        normalize(&base.join(expanded))
    }
}

/// Lexically remove `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // popping past the root leaves the root in place
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn home_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~").as_ref())
}
