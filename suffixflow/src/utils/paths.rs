//! Lexical path helpers for link aliases.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against `cwd` and removes `.` and `..` lexically.
#[must_use]
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns the path that leads from directory `from_dir` to `to`.
///
/// Both paths must be absolute and normalised (see [`absolutize`]).
#[must_use]
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();

    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

/// Computes what a symlink at `alias` must contain to reach `source`.
///
/// The result is relative, so a tree moved as a unit keeps working links.
pub fn relative_link_target(alias: &Path, source: &Path) -> io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let alias_dir = alias.parent().unwrap_or_else(|| Path::new(""));
    Ok(relative_path(
        &absolutize(&cwd, alias_dir),
        &absolutize(&cwd, source),
    ))
}
