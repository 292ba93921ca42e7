//! Protection checks for the designated secret file.
//!
//! Two checks exist, applied per operation:
//!
//! 1. Nominal check: the absolute form of the requested path has a base
//!    filename that matches the protected name (case-insensitive). Used
//!    by read, write, and delete.
//! 2. Resolved check: the path's symlink-resolved real target has a base
//!    filename that matches the protected name. Used by read only —
//!    a symlink with an innocent name pointing at the secret file must
//!    still be denied, since read is the one operation that discloses
//!    content. Write and delete deliberately keep the nominal check
//!    only, preserving the observed behavior of the flag server; the
//!    asymmetry is recorded in DESIGN.md rather than silently hardened.

use std::fs;
use std::path::Path;

/// Lowercased base filename of the protected file, used for all
/// case-insensitive comparisons. Falls back to the whole path string
/// if the path has no final component.
pub fn protected_basename(protected: &Path) -> String {
    protected
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| protected.to_string_lossy().into_owned())
        .to_lowercase()
}

/// Case-insensitive match of an entry name against the protected name.
///
/// `protected_name` must already be lowercased (see [`protected_basename`]).
pub fn name_matches(name: &str, protected_name: &str) -> bool {
    name.to_lowercase() == protected_name
}

/// Nominal check: does the absolute form of `path` end in the protected
/// filename?
pub fn nominal_is_protected(path: &str, protected_name: &str) -> bool {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| Path::new(path).to_path_buf());
    absolute
        .file_name()
        .map(|n| name_matches(&n.to_string_lossy(), protected_name))
        .unwrap_or(false)
}

/// Resolved check: does `path`, after resolving every symlink, point at
/// a file whose name is the protected filename?
///
/// If the path cannot be canonicalized (does not exist, dangling
/// symlink), the check passes — the subsequent open will fail with a
/// proper storage error instead.
pub fn resolved_is_protected(path: &str, protected_name: &str) -> bool {
    match fs::canonicalize(path) {
        Ok(real) => real
            .file_name()
            .map(|n| name_matches(&n.to_string_lossy(), protected_name))
            .unwrap_or(false),
        Err(_) => false,
    }
}
