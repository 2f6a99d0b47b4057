//! Filesystem allow-list.
//!
//! Every filesystem-touching tool gates access through [`AllowedPaths`]:
//! the candidate is resolved to an absolute, symlink-free form before any
//! containment check, so `allowed/../../etc/passwd` is rejected, and the
//! comparison is component-wise so `/allowed-evil` never matches the root
//! `/allowed`.

use std::path::{Component, Path, PathBuf};

/// Read-only set of directory roots that filesystem tools may touch.
/// Built once at startup from `ALLOWED_PATHS`; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AllowedPaths {
    roots: Vec<PathBuf>,
}

impl AllowedPaths {
    /// Build the allow-list, resolving each root. Roots that do not exist
    /// are kept in normalized form so a later mkdir can make them live.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = roots
            .into_iter()
            .map(|p| resolve(p.as_ref()))
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// True iff the resolved candidate equals, or is a strict descendant
    /// of, at least one resolved root. Pure; never errors.
    pub fn is_allowed(&self, candidate: &Path) -> bool {
        let resolved = resolve(candidate);
        // Path::starts_with compares whole components, so a sibling like
        // /data-evil does not match the root /data.
        self.roots.iter().any(|root| resolved.starts_with(root))
    }
}

/// Resolve a path to an absolute, normalized form without requiring it to
/// exist: the deepest existing ancestor is canonicalized (collapsing
/// symlinks), then the remaining components are appended with `.` and `..`
/// folded lexically.
fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    // Find the deepest ancestor that canonicalizes, then re-apply the rest.
    let mut existing = absolute.as_path();
    let mut remainder = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(base) => {
                let mut out = base;
                for component in remainder.iter().rev().copied() {
                    match component {
                        Component::Normal(seg) => out.push(seg),
                        Component::ParentDir => {
                            out.pop();
                        }
                        Component::CurDir => {}
                        _ => {}
                    }
                }
                return out;
            }
            Err(_) => match existing.parent() {
                Some(parent) => {
                    if let Some(last) = existing.components().next_back() {
                        remainder.push(last);
                    }
                    existing = parent;
                }
                None => return normalize_lexically(&absolute),
            },
        }
    }
}

/// Pure lexical fold of `.` and `..`, used only when nothing on the path
/// exists at all (e.g. a detached root in tests).
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(root: &Path) -> AllowedPaths {
        AllowedPaths::new([root])
    }

    #[test]
    fn root_itself_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(allowed(dir.path()).is_allowed(dir.path()));
    }

    #[test]
    fn descendant_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let child = dir.path().join("a/b/c.txt");
        assert!(allowed(dir.path()).is_allowed(&child));
    }

    #[test]
    fn traversal_escape_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let escape = dir.path().join("../escaped");
        assert!(!allowed(dir.path()).is_allowed(&escape));
    }

    #[test]
    fn deep_traversal_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let escape = dir.path().join("sub/../../../../etc/passwd");
        assert!(!allowed(dir.path()).is_allowed(&escape));
    }

    #[test]
    fn traversal_that_stays_inside_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let inside = dir.path().join("sub/../file.txt");
        assert!(allowed(dir.path()).is_allowed(&inside));
    }

    #[test]
    fn sibling_with_shared_prefix_is_denied() {
        // /data-sibling must not match allow-list root /data.
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("data");
        std::fs::create_dir(&root).unwrap();
        let sibling = parent.path().join("data-sibling");
        std::fs::create_dir(&sibling).unwrap();
        assert!(!allowed(&root).is_allowed(&sibling));
        assert!(!allowed(&root).is_allowed(&sibling.join("inner.txt")));
    }

    #[test]
    fn unrelated_absolute_path_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!allowed(dir.path()).is_allowed(Path::new("/etc/passwd")));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_pointing_outside_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();
        assert!(!allowed(dir.path()).is_allowed(&link.join("secret.txt")));
    }

    #[test]
    fn any_of_several_roots_admits() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let guard = AllowedPaths::new([a.path(), b.path()]);
        assert!(guard.is_allowed(&b.path().join("x")));
        assert!(guard.is_allowed(&a.path().join("y")));
    }
}
