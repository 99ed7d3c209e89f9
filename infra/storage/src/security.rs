use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Directory names a namespace may use: ASCII alphanumerics, `-`, `_`, `.`; never `.`/`..`.
pub(crate) fn check_namespace(name: &str) -> Result<(), StorageError> {
    let portable = !name.is_empty()
        && name != "."
        && name != ".."
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if portable {
        Ok(())
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: name.to_owned().into(),
            context: Some("Namespace is not a portable directory name".into()),
        })
    }
}

/// Lexically collapses `.` and `..`, refusing anything that would climb above the base.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(segment) => out.push(segment),
            Component::ParentDir if out.pop() => {}
            Component::ParentDir => {
                return Err(traversal(path, "Path attempted to escape its namespace via '..'"));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(traversal(path, "Absolute paths are not allowed in the sandbox"));
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(traversal(path, "Path does not name a record"));
    }
    Ok(out)
}

/// Maps `<namespace>/<path>` under `root`, verifying the result stays inside the namespace.
///
/// Existing paths are canonicalized so a symlink cannot point outside the sandbox; paths that
/// do not exist yet are checked through their nearest existing ancestor.
pub(crate) fn resolve_path(
    root: &Path,
    namespace: &str,
    path: impl AsRef<Path>,
) -> Result<PathBuf, StorageError> {
    let base = root.join(namespace);
    let joined = base.join(normalize_relative(path.as_ref())?);

    match joined.canonicalize() {
        Ok(canonical) if canonical.starts_with(&base) => Ok(canonical),
        Ok(canonical) => Err(traversal(&canonical, "Resolved path left the namespace")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => check_ancestors(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

fn check_ancestors(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    for ancestor in joined.ancestors() {
        if ancestor == root {
            return Ok(joined.to_path_buf());
        }
        if !ancestor.exists() {
            continue;
        }
        return match ancestor.canonicalize() {
            Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
            Ok(canonical) => {
                Err(traversal(&canonical, "Existing parent directory is a symlink outside sandbox"))
            }
            Err(e) => Err(StorageError::Io {
                source: e,
                context: Some("Failed to verify parent directory".into()),
            }),
        };
    }

    Err(traversal(joined, "No parent directory found within sandbox"))
}

fn traversal(path: &Path, why: &'static str) -> StorageError {
    StorageError::PathTraversalAttempt {
        message: path.display().to_string().into(),
        context: Some(why.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_inner_parent_segments() {
        let out = normalize_relative(Path::new("records/./x/../abc")).unwrap();
        assert_eq!(out, PathBuf::from("records/abc"));
    }

    #[test]
    fn refuses_escape_and_absolute() {
        assert!(normalize_relative(Path::new("../salt")).is_err());
        assert!(normalize_relative(Path::new("a/../../b")).is_err());
        assert!(normalize_relative(Path::new("/etc/passwd")).is_err());
        assert!(normalize_relative(Path::new(".")).is_err());
    }

    #[test]
    fn namespace_names_are_portable() {
        assert!(check_namespace("n1").is_ok());
        assert!(check_namespace("com.example-app_2").is_ok());
        for bad in ["", ".", "..", "a/b", "a b"] {
            assert!(check_namespace(bad).is_err(), "{bad:?}");
        }
    }
}
