//! Relative path normalisation.
//!
//! Every path reported by outdiff is relative to a tree root and uses `/` as
//! its separator, independent of the host platform.

use std::path::{Component, Path, PathBuf};

use crate::error::TypeError;

/// Normalise a relative path to a `/`-separated string.
///
/// `.` components are dropped. Absolute paths, drive prefixes and `..`
/// components are rejected, so the result can never escape its root.
pub fn normalize_relative(path: &Path) -> Result<String, TypeError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| TypeError::NonUtf8Path(path.display().to_string()))?;
                parts.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(TypeError::UnsafePath(path.display().to_string()));
            }
        }
    }
    if parts.is_empty() {
        return Err(TypeError::UnsafePath(path.display().to_string()));
    }
    Ok(parts.join("/"))
}

/// Join a normalised relative path onto `root`, validating it first.
pub fn join_relative(root: &Path, relative: &str) -> Result<PathBuf, TypeError> {
    let normalized = normalize_relative(Path::new(relative))?;
    Ok(normalized.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_path_uses_forward_slashes() {
        let p = Path::new("a").join("b").join("c.txt");
        assert_eq!(normalize_relative(&p).unwrap(), "a/b/c.txt");
    }

    #[test]
    fn current_dir_components_are_dropped() {
        assert_eq!(normalize_relative(Path::new("./a/./b")).unwrap(), "a/b");
    }

    #[test]
    fn parent_components_are_rejected() {
        assert!(matches!(
            normalize_relative(Path::new("a/../../etc/passwd")),
            Err(TypeError::UnsafePath(_))
        ));
    }

    #[test]
    fn absolute_paths_are_rejected() {
        assert!(normalize_relative(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(normalize_relative(Path::new("")).is_err());
        assert!(normalize_relative(Path::new(".")).is_err());
    }

    #[test]
    fn join_relative_stays_under_root() {
        let joined = join_relative(Path::new("/out"), "x/y.ext").unwrap();
        assert_eq!(joined, Path::new("/out").join("x").join("y.ext"));
        assert!(join_relative(Path::new("/out"), "../y.ext").is_err());
    }

    proptest::proptest! {
        #[test]
        fn plain_segments_roundtrip(segments in proptest::collection::vec("[a-z0-9_-]{1,8}", 1..6)) {
            let path: PathBuf = segments.iter().collect();
            proptest::prop_assert_eq!(normalize_relative(&path).unwrap(), segments.join("/"));
        }
    }
}
