//! String path handling for node paths
//!
//! Node paths are plain strings, absolute and normalized with respect to a
//! configurable separator. They are deliberately not `std::path::Path`: the
//! separator is a property of the facade, not of the host platform.

use crate::error::{FsError, Result};

/// Separator-aware path operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPolicy {
    separator: char,
}

impl PathPolicy {
    /// Create a policy for the given separator
    #[must_use]
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    /// The separator this policy splits on
    #[must_use]
    pub const fn separator(&self) -> char {
        self.separator
    }

    /// Normalize an absolute path
    ///
    /// Repeated separators and `.` segments are dropped, `..` is resolved
    /// lexically and a trailing separator is removed. The root normalizes to
    /// a single separator.
    ///
    /// # Errors
    ///
    /// Returns `FsError::PathResolution` if the path is empty, relative, or
    /// climbs above the root.
    pub fn normalize(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Err(FsError::path(path, "empty path"));
        }
        if !path.starts_with(self.separator) {
            return Err(FsError::path(path, "path must be absolute"));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split(self.separator) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(FsError::path(path, "`..` climbs above the root"));
                    }
                }
                other => segments.push(other),
            }
        }

        Ok(self.from_segments(&segments))
    }

    /// Whether `path` is the root
    #[must_use]
    pub fn is_root(&self, path: &str) -> bool {
        path.len() == self.separator.len_utf8() && path.starts_with(self.separator)
    }

    /// Join a child name onto a normalized directory path
    #[must_use]
    pub fn join(&self, parent: &str, name: &str) -> String {
        if self.is_root(parent) {
            format!("{}{name}", self.separator)
        } else {
            format!("{parent}{}{name}", self.separator)
        }
    }

    /// Parent of a normalized path, `None` for the root
    #[must_use]
    pub fn parent(&self, path: &str) -> Option<String> {
        if self.is_root(path) {
            return None;
        }
        match path.rfind(self.separator) {
            Some(0) => Some(self.separator.to_string()),
            Some(index) => Some(path[..index].to_string()),
            None => None,
        }
    }

    /// Final segment of a normalized path; empty for the root
    #[must_use]
    pub fn name<'a>(&self, path: &'a str) -> &'a str {
        match path.rfind(self.separator) {
            Some(index) => &path[index + self.separator.len_utf8()..],
            None => path,
        }
    }

    fn from_segments(&self, segments: &[&str]) -> String {
        let mut path = String::new();
        for segment in segments {
            path.push(self.separator);
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push(self.separator);
        }
        path
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new('/')
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", "/")]
    #[case("/a", "/a")]
    #[case("/a/", "/a")]
    #[case("//a///b", "/a/b")]
    #[case("/a/./b", "/a/b")]
    #[case("/a/b/../c", "/a/c")]
    #[case("/a/..", "/")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        let policy = PathPolicy::default();
        assert_eq!(policy.normalize(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("a/b")]
    #[case("/..")]
    #[case("/a/../..")]
    fn test_normalize_rejects(#[case] input: &str) {
        let policy = PathPolicy::default();
        assert!(matches!(
            policy.normalize(input),
            Err(FsError::PathResolution { .. })
        ));
    }

    #[rstest]
    #[case("/", None)]
    #[case("/x", Some("/"))]
    #[case("/x/y", Some("/x"))]
    #[case("/x/y/z", Some("/x/y"))]
    fn test_parent(#[case] input: &str, #[case] expected: Option<&str>) {
        let policy = PathPolicy::default();
        assert_eq!(policy.parent(input).as_deref(), expected);
    }

    #[test]
    fn test_join_and_name() {
        let policy = PathPolicy::default();
        assert_eq!(policy.join("/", "a"), "/a");
        assert_eq!(policy.join("/a", "b"), "/a/b");
        assert_eq!(policy.name("/a/b"), "b");
        assert_eq!(policy.name("/"), "");
    }

    #[test]
    fn test_custom_separator() {
        let policy = PathPolicy::new('\\');
        assert_eq!(policy.normalize("\\a\\\\b\\").unwrap(), "\\a\\b");
        assert_eq!(policy.parent("\\a\\b").as_deref(), Some("\\a"));
        assert_eq!(policy.join("\\", "a"), "\\a");
        assert!(policy.normalize("/a").is_err());
    }
}
