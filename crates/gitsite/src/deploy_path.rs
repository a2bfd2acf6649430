// Copyright 2026 The gitsite Authors

//! Deployment target paths.

use crate::DeployPathError;
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, str::FromStr};

/// A destination path inside the pages repository.
///
/// Paths are relative and use forward slashes. The empty path denotes the
/// repository root (or the module root, for module URLs).
///
/// # Invariants
///
/// - Backslashes are normalized to forward slashes on construction.
/// - Leading and trailing slashes, empty segments and `.` segments are
///   dropped.
/// - No segment is `..`, and no segment contains a newline.
///
/// # Examples
///
/// ```
/// use gitsite::DeployPath;
///
/// let path: DeployPath = "./docs\\api/".parse().unwrap();
/// assert_eq!(path.as_str(), "docs/api");
/// assert_eq!(path.file_name(), Some("api"));
/// assert_eq!(path.parent().unwrap().as_str(), "docs");
///
/// assert!("../escape".parse::<DeployPath>().is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeployPath(String);

impl DeployPath {
    /// Creates a new `DeployPath`, normalizing separators and dropping
    /// empty and `.` segments.
    pub fn new(path: impl AsRef<str>) -> Result<Self, DeployPathError> {
        let raw = path.as_ref();
        if raw.contains('\n') {
            return Err(DeployPathError::NewlineInPath);
        }
        let normalized = raw.replace('\\', "/");

        let mut segments = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(DeployPathError::ParentComponent {
                        path: raw.to_owned(),
                    });
                }
                other => segments.push(other),
            }
        }

        Ok(DeployPath(segments.join("/")))
    }

    /// Returns the repository root path (the empty path).
    pub fn root() -> Self {
        DeployPath(String::new())
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this is the repository root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path segments, in order from the root.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the number of segments in the path.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<DeployPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(index) => Some(DeployPath(self.0[..index].to_owned())),
            None => Some(DeployPath::root()),
        }
    }

    /// Returns the last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().next_back()
    }

    /// Joins another deploy path onto this one.
    pub fn join(&self, other: &DeployPath) -> DeployPath {
        match (self.is_root(), other.is_root()) {
            (_, true) => self.clone(),
            (true, false) => other.clone(),
            (false, false) => DeployPath(format!("{}/{}", self.0, other.0)),
        }
    }

    /// Returns whether `self` is `other` or an ancestor of it.
    pub fn is_ancestor_of(&self, other: &DeployPath) -> bool {
        self.is_root()
            || other.0 == self.0
            || (other.0.starts_with(&self.0)
                && other.0.as_bytes().get(self.0.len()) == Some(&b'/'))
    }

    /// Resolves this path under a local directory.
    pub fn to_path_under(&self, root: &Utf8Path) -> Utf8PathBuf {
        let mut path = root.to_owned();
        for segment in self.segments() {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for DeployPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() { f.write_str("/") } else { f.write_str(&self.0) }
    }
}

impl FromStr for DeployPath {
    type Err = DeployPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeployPath::new(s)
    }
}

/// Whether a deployment target denotes a single file or a directory tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// A single file.
    File,
    /// A directory and everything below it.
    Directory,
}

/// A destination path plus whether it denotes a file or a directory.
///
/// Immutable for the duration of one deploy operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployTarget {
    path: DeployPath,
    kind: TargetKind,
}

impl DeployTarget {
    /// Creates a file target. The path must not be the root.
    pub fn file(path: DeployPath) -> Result<Self, DeployPathError> {
        if path.is_root() {
            return Err(DeployPathError::EmptyFilePath);
        }
        Ok(DeployTarget { path, kind: TargetKind::File })
    }

    /// Creates a directory target. The root is allowed.
    pub fn directory(path: DeployPath) -> Self {
        DeployTarget { path, kind: TargetKind::Directory }
    }

    /// Returns the destination path.
    pub fn path(&self) -> &DeployPath {
        &self.path
    }

    /// Returns the target kind.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns the directory that must exist before content is placed:
    /// the path itself for a directory, its parent for a file.
    pub fn directory_path(&self) -> DeployPath {
        match self.kind {
            TargetKind::Directory => self.path.clone(),
            TargetKind::File => self.path.parent().unwrap_or_default(),
        }
    }
}
