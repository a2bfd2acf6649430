// Copyright 2026 The gitsite Authors

//! Scratch checkout directories.

use crate::ScratchError;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::io;
use tracing::{debug, warn};

/// Picks a scratch directory path under `base` that does not exist yet.
///
/// Candidates are named `gitsite-<n>.checkout`, with `n` drawn from `next`.
/// `exists` decides whether a candidate collides; the first candidate for
/// which it returns false is returned.
///
/// ```
/// use camino::Utf8Path;
/// use gitsite_wagon::unique_scratch_path;
///
/// let mut suffixes = [7, 42].into_iter();
/// let path = unique_scratch_path(
///     Utf8Path::new("/tmp"),
///     || suffixes.next().unwrap(),
///     |candidate| candidate.as_str() == "/tmp/gitsite-7.checkout",
/// );
/// assert_eq!(path, "/tmp/gitsite-42.checkout");
/// ```
pub fn unique_scratch_path(
    base: &Utf8Path,
    mut next: impl FnMut() -> u32,
    mut exists: impl FnMut(&Utf8Path) -> bool,
) -> Utf8PathBuf {
    loop {
        let candidate = base.join(format!("gitsite-{}.checkout", next()));
        if !exists(&candidate) {
            return candidate;
        }
    }
}

/// The scratch directory owned by one connection.
///
/// The directory is deleted when [`remove`](Self::remove) is called or, on
/// a best-effort basis, when the `ScratchDir` is dropped.
#[derive(Debug)]
pub struct ScratchDir {
    path: Utf8PathBuf,
    removed: bool,
}

impl ScratchDir {
    /// Uses `path` as the scratch directory, deleting anything already
    /// there and creating it afresh.
    pub fn create(path: impl Into<Utf8PathBuf>) -> Result<Self, ScratchError> {
        let path = path.into();
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|error| ScratchError::Clean {
                path: path.clone(),
                error,
            })?;
        }
        fs::create_dir_all(&path).map_err(|error| ScratchError::Create {
            path: path.clone(),
            error,
        })?;
        debug!(%path, "created checkout directory");
        Ok(ScratchDir { path, removed: false })
    }

    /// Creates a randomly named scratch directory under `base`.
    pub fn random(base: &Utf8Path) -> Result<Self, ScratchError> {
        let path =
            unique_scratch_path(base, rand::random::<u32>, |candidate| {
                candidate.exists()
            });
        Self::create(path)
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Deletes the directory.
    pub fn remove(mut self) -> Result<(), ScratchError> {
        self.removed = true;
        remove_dir(&self.path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(error) = remove_dir(&self.path) {
                warn!(path = %self.path, %error, "failed to remove checkout directory");
            }
        }
    }
}

fn remove_dir(path: &Utf8Path) -> Result<(), ScratchError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(%path, "removed checkout directory");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => {
            Err(ScratchError::Remove { path: path.to_owned(), error })
        }
    }
}

/// Creates `path` if it is absent, or deletes everything inside it.
pub(crate) fn prepare_dir(path: &Utf8Path) -> Result<(), ScratchError> {
    if !path.exists() {
        return fs::create_dir_all(path).map_err(|error| ScratchError::Create {
            path: path.to_owned(),
            error,
        });
    }

    let clean_error =
        |error| ScratchError::Clean { path: path.to_owned(), error };
    for entry in fs::read_dir(path).map_err(clean_error)? {
        let entry = entry.map_err(clean_error)?;
        let file_type = entry.file_type().map_err(clean_error)?;
        if file_type.is_dir() {
            fs::remove_dir_all(entry.path()).map_err(clean_error)?;
        } else {
            fs::remove_file(entry.path()).map_err(clean_error)?;
        }
    }
    Ok(())
}
