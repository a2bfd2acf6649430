// Copyright 2026 The gitsite Authors

//! The checkout step: a fresh clone of the pages branch in the scratch
//! directory.
//!
//! This mirrors
//!
//! ```text
//! git init
//! git remote add origin <url>
//! git pull origin refs/heads/<branch>
//! git ls-files
//! ```
//!
//! except that a failing pull does not stop the deploy. The first push
//! creates a branch that does not exist yet.

use crate::{CheckoutError, CommandFailed, Git, git::split_nul, scratch};
use camino::{Utf8Path, Utf8PathBuf};
use gitsite::{DeployPath, RemoteDescriptor};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// What happened when pulling the pages branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PullStatus {
    /// The branch was pulled.
    Pulled,
    /// The remote has no such branch yet; it is created on push.
    BranchMissing,
    /// The pull failed for some other reason. The deploy continues, and
    /// this stderr is reported if a later step fails too.
    Failed {
        /// The trimmed stderr from `git pull`.
        stderr: String,
    },
}

impl PullStatus {
    fn classify(outcome: &crate::CommandOutcome) -> Self {
        if outcome.success() {
            return PullStatus::Pulled;
        }
        let stderr = outcome.stderr().trim();
        if is_missing_ref(stderr) {
            PullStatus::BranchMissing
        } else {
            PullStatus::Failed { stderr: stderr.to_owned() }
        }
    }

    /// Returns the pull stderr if the pull failed for a reason other than
    /// a missing branch.
    pub fn failure(&self) -> Option<&str> {
        match self {
            PullStatus::Failed { stderr } => Some(stderr),
            PullStatus::Pulled | PullStatus::BranchMissing => None,
        }
    }
}

/// Git's messages for a ref that the remote does not have.
fn is_missing_ref(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("couldn't find remote ref")
        || stderr.contains("could not find remote ref")
}

/// The result of a successful checkout.
#[derive(Clone, Debug)]
pub struct Checkout {
    root: Utf8PathBuf,
    pull: PullStatus,
    tracked: BTreeSet<String>,
}

impl Checkout {
    /// Returns the checkout directory.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns how the pull went.
    pub fn pull(&self) -> &PullStatus {
        &self.pull
    }

    /// Returns the tracked paths, relative to the repository root.
    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(String::as_str)
    }

    /// Returns whether `path` is a tracked file or a directory containing
    /// tracked files. The root always exists.
    pub fn exists(&self, path: &DeployPath) -> bool {
        if path.is_root() || self.tracked.contains(path.as_str()) {
            return true;
        }
        let dir_prefix = format!("{}/", path.as_str());
        self.tracked
            .range(dir_prefix.clone()..)
            .next()
            .is_some_and(|entry| entry.starts_with(&dir_prefix))
    }

    /// Lists tracked files at or below `path`, relative to `path`.
    ///
    /// A tracked file lists as its own file name.
    pub fn list(&self, path: &DeployPath) -> Vec<String> {
        if path.is_root() {
            return self.tracked.iter().cloned().collect();
        }
        if self.tracked.contains(path.as_str()) {
            return path.file_name().map(str::to_owned).into_iter().collect();
        }
        let dir_prefix = format!("{}/", path.as_str());
        self.tracked
            .range(dir_prefix.clone()..)
            .take_while(|entry| entry.starts_with(&dir_prefix))
            .map(|entry| entry[dir_prefix.len()..].to_owned())
            .collect()
    }
}

/// Checks out `remote`'s branch into `dir`.
///
/// `dir` is created if absent and emptied if present.
pub fn checkout(
    git: &Git,
    remote: &RemoteDescriptor,
    dir: &Utf8Path,
) -> Result<Checkout, CheckoutError> {
    if let Some(local) = remote.local_path() {
        if is_within(&local, dir) {
            return Err(CheckoutError::RemoteIsWorkingDirectory {
                remote: local,
                checkout: dir.to_owned(),
            });
        }
    }

    scratch::prepare_dir(dir)?;

    let outcome = git.run(dir, ["init"])?;
    if !outcome.success() {
        return Err(CheckoutError::Init(CommandFailed::from(&outcome)));
    }

    let outcome = git.run(dir, ["remote", "add", "origin", remote.url()])?;
    if !outcome.success() {
        return Err(CheckoutError::RemoteAdd(CommandFailed::from(&outcome)));
    }

    let refspec = format!("refs/heads/{}", remote.branch());
    let outcome = git.run(dir, ["pull", "origin", refspec.as_str()])?;
    let pull = PullStatus::classify(&outcome);
    match &pull {
        PullStatus::Pulled => {
            info!(remote = %remote.display_url(), branch = remote.branch(), "pulled branch");
        }
        PullStatus::BranchMissing => {
            info!(
                remote = %remote.display_url(),
                branch = remote.branch(),
                "branch does not exist yet; it will be created on push"
            );
        }
        PullStatus::Failed { stderr } => {
            warn!(
                remote = %remote.display_url(),
                branch = remote.branch(),
                stderr = stderr.as_str(),
                "git pull failed; continuing as if the branch were new"
            );
        }
    }

    let outcome = git.run(dir, ["ls-files", "-z"])?;
    if !outcome.success() {
        return Err(CheckoutError::ListFiles(CommandFailed::from(&outcome)));
    }
    let tracked = split_nul(outcome.stdout()).map(str::to_owned).collect();

    Ok(Checkout { root: dir.to_owned(), pull, tracked })
}

/// Returns whether `path` is `dir` or lies inside it, either as written or
/// after resolving symlinks.
fn is_within(path: &Utf8Path, dir: &Utf8Path) -> bool {
    if path.starts_with(dir) {
        return true;
    }
    match (path.canonicalize_utf8(), dir.canonicalize_utf8()) {
        (Ok(path), Ok(dir)) => path.starts_with(dir),
        _ => false,
    }
}
