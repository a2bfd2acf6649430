// Copyright 2026 The gitsite Authors

//! Copying deploy content into the checkout and staging it.

use crate::{CommandFailed, Git, MergeError, Probe};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use gitsite::{DeployPath, DeployTarget, TargetKind};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Inputs to [`merge`].
#[derive(Clone, Copy, Debug)]
pub struct MergeRequest<'a> {
    /// The local file or directory being deployed.
    pub source: &'a Utf8Path,
    /// The destination, relative to the repository root (module prefix
    /// already applied).
    pub target: &'a DeployTarget,
    /// Where the target's directory attaches to existing content.
    pub probe: &'a Probe,
    /// Whether the destination already existed in the branch.
    pub pre_existed: bool,
    /// The VCS metadata directory name, never copied or staged.
    pub reserved: &'a str,
}

/// The result of a successful [`merge`].
#[derive(Clone, Debug, Default)]
pub struct MergeOutcome {
    /// Files git reported as newly staged, relative to the repository
    /// root.
    pub staged: BTreeSet<String>,
    /// Number of files copied into the checkout.
    pub copied: usize,
}

/// Places `request.source` at `request.target` inside the checkout at
/// `root`, then stages it.
///
/// Staging is skipped for a file that already existed; `commit -a` picks
/// up the change.
pub fn merge(
    git: &Git,
    root: &Utf8Path,
    request: &MergeRequest<'_>,
) -> Result<MergeOutcome, MergeError> {
    for dir in &request.probe.missing {
        let path = dir.to_path_under(root);
        fs::create_dir_all(&path)
            .map_err(|error| MergeError::CreateDir { path, error })?;
    }

    let destination = request.target.path().to_path_under(root);
    let copied = if same_file(request.source, &destination) {
        debug!(
            source = %request.source,
            "source and destination are the same; skipping copy"
        );
        0
    } else {
        match request.target.kind() {
            TargetKind::File => {
                copy_file(request.source, &destination)?;
                1
            }
            TargetKind::Directory => {
                copy_tree(request.source, &destination, request.reserved)?
            }
        }
    };
    debug!(copied, %destination, "copied content into checkout");

    let mut staged = BTreeSet::new();
    let needs_staging = !request.pre_existed
        || request.target.kind() == TargetKind::Directory;
    if needs_staging {
        stage(git, root, request.target.path(), request.reserved, &mut staged)?;
        info!(count = staged.len(), "staged files");
        if !request.pre_existed && staged.is_empty() {
            return Err(MergeError::ZeroFilesStaged { path: destination });
        }
    }

    Ok(MergeOutcome { staged, copied })
}

/// Returns whether both paths resolve to the same file on disk.
fn same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<(), MergeError> {
    fs::copy(from, to).map_err(|error| MergeError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        error,
    })?;
    Ok(())
}

/// Copies the tree at `from` to `to`, skipping any directory named
/// `reserved`. Returns the number of files copied.
fn copy_tree(
    from: &Utf8Path,
    to: &Utf8Path,
    reserved: &str,
) -> Result<usize, MergeError> {
    let mut copied = 0;
    let mut worklist: Vec<(Utf8PathBuf, Utf8PathBuf)> =
        vec![(from.to_owned(), to.to_owned())];

    while let Some((src_dir, dst_dir)) = worklist.pop() {
        fs::create_dir_all(&dst_dir).map_err(|error| {
            MergeError::CreateDir { path: dst_dir.clone(), error }
        })?;
        let entries = fs::read_dir(&src_dir).map_err(|error| {
            MergeError::ReadDir { path: src_dir.clone(), error }
        })?;
        for entry in entries {
            let entry = entry.map_err(|error| MergeError::ReadDir {
                path: src_dir.clone(),
                error,
            })?;
            let src = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(MergeError::NonUtf8Path)?;
            let Some(name) = src.file_name() else { continue };
            let dst = dst_dir.join(name);
            if src.is_dir() {
                if name == reserved {
                    debug!(path = %src, "skipping VCS metadata directory");
                    continue;
                }
                worklist.push((src, dst));
            } else {
                copy_file(&src, &dst)?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

/// Stages `path` and, if it is a directory, everything below it except
/// `reserved` directories. Newly staged files are added to `staged`.
///
/// Entries found on disk are staged under their names as-is: a file
/// called `a\b.html` is one path segment here, not two.
fn stage(
    git: &Git,
    root: &Utf8Path,
    path: &DeployPath,
    reserved: &str,
    staged: &mut BTreeSet<String>,
) -> Result<(), MergeError> {
    let mut worklist = vec![path.as_str().to_owned()];
    while let Some(current) = worklist.pop() {
        if !current.is_empty() {
            let outcome = add_with_retry(git, root, &current)?;
            staged.extend(parse_added(outcome.stdout()).map(str::to_owned));
        }

        let local = root.join(&current);
        if !local.is_dir() {
            continue;
        }
        let entries = fs::read_dir(&local)
            .map_err(|error| MergeError::ReadDir { path: local.clone(), error })?;
        for entry in entries {
            let entry = entry.map_err(|error| MergeError::ReadDir {
                path: local.clone(),
                error,
            })?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| MergeError::NonUtf8Path(entry.path()))?;
            if name == reserved {
                continue;
            }
            if current.is_empty() {
                worklist.push(name);
            } else {
                worklist.push(format!("{current}/{name}"));
            }
        }
    }
    Ok(())
}

fn add_with_retry(
    git: &Git,
    root: &Utf8Path,
    path: &str,
) -> Result<crate::CommandOutcome, MergeError> {
    let args = ["add", "--verbose", "--", path];
    let outcome = git.run(root, args)?;
    if outcome.success() {
        return Ok(outcome);
    }
    warn!(
        path,
        stderr = outcome.stderr().trim(),
        "git add failed; retrying once"
    );
    let outcome = git.run(root, args)?;
    if outcome.success() {
        Ok(outcome)
    } else {
        Err(MergeError::Add {
            path: path.to_owned(),
            error: CommandFailed::from(&outcome),
        })
    }
}

/// Extracts paths from `git add --verbose` output lines of the form
/// `add '<path>'`.
fn parse_added(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().filter_map(|line| {
        line.strip_prefix("add '").and_then(|rest| rest.strip_suffix('\''))
    })
}
