// Copyright 2026 The gitsite Authors

//! The check-in step: commit everything in the checkout and push it.

use crate::{CheckInError, CommandFailed, Git, git::split_nul};
use camino::Utf8Path;
use camino_tempfile::Builder;
use std::io::Write;
use tracing::{info, warn};

const MESSAGE_FILE_PREFIX: &str = "gitsite-commit-";

/// The result of a successful check-in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckIn {
    /// Paths `git status` reported as changed before the commit.
    pub changed: Vec<String>,
}

/// Commits the checkout at `dir` with `message` and pushes it to
/// `branch` on `origin`.
///
/// With `files`, only those paths are added and committed. Without, every
/// tracked change is committed (`commit -a`). The commit is made even when
/// nothing changed.
///
/// The message is passed to git through a temporary file in the checkout's
/// `.git` directory, which is deleted before this returns.
pub fn check_in(
    git: &Git,
    dir: &Utf8Path,
    message: &str,
    branch: &str,
    files: Option<&[String]>,
) -> Result<CheckIn, CheckInError> {
    if let Some(files) = files.filter(|files| !files.is_empty()) {
        let args = ["add", "--"].into_iter().chain(files.iter().map(String::as_str));
        let outcome = git.run(dir, args)?;
        if !outcome.success() {
            return Err(CheckInError::Add(CommandFailed::from(&outcome)));
        }
    }

    let changed = changed_paths(git, dir)?;
    info!(count = changed.len(), "changed paths before commit");

    // Dropped (and deleted) at the end of this function on every path.
    let mut message_file = Builder::new()
        .prefix(MESSAGE_FILE_PREFIX)
        .suffix(".txt")
        .tempfile_in(dir.join(".git"))
        .map_err(CheckInError::MessageFile)?;
    message_file
        .write_all(message.as_bytes())
        .and_then(|()| message_file.flush())
        .map_err(CheckInError::MessageFile)?;

    let mut args = vec![
        "commit".to_owned(),
        "--allow-empty".to_owned(),
        "-F".to_owned(),
        message_file.path().to_string(),
    ];
    match files {
        Some(files) if !files.is_empty() => {
            args.push("--".to_owned());
            args.extend(files.iter().cloned());
        }
        _ => args.push("-a".to_owned()),
    }
    let outcome = git.run(dir, &args)?;
    if !outcome.success() {
        return Err(CheckInError::Commit(CommandFailed::from(&outcome)));
    }

    let refspec = format!("HEAD:refs/heads/{branch}");
    let outcome = git.run(dir, ["push", "origin", refspec.as_str()])?;
    if !outcome.success() {
        return Err(CheckInError::Push(CommandFailed::from(&outcome)));
    }
    info!(branch, "pushed");

    Ok(CheckIn { changed })
}

/// Runs `git status --porcelain -z`. A failing status is logged and
/// reported as no changes.
fn changed_paths(git: &Git, dir: &Utf8Path) -> Result<Vec<String>, CheckInError> {
    let outcome = git.run(dir, ["status", "--porcelain", "-z"])?;
    if !outcome.success() {
        warn!(
            stderr = outcome.stderr().trim(),
            "git status failed; not recording changed paths"
        );
        return Ok(Vec::new());
    }
    Ok(parse_porcelain(outcome.stdout()))
}

/// Parses `git status --porcelain -z` output into the paths that will be
/// committed. Untracked and ignored entries are skipped. Renames and
/// copies report the new path; the original path that follows is
/// dropped.
fn parse_porcelain(stdout: &str) -> Vec<String> {
    let mut changed = Vec::new();
    let mut entries = split_nul(stdout);
    while let Some(entry) = entries.next() {
        if entry.len() < 4 {
            continue;
        }
        let (status, path) = entry.split_at(3);
        let xy = status.as_bytes();
        if matches!(&xy[..2], b"??" | b"!!") {
            continue;
        }
        if matches!(xy[0], b'R' | b'C') || matches!(xy[1], b'R' | b'C') {
            entries.next();
        }
        changed.push(path.to_owned());
    }
    changed
}
