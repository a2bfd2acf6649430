// Copyright 2026 The gitsite Authors

//! Error types for site deployment.

use crate::{CommandOutcome, WagonState};
use camino::Utf8PathBuf;
use gitsite::{DeployPath, DeployPathError, SiteUrlParseError};
use std::{ffi::OsString, io};
use thiserror::Error;

// ---- Command runner errors ----

/// An error from reading the git binary path from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GitEnvError {
    /// The environment variable is set but is not valid UTF-8.
    #[error(
        "${var} environment variable is not valid \
         UTF-8: {value:?}"
    )]
    NonUtf8 {
        /// The environment variable name.
        var: &'static str,
        /// The non-UTF-8 value.
        value: OsString,
    },
}

/// The git process could not be started.
#[derive(Debug, Error)]
#[error("failed to run {binary:?} in {dir} (`{command}`)")]
pub struct SpawnError {
    /// The path to the git executable.
    pub binary: String,
    /// The working directory where the command was run.
    pub dir: Utf8PathBuf,
    /// The rendered command line, with credentials redacted.
    pub command: String,
    /// The underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// A git command ran but exited unsuccessfully.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("`{command}` failed ({exit_status}): {stderr}")]
pub struct CommandFailed {
    /// The rendered command line, with credentials redacted.
    pub command: String,
    /// A human-readable description of the exit status (e.g.,
    /// "exit status: 128" or "signal: 9").
    pub exit_status: String,
    /// The trimmed stderr output from git.
    pub stderr: String,
}

impl From<&CommandOutcome> for CommandFailed {
    fn from(outcome: &CommandOutcome) -> Self {
        CommandFailed {
            command: outcome.command().to_owned(),
            exit_status: outcome.status().to_string(),
            stderr: outcome.stderr().trim().to_owned(),
        }
    }
}

// ---- Scratch directory errors ----

/// An error while managing the scratch checkout directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScratchError {
    /// Failed to create the scratch directory.
    #[error("failed to create checkout directory {path}")]
    Create {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to empty an existing scratch directory.
    #[error("failed to clean checkout directory {path}")]
    Clean {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to delete the scratch directory.
    #[error("unable to clean up checkout directory {path}")]
    Remove {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },
}

// ---- Deploy step errors ----

/// An error from the checkout step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckoutError {
    /// A `file://` remote points into the checkout directory.
    #[error(
        "remote repository {remote} must not be the working directory \
         {checkout}"
    )]
    RemoteIsWorkingDirectory {
        /// The local path of the remote repository.
        remote: Utf8PathBuf,
        /// The checkout directory.
        checkout: Utf8PathBuf,
    },

    /// The checkout directory could not be created or emptied.
    #[error("failed to prepare checkout directory")]
    Prepare(#[from] ScratchError),

    /// git could not be started.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// `git init` failed.
    #[error("the git-init command failed")]
    Init(#[source] CommandFailed),

    /// `git remote add origin` failed.
    #[error("the git-remote command failed")]
    RemoteAdd(#[source] CommandFailed),

    /// `git ls-files` failed.
    #[error("the git-ls-files command failed")]
    ListFiles(#[source] CommandFailed),
}

/// An error from copying content into the checkout or staging it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MergeError {
    /// A directory inside the checkout could not be created.
    #[error("failed to create directory {path}")]
    CreateDir {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// A directory could not be listed.
    #[error("failed to read directory {path}")]
    ReadDir {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// A file could not be copied into the checkout.
    #[error("failed to copy {from} to {to}")]
    Copy {
        /// The source file.
        from: Utf8PathBuf,
        /// The destination file.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// A path is not valid UTF-8.
    #[error("path {0:?} is not valid UTF-8")]
    NonUtf8Path(std::path::PathBuf),

    /// git could not be started.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// `git add` failed twice for the same path.
    #[error("failed to add {path} to the working copy")]
    Add {
        /// The path being staged, relative to the staging directory.
        path: String,
        /// The second failure.
        #[source]
        error: CommandFailed,
    },

    /// The destination is new but git reported no staged files.
    #[error(
        "unable to add {path} to the repository: no files were staged"
    )]
    ZeroFilesStaged {
        /// The destination inside the checkout.
        path: Utf8PathBuf,
    },
}

/// An error from the commit and push step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckInError {
    /// The temporary commit message file could not be written.
    #[error("error while making a temporary file for the commit message")]
    MessageFile(#[source] io::Error),

    /// git could not be started.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// `git add` of the explicit file list failed.
    #[error("the git-add command failed")]
    Add(#[source] CommandFailed),

    /// `git commit` failed.
    #[error("the git-commit command failed")]
    Commit(#[source] CommandFailed),

    /// `git push` failed.
    #[error("the git-push command failed")]
    Push(#[source] CommandFailed),
}

// ---- Orchestrator errors ----

/// An error from a [`SiteWagon`](crate::SiteWagon) operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WagonError {
    /// The git binary could not be determined from the environment.
    #[error(transparent)]
    GitEnv(#[from] GitEnvError),

    /// The repository URL could not be parsed.
    #[error("invalid repository URL")]
    SiteUrl(#[from] SiteUrlParseError),

    /// The destination path is invalid.
    #[error("invalid destination path")]
    InvalidPath(#[from] DeployPathError),

    /// The operation needs a connection.
    #[error("{operation} requires a connected wagon")]
    NotConnected {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// `connect` was called on a connected wagon.
    #[error("wagon is already connected to {remote}")]
    AlreadyConnected {
        /// The current remote, with credentials redacted.
        remote: String,
    },

    /// The operation is not supported by this transport.
    #[error("not currently supported: {operation}")]
    Unsupported {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// The source of a deploy does not exist.
    #[error("source {path} does not exist")]
    SourceNotFound {
        /// The source path.
        path: Utf8PathBuf,
    },

    /// `put_directory` was given something other than a directory.
    #[error("source is not a directory: {path}")]
    NotADirectory {
        /// The source path.
        path: Utf8PathBuf,
    },

    /// `put` was given a directory.
    #[error("source is not a file: {path}")]
    NotAFile {
        /// The source path.
        path: Utf8PathBuf,
    },

    /// Nothing is tracked at the requested path.
    #[error("resource {path} does not exist in the repository")]
    ResourceDoesNotExist {
        /// The requested path.
        path: DeployPath,
    },

    /// The system temporary directory is not valid UTF-8.
    #[error("temporary directory {0:?} is not valid UTF-8")]
    NonUtf8TempDir(std::path::PathBuf),

    /// The scratch directory could not be set up.
    #[error("failed to set up checkout directory")]
    Scratch(#[source] ScratchError),

    /// The checkout step failed.
    #[error("error checking out {branch}")]
    Checkout {
        /// The branch being checked out.
        branch: String,
        /// The underlying error.
        #[source]
        error: CheckoutError,
    },

    /// Copying or staging content failed.
    #[error("error merging content into checkout (state {state})")]
    Merge {
        /// The state the deploy failed in.
        state: WagonState,
        /// The underlying error.
        #[source]
        error: MergeError,
    },

    /// Commit or push failed.
    #[error(
        "error committing to {branch}{}",
        pull_note(.pull_failure)
    )]
    CheckIn {
        /// The branch being deployed to.
        branch: String,
        /// Stderr from an earlier `git pull` failure in the same deploy,
        /// which was tolerated at the time.
        pull_failure: Option<String>,
        /// The underlying error.
        #[source]
        error: CheckInError,
    },

    /// The scratch directory could not be deleted.
    #[error("unable to clean up checkout directory")]
    Cleanup(#[source] ScratchError),
}

impl WagonError {
    /// Returns whether this is an [`Unsupported`](Self::Unsupported)
    /// error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, WagonError::Unsupported { .. })
    }
}

fn pull_note(pull_failure: &Option<String>) -> String {
    match pull_failure {
        Some(stderr) => format!(" (earlier git-pull also failed: {stderr})"),
        None => String::new(),
    }
}
