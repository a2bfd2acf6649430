// Copyright 2026 The gitsite Authors

//! The deploy orchestrator.

use crate::{
    Git, MergeRequest, PullStatus, ScratchDir, WagonError, check_in, checkout,
    merge, probe,
};
use camino::{Utf8Path, Utf8PathBuf};
use gitsite::{
    Credentials, DeployPath, DeployTarget, RemoteDescriptor, SiteUrl,
    TargetKind,
};
use std::{fmt, time::SystemTime};
use tracing::{info, warn};

/// The commit message used unless [`WagonConfig::with_commit_message`] is
/// set. `{name}` is replaced with the source's file name.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Deploying {name} to repository";

/// Where a [`SiteWagon`] is in its connect/deploy/close cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WagonState {
    /// No connection; no scratch directory.
    Disconnected,
    /// Connected, with an idle scratch directory.
    Connected,
    /// The branch has been checked out into the scratch directory.
    CheckedOut,
    /// Content has been copied and staged.
    Merged,
    /// The commit has been pushed.
    CommittedPushed,
}

impl fmt::Display for WagonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WagonState::Disconnected => "disconnected",
            WagonState::Connected => "connected",
            WagonState::CheckedOut => "checked out",
            WagonState::Merged => "merged",
            WagonState::CommittedPushed => "committed and pushed",
        })
    }
}

/// Configuration for a [`SiteWagon`].
#[derive(Clone, Debug, Default)]
pub struct WagonConfig {
    git: Option<Git>,
    checkout_dir: Option<Utf8PathBuf>,
    temp_root: Option<Utf8PathBuf>,
    commit_message: Option<String>,
}

impl WagonConfig {
    /// Creates a configuration with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `git` instead of the runner from [`Git::from_env`].
    pub fn with_git(mut self, git: Git) -> Self {
        self.git = Some(git);
        self
    }

    /// Uses a fixed checkout directory. Anything already there is deleted
    /// on connect.
    pub fn with_checkout_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.checkout_dir = Some(dir.into());
        self
    }

    /// Creates random checkout directories under `root` instead of the
    /// system temporary directory.
    pub fn with_temp_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Sets the commit message template. `{name}` is replaced with the
    /// source's file name.
    pub fn with_commit_message(mut self, template: impl Into<String>) -> Self {
        self.commit_message = Some(template.into());
        self
    }

    fn render_message(&self, name: &str) -> String {
        self.commit_message
            .as_deref()
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
            .replace("{name}", name)
    }

    fn scratch_dir(&self) -> Result<ScratchDir, WagonError> {
        if let Some(dir) = &self.checkout_dir {
            return ScratchDir::create(dir.clone()).map_err(WagonError::Scratch);
        }
        let root = match &self.temp_root {
            Some(root) => root.clone(),
            None => Utf8PathBuf::from_path_buf(std::env::temp_dir())
                .map_err(WagonError::NonUtf8TempDir)?,
        };
        ScratchDir::random(&root).map_err(WagonError::Scratch)
    }
}

/// A summary of one successful deploy.
#[derive(Clone, Debug)]
pub struct DeployReport {
    /// The destination, relative to the repository root.
    pub target: DeployPath,
    /// Newly staged files, relative to the destination directory (for a
    /// file deploy, relative to its parent).
    pub staged: Vec<String>,
    /// Paths `git status` reported as changed before the commit, relative
    /// to the repository root.
    pub changed: Vec<String>,
    /// How the pull went.
    pub pull: PullStatus,
}

#[derive(Debug)]
struct Connection {
    git: Git,
    remote: RemoteDescriptor,
    scratch: ScratchDir,
}

/// Deploys files and directory trees to a branch of a git repository.
///
/// Each deploy checks the branch out into a scratch directory, copies the
/// content in, commits and pushes. A deploy that fails part-way removes
/// the scratch directory and leaves the wagon disconnected.
///
/// ```no_run
/// use camino::Utf8Path;
/// use gitsite::Credentials;
/// use gitsite_wagon::{SiteWagon, WagonConfig};
///
/// # fn main() -> Result<(), gitsite_wagon::WagonError> {
/// let mut wagon = SiteWagon::new(WagonConfig::new());
/// wagon.connect(
///     "gitsite:git@github.com/user/project.git",
///     &Credentials::new(),
/// )?;
/// wagon.put_directory(Utf8Path::new("target/site"), "")?;
/// wagon.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SiteWagon {
    config: WagonConfig,
    state: WagonState,
    connection: Option<Connection>,
}

impl SiteWagon {
    /// Creates a disconnected wagon.
    pub fn new(config: WagonConfig) -> Self {
        SiteWagon { config, state: WagonState::Disconnected, connection: None }
    }

    /// Returns the current state.
    pub fn state(&self) -> WagonState {
        self.state
    }

    /// Returns the remote, if connected.
    pub fn remote(&self) -> Option<&RemoteDescriptor> {
        self.connection.as_ref().map(|conn| &conn.remote)
    }

    /// Returns the scratch checkout directory, if connected.
    pub fn scratch_path(&self) -> Option<&Utf8Path> {
        self.connection.as_ref().map(|conn| conn.scratch.path())
    }

    /// Directory trees can be deployed with
    /// [`put_directory`](Self::put_directory).
    pub fn supports_directory_copy(&self) -> bool {
        true
    }

    /// Connects to the repository named by `url`.
    ///
    /// URL errors are reported here, before git is run. The scratch
    /// directory is created (or emptied) but nothing is checked out yet.
    pub fn connect(
        &mut self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<(), WagonError> {
        if let Some(conn) = &self.connection {
            return Err(WagonError::AlreadyConnected {
                remote: conn.remote.display_url().into_owned(),
            });
        }

        let site: SiteUrl = url.parse()?;
        let remote = RemoteDescriptor::new(&site)?.with_credentials(credentials);

        let mut git = match &self.config.git {
            Some(git) => git.clone(),
            None => Git::from_env()?,
        };
        if let Some(key) = credentials.private_key() {
            git = git.with_env("GIT_SSH_COMMAND", ssh_command(key));
        }
        if credentials.passphrase().is_some() {
            warn!(
                "a private key passphrase cannot be passed to git; use an \
                 ssh agent for encrypted keys"
            );
        }

        let scratch = self.config.scratch_dir()?;
        info!(%remote, checkout = %scratch.path(), "connected");
        self.connection = Some(Connection { git, remote, scratch });
        self.state = WagonState::Connected;
        Ok(())
    }

    /// Deploys a single file to `destination`, a path relative to the
    /// module root.
    pub fn put(
        &mut self,
        source: &Utf8Path,
        destination: &str,
    ) -> Result<DeployReport, WagonError> {
        self.require_connected("put")?;
        if !source.exists() {
            return Err(WagonError::SourceNotFound { path: source.to_owned() });
        }
        if source.is_dir() {
            return Err(WagonError::NotAFile { path: source.to_owned() });
        }
        let target = DeployTarget::file(DeployPath::new(destination)?)?;
        self.deploy(source, &target)
    }

    /// Deploys the tree at `source` to `destination`, a directory path
    /// relative to the module root (empty for the root itself).
    pub fn put_directory(
        &mut self,
        source: &Utf8Path,
        destination: &str,
    ) -> Result<DeployReport, WagonError> {
        self.require_connected("put_directory")?;
        if !source.exists() {
            return Err(WagonError::SourceNotFound { path: source.to_owned() });
        }
        if !source.is_dir() {
            return Err(WagonError::NotADirectory { path: source.to_owned() });
        }
        let target = DeployTarget::directory(DeployPath::new(destination)?);
        self.deploy(source, &target)
    }

    /// Lists the files tracked at or below `path`, relative to `path`.
    ///
    /// This checks out the branch but fetches no content. A path with
    /// nothing tracked is [`WagonError::ResourceDoesNotExist`].
    pub fn file_list(&mut self, path: &str) -> Result<Vec<String>, WagonError> {
        let conn = self
            .connection
            .as_ref()
            .ok_or(WagonError::NotConnected { operation: "file_list" })?;
        let path = DeployPath::new(path)?;

        let checkout =
            checkout(&conn.git, &conn.remote, conn.scratch.path()).map_err(
                |error| WagonError::Checkout {
                    branch: conn.remote.branch().to_owned(),
                    error,
                },
            )?;
        let files = checkout.list(&conn.remote.repository_path(&path));
        if files.is_empty() {
            return Err(WagonError::ResourceDoesNotExist { path });
        }
        Ok(files)
    }

    /// Returns whether anything is tracked at `path`.
    pub fn resource_exists(&mut self, path: &str) -> Result<bool, WagonError> {
        match self.file_list(path) {
            Ok(_) => Ok(true),
            Err(WagonError::ResourceDoesNotExist { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Downloading is not supported.
    pub fn get(
        &mut self,
        _resource: &str,
        _destination: &Utf8Path,
    ) -> Result<(), WagonError> {
        Err(WagonError::Unsupported { operation: "get" })
    }

    /// Downloading is not supported.
    pub fn get_if_newer(
        &mut self,
        _resource: &str,
        _destination: &Utf8Path,
        _timestamp: SystemTime,
    ) -> Result<bool, WagonError> {
        Err(WagonError::Unsupported { operation: "get_if_newer" })
    }

    /// Disconnects, deleting the scratch directory. Closing a
    /// disconnected wagon does nothing.
    pub fn close(&mut self) -> Result<(), WagonError> {
        self.state = WagonState::Disconnected;
        match self.connection.take() {
            Some(conn) => {
                conn.scratch.remove().map_err(WagonError::Cleanup)?;
                info!("disconnected");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn require_connected(
        &self,
        operation: &'static str,
    ) -> Result<(), WagonError> {
        if self.connection.is_none() {
            return Err(WagonError::NotConnected { operation });
        }
        Ok(())
    }

    fn deploy(
        &mut self,
        source: &Utf8Path,
        target: &DeployTarget,
    ) -> Result<DeployReport, WagonError> {
        let Some(conn) = &self.connection else {
            return Err(WagonError::NotConnected { operation: "deploy" });
        };
        let name = source.file_name().unwrap_or(source.as_str());
        let message = self.config.render_message(name);
        info!(%source, destination = %target.path(), "deploying");

        match run_deploy(conn, source, target, &message, &mut self.state) {
            Ok(report) => {
                self.state = WagonState::Connected;
                info!(
                    staged = report.staged.len(),
                    changed = report.changed.len(),
                    "deploy complete"
                );
                Ok(report)
            }
            Err(error) => {
                self.abort();
                Err(error)
            }
        }
    }

    /// Drops the connection after a failed deploy.
    fn abort(&mut self) {
        self.state = WagonState::Disconnected;
        if let Some(conn) = self.connection.take() {
            if let Err(error) = conn.scratch.remove() {
                warn!(%error, "failed to remove checkout directory after error");
            }
        }
    }
}

fn run_deploy(
    conn: &Connection,
    source: &Utf8Path,
    target: &DeployTarget,
    message: &str,
    state: &mut WagonState,
) -> Result<DeployReport, WagonError> {
    let root = conn.scratch.path();
    let branch = conn.remote.branch();

    let checkout = checkout(&conn.git, &conn.remote, root).map_err(|error| {
        WagonError::Checkout { branch: branch.to_owned(), error }
    })?;
    *state = WagonState::CheckedOut;

    let repo_path = conn.remote.repository_path(target.path());
    let repo_target = match target.kind() {
        TargetKind::File => DeployTarget::file(repo_path.clone())?,
        TargetKind::Directory => DeployTarget::directory(repo_path.clone()),
    };
    let Ok(found) = probe(&repo_target.directory_path(), |path| {
        Ok::<_, std::convert::Infallible>(checkout.exists(path))
    });
    let pre_existed = match target.kind() {
        TargetKind::File => checkout.exists(&repo_path),
        TargetKind::Directory => found.is_complete(),
    };

    let merged = merge(
        &conn.git,
        root,
        &MergeRequest {
            source,
            target: &repo_target,
            probe: &found,
            pre_existed,
            reserved: conn.remote.provider().reserved_file_name(),
        },
    )
    .map_err(|error| WagonError::Merge { state: *state, error })?;
    *state = WagonState::Merged;

    let checked_in = check_in(&conn.git, root, message, branch, None)
        .map_err(|error| WagonError::CheckIn {
            branch: branch.to_owned(),
            pull_failure: checkout.pull().failure().map(str::to_owned),
            error,
        })?;
    *state = WagonState::CommittedPushed;

    let base = repo_target.directory_path();
    let staged = merged
        .staged
        .iter()
        .map(|path| relative_to(&base, path).to_owned())
        .collect();
    Ok(DeployReport {
        target: repo_path,
        staged,
        changed: checked_in.changed,
        pull: checkout.pull().clone(),
    })
}

/// Strips the directory `base` from a repository-relative path.
fn relative_to<'a>(base: &DeployPath, path: &'a str) -> &'a str {
    if base.is_root() {
        return path;
    }
    path.strip_prefix(base.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

/// Builds a `GIT_SSH_COMMAND` that authenticates with `key` only.
fn ssh_command(key: &Utf8Path) -> String {
    format!(
        "ssh -i '{}' -o IdentitiesOnly=yes",
        key.as_str().replace('\'', r"'\''")
    )
}
