// Copyright 2026 The gitsite Authors

//! Integration tests for gitsite-wagon.
//!
//! These drive a real git (respecting `$GIT`) against bare repositories in
//! temporary directories, reached through `file://` URLs.

mod deploy;

use anyhow::{Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use gitsite::Credentials;
use gitsite_wagon::{Git, SiteWagon, WagonConfig};
use std::{fs, io::Write, process::Command};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Returns a `Command` for git, respecting the `$GIT` environment variable.
fn git_command() -> Command {
    let bin = std::env::var("GIT").unwrap_or_else(|_| "git".to_string());
    Command::new(bin)
}

/// Writes content to a file atomically, creating parent directories.
fn write_file(
    path: impl AsRef<Utf8Path>,
    content: impl AsRef<[u8]>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(content.as_ref()))
        .map_err(|e| e.into())
}

/// A bare remote repository plus a place for site sources and checkouts.
struct Fixture {
    temp: Utf8TempDir,
    remote: Utf8PathBuf,
}

impl Fixture {
    fn new() -> Result<Self> {
        let temp = Utf8TempDir::with_prefix("gitsite-wagon-")?;
        let remote = temp.path().join("remote.git");
        fs::create_dir_all(&remote)?;
        let status = git_command()
            .args(["init", "--bare"])
            .current_dir(&remote)
            .status()?;
        assert!(status.success(), "git init --bare failed");
        Ok(Fixture { temp, remote })
    }

    fn path(&self) -> &Utf8Path {
        self.temp.path()
    }

    /// The `gitsite:` URL for the remote, with an optional module suffix.
    fn url(&self, module: &str) -> String {
        if module.is_empty() {
            format!("gitsite:file://{}", self.remote)
        } else {
            format!("gitsite:file://{}/{module}", self.remote)
        }
    }

    /// A wagon whose commits carry a fixed identity and whose checkouts
    /// live inside the fixture.
    fn wagon(&self) -> Result<SiteWagon> {
        let git = Git::from_env()?
            .with_env("GIT_AUTHOR_NAME", "Test User")
            .with_env("GIT_AUTHOR_EMAIL", "test@example.com")
            .with_env("GIT_COMMITTER_NAME", "Test User")
            .with_env("GIT_COMMITTER_EMAIL", "test@example.com");
        let scratch_root = self.path().join("scratch");
        fs::create_dir_all(&scratch_root)?;
        Ok(SiteWagon::new(
            WagonConfig::new().with_git(git).with_temp_root(scratch_root),
        ))
    }

    fn connected(&self, module: &str) -> Result<SiteWagon> {
        let mut wagon = self.wagon()?;
        wagon.connect(&self.url(module), &Credentials::new())?;
        Ok(wagon)
    }

    /// Lists the files on `branch` in the remote.
    fn remote_files(&self, branch: &str) -> Result<Vec<String>> {
        let output = git_command()
            .args(["ls-tree", "-r", "-z", "--name-only", branch])
            .current_dir(&self.remote)
            .output()?;
        assert!(
            output.status.success(),
            "git ls-tree failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(String::from_utf8(output.stdout)?
            .split('\0')
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Reads a file from `branch` in the remote.
    fn remote_contents(&self, branch: &str, path: &str) -> Result<String> {
        let output = git_command()
            .args(["show", &format!("{branch}:{path}")])
            .current_dir(&self.remote)
            .output()?;
        assert!(
            output.status.success(),
            "git show failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).context("non-UTF-8 file contents")
    }

    /// Counts commits on `branch` in the remote.
    fn commit_count(&self, branch: &str) -> Result<usize> {
        let output = git_command()
            .args(["rev-list", "--count", branch])
            .current_dir(&self.remote)
            .output()?;
        assert!(output.status.success(), "git rev-list failed");
        Ok(String::from_utf8(output.stdout)?.trim().parse()?)
    }

    /// Creates a site tree with `a.html`, `sub/b.html` and a `.git`
    /// directory that must never be deployed.
    fn site_tree(&self, name: &str) -> Result<Utf8PathBuf> {
        let root = self.path().join(name);
        write_file(root.join("a.html"), "<p>a</p>")?;
        write_file(root.join("sub").join("b.html"), "<p>b</p>")?;
        write_file(root.join(".git").join("HEAD"), "ref: refs/heads/main\n")?;
        Ok(root)
    }
}
