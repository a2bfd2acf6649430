// Copyright 2026 The gitsite Authors

//! The git command runner.

use crate::{GitEnvError, SpawnError};
use camino::Utf8Path;
use std::{
    fmt,
    process::{Command, ExitStatus, Stdio},
};
use tracing::debug;

/// Reads the git binary path from `$GIT`, falling back to `"git"` if the
/// variable is unset or empty.
///
/// The value is trimmed of leading and trailing whitespace.
///
/// Returns an error if the variable is set but is not valid UTF-8.
fn read_git_env() -> Result<String, GitEnvError> {
    const VAR: &str = "GIT";
    match std::env::var(VAR) {
        Ok(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok("git".to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(std::env::VarError::NotPresent) => Ok("git".to_string()),
        Err(std::env::VarError::NotUnicode(value)) => {
            Err(GitEnvError::NonUtf8 { var: VAR, value })
        }
    }
}

/// Runs the external `git` binary.
///
/// Every invocation spawns one process and blocks until it exits. There are
/// no retries and no timeout. A non-zero exit is reported through
/// [`CommandOutcome::success`], not as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    binary: String,
    envs: Vec<(String, String)>,
}

impl Git {
    /// Creates a runner using the `$GIT` environment variable or `"git"`.
    ///
    /// Returns an error if `$GIT` is set but is not valid UTF-8.
    pub fn from_env() -> Result<Self, GitEnvError> {
        Ok(Git::new(read_git_env()?))
    }

    /// Creates a runner for a specific git binary.
    pub fn new(binary: impl Into<String>) -> Self {
        Git { binary: binary.into(), envs: Vec::new() }
    }

    /// Adds an environment variable to every invocation.
    ///
    /// Setting the same variable twice keeps the last value.
    pub fn with_env(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let key = key.into();
        self.envs.retain(|(k, _)| *k != key);
        self.envs.push((key, value.into()));
        self
    }

    /// Returns the path to the git binary.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Returns the extra environment variables set on every invocation.
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Runs git with `args` in `dir` and captures its output.
    ///
    /// `GIT_TERMINAL_PROMPT=0` is always set and stdin is closed, so git
    /// fails instead of waiting for interactive input.
    pub fn run<I, S>(
        &self,
        dir: &Utf8Path,
        args: I,
    ) -> Result<CommandOutcome, SpawnError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> =
            args.into_iter().map(|arg| arg.as_ref().to_owned()).collect();
        let command = render_command(&self.binary, &args);
        debug!(%command, %dir, "running git");

        let output = Command::new(&self.binary)
            .current_dir(dir)
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SpawnError {
                binary: self.binary.clone(),
                dir: dir.to_owned(),
                command: command.clone(),
                source,
            })?;

        let outcome = CommandOutcome {
            command,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !outcome.success() {
            debug!(
                command = %outcome.command,
                status = %outcome.status,
                stderr = outcome.stderr.trim(),
                "git exited unsuccessfully"
            );
        }
        Ok(outcome)
    }
}

/// The result of one git invocation.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    command: String,
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl CommandOutcome {
    /// Returns the rendered command line, with credentials redacted.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the exit status.
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Returns the exit code, or `None` if the process was killed by a
    /// signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Returns whether git exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Returns the captured standard output.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns the captured standard error.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` ({})", self.command, self.status)
    }
}

/// Splits NUL-separated output (from `-z` flags) into entries.
pub(crate) fn split_nul(output: &str) -> impl Iterator<Item = &str> {
    output.split('\0').filter(|entry| !entry.is_empty())
}

/// Renders a command line for logs and errors, redacting URL passwords and
/// quoting arguments that contain whitespace.
fn render_command(binary: &str, args: &[String]) -> String {
    let mut rendered = binary.to_owned();
    for arg in args {
        rendered.push(' ');
        let arg = gitsite::redact_url(arg);
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(&arg.replace('"', "\\\""));
            rendered.push('"');
        } else {
            rendered.push_str(&arg);
        }
    }
    rendered
}
