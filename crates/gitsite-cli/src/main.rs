// Copyright 2026 The gitsite Authors

//! The `gitsite` command-line tool.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use gitsite::Credentials;
use gitsite_wagon::{DeployReport, SiteWagon, WagonConfig};
use tracing_subscriber::EnvFilter;

/// Deploy site documentation to a git pages branch
///
/// Each deploy checks out the branch into a scratch directory, copies the
/// content in, commits and pushes. A branch that does not exist yet is
/// created by the first push.
///
/// URL FORMS:
///
///   gitsite:github.com/user/project.git            (ssh, gh-pages branch)
///   gitsite:https://host/user/project.git:pages    (https, pages branch)
///   gitsite:file:///srv/site.git/moduleA           (files under moduleA/)
///   scm:git:ssh://host/user/project.git
///
/// The git binary is taken from $GIT, falling back to `git`.
#[derive(Parser)]
#[command(name = "gitsite")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// The repository URL
    #[arg(long, env = "GITSITE_URL", global = true)]
    url: Option<String>,

    /// User name to put into ssh and http(s) URLs
    #[arg(long, global = true)]
    username: Option<String>,

    /// Password to put into http(s) URLs
    #[arg(long, env = "GITSITE_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Private key for ssh remotes
    #[arg(long, global = true)]
    private_key: Option<Utf8PathBuf>,

    /// Use this directory for the checkout instead of a temporary one
    ///
    /// Anything already in the directory is deleted.
    #[arg(long, global = true)]
    checkout_dir: Option<Utf8PathBuf>,

    /// Commit message; `{name}` is replaced with the source's file name
    #[arg(long, global = true)]
    message: Option<String>,

    /// Log git commands and other details (sets the log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a single file
    Put {
        /// The file to deploy
        source: Utf8PathBuf,
        /// The destination path inside the branch
        dest: String,
    },

    /// Deploy a directory tree
    #[command(name = "put-dir")]
    PutDir {
        /// The directory to deploy
        source: Utf8PathBuf,
        /// The destination directory inside the branch (default: the root)
        #[arg(default_value = "")]
        dest: String,
    },

    /// List files on the branch at or below a path
    Ls {
        /// The path to list (default: the root)
        #[arg(default_value = "")]
        path: String,
    },

    /// Check whether anything exists at a path on the branch
    ///
    /// Exits with status 1 if nothing does.
    Exists {
        /// The path to check
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let url = cli
        .global
        .url
        .clone()
        .context("no repository URL given (use --url or GITSITE_URL)")?;

    let mut wagon = SiteWagon::new(config(&cli.global));
    wagon
        .connect(&url, &credentials(&cli.global))
        .with_context(|| format!("failed to connect to {}", gitsite::redact_url(&url)))?;

    let result = run(&mut wagon, cli.command);
    let closed = wagon.close();
    let found = result?;
    closed?;

    if !found {
        std::process::exit(1);
    }
    Ok(())
}

/// Runs one command. Returns false when `exists` found nothing.
fn run(wagon: &mut SiteWagon, command: Commands) -> Result<bool> {
    match command {
        Commands::Put { source, dest } => {
            let report = wagon
                .put(&source, &dest)
                .with_context(|| format!("failed to deploy {source}"))?;
            print_report(&report);
        }
        Commands::PutDir { source, dest } => {
            let report = wagon
                .put_directory(&source, &dest)
                .with_context(|| format!("failed to deploy {source}"))?;
            print_report(&report);
        }
        Commands::Ls { path } => {
            for file in wagon.file_list(&path)? {
                println!("{file}");
            }
        }
        Commands::Exists { path } => {
            let exists = wagon.resource_exists(&path)?;
            println!("{}", if exists { "yes" } else { "no" });
            return Ok(exists);
        }
    }
    Ok(true)
}

fn print_report(report: &DeployReport) {
    for file in &report.staged {
        println!("added {file}");
    }
    eprintln!(
        "deployed {} ({} added, {} changed)",
        report.target,
        report.staged.len(),
        report.changed.len()
    );
}

fn config(args: &GlobalArgs) -> WagonConfig {
    let mut config = WagonConfig::new();
    if let Some(dir) = &args.checkout_dir {
        config = config.with_checkout_dir(dir.clone());
    }
    if let Some(message) = &args.message {
        config = config.with_commit_message(message.clone());
    }
    config
}

fn credentials(args: &GlobalArgs) -> Credentials {
    let mut credentials = Credentials::new();
    if let Some(username) = &args.username {
        credentials = credentials.with_username(username.clone());
    }
    if let Some(password) = &args.password {
        credentials = credentials.with_password(password.clone());
    }
    if let Some(key) = &args.private_key {
        credentials = credentials.with_private_key(key.clone());
    }
    credentials
}

/// Logs to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_put_dir_defaults_to_root() {
        let cli = Cli::try_parse_from([
            "gitsite",
            "--url",
            "gitsite:github.com/user/project.git",
            "put-dir",
            "target/site",
        ])
        .unwrap();
        match cli.command {
            Commands::PutDir { source, dest } => {
                assert_eq!(source, "target/site");
                assert_eq!(dest, "");
            }
            _ => panic!("expected put-dir"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gitsite",
            "put",
            "index.html",
            "docs/index.html",
            "--username",
            "me",
            "--message",
            "publish {name}",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.global.username.as_deref(), Some("me"));
        assert!(cli.global.verbose);

        let credentials = credentials(&cli.global);
        assert_eq!(credentials.username(), Some("me"));
        assert_eq!(credentials.password(), None);
    }
}
