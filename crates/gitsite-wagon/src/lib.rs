// Copyright 2026 The gitsite Authors

//! Deploy site documentation to a git pages branch.
//!
//! [`SiteWagon`] publishes a file or a directory tree to a branch of a git
//! repository (by default `gh-pages`) by driving the `git` command-line
//! tool. Each deploy runs, in a scratch directory:
//!
//! 1. `git init`, `git remote add origin <url>` and
//!    `git pull origin refs/heads/<branch>`. A branch that does not exist
//!    yet is created by the first push.
//! 2. A walk up the destination path to find which directories already
//!    exist, then a copy of the content into place.
//! 3. `git add`, `git commit` and `git push origin HEAD:refs/heads/<branch>`.
//!
//! The git binary is taken from the `$GIT` environment variable, falling
//! back to `git` on the `PATH`.
//!
//! # Usage
//!
//! ```no_run
//! use camino::Utf8Path;
//! use gitsite::Credentials;
//! use gitsite_wagon::{SiteWagon, WagonConfig};
//!
//! let mut wagon = SiteWagon::new(WagonConfig::new());
//! wagon
//!     .connect("gitsite:git@github.com/user/project.git/api", &Credentials::new())
//!     .expect("valid URL");
//!
//! // Lands at `api/v1/` on the gh-pages branch.
//! let report = wagon
//!     .put_directory(Utf8Path::new("target/site"), "v1")
//!     .expect("deployed");
//! println!("staged {} files", report.staged.len());
//!
//! wagon.close().expect("checkout directory removed");
//! ```

#![deny(missing_docs)]

mod checkin;
mod checkout;
mod errors;
mod git;
mod merge;
mod probe;
mod scratch;
mod wagon;

pub use checkin::{CheckIn, check_in};
pub use checkout::{Checkout, PullStatus, checkout};
pub use errors::{
    CheckInError, CheckoutError, CommandFailed, GitEnvError, MergeError,
    ScratchError, SpawnError, WagonError,
};
pub use git::{CommandOutcome, Git};
pub use merge::{MergeOutcome, MergeRequest, merge};
pub use probe::{Probe, probe};
pub use scratch::{ScratchDir, unique_scratch_path};
pub use wagon::{
    DEFAULT_COMMIT_MESSAGE, DeployReport, SiteWagon, WagonConfig, WagonState,
};
