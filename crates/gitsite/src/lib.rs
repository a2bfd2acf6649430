// Copyright 2026 The gitsite Authors

//! Parsing types for gitsite deployments.
//!
//! gitsite publishes generated site documentation to a branch of a git
//! repository, such as the `gh-pages` branch served by GitHub Pages. This
//! crate holds the pure, I/O-free parts of that process:
//!
//! - [`SiteUrl`]: parses deployment URLs of the form
//!   `gitsite:<host-url>[:<branch>]` (or `scm:git:<url>`).
//! - [`RemoteDescriptor`]: the clone URL, branch and module prefix derived
//!   from a site URL, with [`Credentials`] applied.
//! - [`DeployPath`] and [`DeployTarget`]: validated destination paths inside
//!   the pages branch.
//!
//! # Examples
//!
//! ```
//! use gitsite::{DeployPath, RemoteDescriptor, SiteUrl};
//!
//! // A module URL: everything after the repository's `.git` segment is a
//! // path prefix inside the pages branch.
//! let site: SiteUrl =
//!     "gitsite:github.com/user/project.git/api:gh-pages".parse().unwrap();
//! let remote = RemoteDescriptor::new(&site).unwrap();
//!
//! assert_eq!(remote.url(), "ssh://github.com/user/project.git");
//! assert_eq!(remote.branch(), "gh-pages");
//!
//! let dest: DeployPath = "v1/index.html".parse().unwrap();
//! assert_eq!(remote.repository_path(&dest).as_str(), "api/v1/index.html");
//! ```
//!
//! # Related crates
//!
//! The subprocess and filesystem side of a deployment lives in
//! `gitsite-wagon`.

#![deny(missing_docs)]

mod deploy_path;
mod errors;
mod remote;
mod site_url;

pub use deploy_path::{DeployPath, DeployTarget, TargetKind};
pub use errors::{DeployPathError, SiteUrlParseError};
pub use remote::{Credentials, RemoteDescriptor, redact_url, split_module};
pub use site_url::{DEFAULT_BRANCH, ScmProvider, SiteUrl};
