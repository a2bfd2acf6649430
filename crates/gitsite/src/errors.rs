// Copyright 2026 The gitsite Authors

//! Error types for parsing site URLs and deployment paths.

use thiserror::Error;

/// An error that occurs while parsing a [`SiteUrl`](crate::SiteUrl) or
/// deriving a [`RemoteDescriptor`](crate::RemoteDescriptor) from one.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SiteUrlParseError {
    /// The input was empty or contained only whitespace.
    #[error("site URL is empty")]
    EmptyInput,

    /// The URL carries none of the recognized prefixes (`gitsite:`,
    /// `scm:<provider>:`, or `<scheme>://`).
    #[error(
        "unrecognized site URL {0:?} (expected gitsite:<url>[:<branch>], \
         scm:git:<url>, or <scheme>://...)"
    )]
    UnrecognizedScheme(String),

    /// An `scm:` URL without the `scm:<provider>:<url>` shape.
    #[error("invalid scm URL {0:?}: expected 'scm:<provider>:<url>'")]
    InvalidScmFormat(String),

    /// The SCM provider named in the URL is not supported.
    #[error("no SCM provider for {provider:?} (only \"git\" is supported)")]
    NoSuchProvider {
        /// The provider name found in the URL.
        provider: String,
    },

    /// The repository part of the URL was empty.
    #[error("site URL {0:?} has an empty repository URL")]
    EmptyRepositoryUrl(String),

    /// A branch separator was present but nothing followed it.
    #[error("site URL {0:?} has an empty branch name (nothing after ':')")]
    EmptyBranch(String),

    /// The branch name is not a valid git branch name.
    #[error("invalid branch name {branch:?}: {reason}")]
    InvalidBranch {
        /// The rejected branch name.
        branch: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The module suffix after the `.git` segment is not a valid relative
    /// path.
    #[error("invalid module path in {url:?}")]
    InvalidModulePath {
        /// The URL the module path was taken from.
        url: String,
        /// Details about the path error.
        #[source]
        error: DeployPathError,
    },
}

/// An error that occurs while constructing a
/// [`DeployPath`](crate::DeployPath).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeployPathError {
    /// The path contains a `..` component, which would escape the
    /// repository root.
    #[error(
        "deploy path {path:?} contains a parent-directory component \
         (only plain file/directory names are allowed)"
    )]
    ParentComponent {
        /// The full path that failed validation.
        path: String,
    },

    /// The path contains a newline character.
    #[error("deploy path contains a newline character")]
    NewlineInPath,

    /// A file destination was requested with an empty path.
    #[error("a file cannot be deployed to the repository root")]
    EmptyFilePath,
}
