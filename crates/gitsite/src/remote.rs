// Copyright 2026 The gitsite Authors

//! Remote descriptors: the clone URL, branch and module prefix for a
//! deployment.

use crate::{DeployPath, ScmProvider, SiteUrl, SiteUrlParseError};
use camino::Utf8PathBuf;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::{borrow::Cow, fmt};
use url::Url;

/// Authentication details for the remote repository.
///
/// Empty strings are treated as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
    private_key: Option<Utf8PathBuf>,
    passphrase: Option<String>,
}

impl Credentials {
    /// Creates an empty set of credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the user name.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self
    }

    /// Sets the password. Only used for `http://` and `https://` remotes.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = non_empty(password.into());
        self
    }

    /// Sets the SSH private key file.
    pub fn with_private_key(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        self.private_key = (!path.as_str().is_empty()).then_some(path);
        self
    }

    /// Sets the passphrase for the private key.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = non_empty(passphrase.into());
        self
    }

    /// Returns the user name, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the password, if any.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns the SSH private key path, if any.
    pub fn private_key(&self) -> Option<&Utf8PathBuf> {
        self.private_key.as_ref()
    }

    /// Returns the private key passphrase, if any.
    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key", &self.private_key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Where and to which branch a deployment is pushed.
///
/// Derived once per connection from a [`SiteUrl`]. URLs that continue past
/// the repository's `.git` segment (e.g. `ssh://host/repo.git/moduleA`)
/// are truncated to the clone URL, and the remainder becomes a module
/// prefix under which all content is placed.
///
/// # Examples
///
/// ```
/// use gitsite::{RemoteDescriptor, SiteUrl};
///
/// let site: SiteUrl = "scm:git:ssh://host/repo.git/moduleA".parse().unwrap();
/// let remote = RemoteDescriptor::new(&site).unwrap();
/// assert_eq!(remote.url(), "ssh://host/repo.git");
/// assert_eq!(remote.prefix().as_str(), "moduleA");
/// assert_eq!(remote.relative_prefix(), "moduleA/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteDescriptor {
    provider: ScmProvider,
    original_url: String,
    url: String,
    branch: String,
    prefix: DeployPath,
}

impl RemoteDescriptor {
    /// Builds a remote descriptor from a parsed site URL.
    pub fn new(site: &SiteUrl) -> Result<Self, SiteUrlParseError> {
        let (url, module) = split_module(site.url());
        let prefix = DeployPath::new(module).map_err(|error| {
            SiteUrlParseError::InvalidModulePath {
                url: redact_url(site.url()).into_owned(),
                error,
            }
        })?;

        Ok(RemoteDescriptor {
            provider: site.provider(),
            original_url: site.url().to_owned(),
            url: url.to_owned(),
            branch: site.branch().to_owned(),
            prefix,
        })
    }

    /// Injects user name and password into the clone URL.
    ///
    /// Only `ssh://`, `http://` and `https://` URLs are changed, and only
    /// when the URL does not already name a user. Passwords are only added
    /// for HTTP(S) remotes.
    pub fn with_credentials(mut self, credentials: &Credentials) -> Self {
        self.url = apply_credentials(&self.url, credentials);
        self
    }

    /// Returns the SCM provider.
    pub fn provider(&self) -> ScmProvider {
        self.provider
    }

    /// Returns the URL as configured, before the module suffix was
    /// stripped.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// Returns the clone URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the clone URL with any password replaced by `***`.
    pub fn display_url(&self) -> Cow<'_, str> {
        redact_url(&self.url)
    }

    /// Returns the remote branch.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the module prefix (the root path for non-module URLs).
    pub fn prefix(&self) -> &DeployPath {
        &self.prefix
    }

    /// Returns the module prefix with a trailing `/`, or the empty string.
    pub fn relative_prefix(&self) -> String {
        if self.prefix.is_root() {
            String::new()
        } else {
            format!("{}/", self.prefix.as_str())
        }
    }

    /// Resolves a deploy path to a repository-relative path by prepending
    /// the module prefix.
    pub fn repository_path(&self, path: &DeployPath) -> DeployPath {
        self.prefix.join(path)
    }

    /// For `file://` remotes, returns the local repository path.
    pub fn local_path(&self) -> Option<Utf8PathBuf> {
        self.url.strip_prefix("file://").map(Utf8PathBuf::from)
    }
}

impl fmt::Display for RemoteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (branch {})", self.display_url(), self.branch)?;
        if !self.prefix.is_root() {
            write!(f, " module {}", self.prefix)?;
        }
        Ok(())
    }
}

/// Splits a URL at its last `.git` path segment.
///
/// Returns the URL up to and including `.git`, and the module remainder
/// after it without surrounding slashes. A `.git` that is not followed by
/// `/` or the end of the URL (as in `user.github.io`) does not count.
///
/// ```
/// use gitsite::split_module;
///
/// assert_eq!(
///     split_module("ssh://host/repo.git/moduleA"),
///     ("ssh://host/repo.git", "moduleA")
/// );
/// assert_eq!(split_module("ssh://host/repo.git"), ("ssh://host/repo.git", ""));
/// assert_eq!(
///     split_module("https://host/user.github.io"),
///     ("https://host/user.github.io", "")
/// );
/// ```
pub fn split_module(url: &str) -> (&str, &str) {
    let boundary = url
        .match_indices(".git")
        .map(|(index, _)| index)
        .filter(|&index| {
            index > 0 && matches!(url.as_bytes().get(index + 4), None | Some(b'/'))
        })
        .last();

    match boundary {
        Some(index) => {
            let end = index + 4;
            (&url[..end], url[end..].trim_matches('/'))
        }
        None => (url, ""),
    }
}

/// Characters escaped in URL user-info: everything except RFC 3986
/// unreserved characters.
const USERINFO: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Replaces the password in a URL's user-info with `***`.
///
/// Strings that do not parse as URLs, or carry no password, are returned
/// unchanged.
pub fn redact_url(url: &str) -> Cow<'_, str> {
    let Ok(mut parsed) = Url::parse(url) else {
        return Cow::Borrowed(url);
    };
    if parsed.password().is_none() || parsed.set_password(Some("***")).is_err()
    {
        return Cow::Borrowed(url);
    }
    Cow::Owned(parsed.into())
}

fn apply_credentials(url: &str, credentials: &Credentials) -> String {
    let Some(username) = credentials.username() else {
        return url.to_owned();
    };
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_owned();
    };
    let allows_password = match parsed.scheme() {
        "http" | "https" => true,
        "ssh" => false,
        _ => return url.to_owned(),
    };
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return url.to_owned();
    }

    let username = utf8_percent_encode(username, USERINFO).to_string();
    if parsed.set_username(&username).is_err() {
        return url.to_owned();
    }
    if let (true, Some(password)) = (allows_password, credentials.password())
    {
        let password = utf8_percent_encode(password, USERINFO).to_string();
        if parsed.set_password(Some(&password)).is_err() {
            return url.to_owned();
        }
    }
    parsed.into()
}
