// Copyright 2026 The gitsite Authors

//! End-to-end deploys against a local bare repository.

use crate::{Fixture, write_file};
use anyhow::Result;
use gitsite::Credentials;
use gitsite_wagon::{
    CheckoutError, Git, PullStatus, SiteWagon, WagonConfig, WagonError,
    WagonState,
};
use std::time::SystemTime;

#[test]
fn test_put_single_file_to_fresh_branch() -> Result<()> {
    let fixture = Fixture::new()?;
    let source = fixture.path().join("index.html");
    write_file(&source, "<h1>hello</h1>")?;

    let mut wagon = fixture.connected("")?;
    let report = wagon.put(&source, "docs/index.html")?;

    assert_eq!(report.pull, PullStatus::BranchMissing);
    assert_eq!(report.target.as_str(), "docs/index.html");
    assert_eq!(report.staged, ["index.html"]);
    assert_eq!(report.changed, ["docs/index.html"]);
    assert_eq!(wagon.state(), WagonState::Connected);

    assert_eq!(fixture.remote_files("gh-pages")?, ["docs/index.html"]);
    assert_eq!(
        fixture.remote_contents("gh-pages", "docs/index.html")?,
        "<h1>hello</h1>"
    );

    let log = crate::git_command()
        .args(["log", "-1", "--format=%s", "gh-pages"])
        .current_dir(&fixture.remote)
        .output()?;
    assert_eq!(
        String::from_utf8(log.stdout)?.trim(),
        "Deploying index.html to repository"
    );

    wagon.close()?;
    Ok(())
}

#[test]
fn test_put_directory_into_existing_directory() -> Result<()> {
    let fixture = Fixture::new()?;
    let old = fixture.path().join("old.html");
    write_file(&old, "old")?;
    let site = fixture.site_tree("site")?;

    let mut wagon = fixture.connected("")?;
    wagon.put(&old, "docs/old.html")?;

    let report = wagon.put_directory(&site, "docs")?;
    assert_eq!(report.pull, PullStatus::Pulled);
    assert_eq!(report.staged, ["a.html", "sub/b.html"]);

    let files = fixture.remote_files("gh-pages")?;
    assert_eq!(files, ["docs/a.html", "docs/old.html", "docs/sub/b.html"]);
    assert!(
        files.iter().all(|f| !f.split('/').any(|seg| seg == ".git")),
        ".git never deployed: {files:?}"
    );

    wagon.close()?;
    Ok(())
}

#[test]
fn test_put_directory_with_backslash_in_file_name() -> Result<()> {
    let fixture = Fixture::new()?;
    let site = fixture.path().join("site");
    write_file(&site.join("weird\\name.html"), "w")?;
    write_file(&site.join("index.html"), "i")?;

    let mut wagon = fixture.connected("")?;
    let report = wagon.put_directory(&site, "docs")?;
    assert_eq!(report.staged, ["index.html", "weird\\name.html"]);
    assert_eq!(
        fixture.remote_files("gh-pages")?,
        ["docs/index.html", "docs/weird\\name.html"]
    );

    wagon.close()?;
    Ok(())
}

#[test]
fn test_redeploy_same_content() -> Result<()> {
    let fixture = Fixture::new()?;
    let site = fixture.site_tree("site")?;

    let mut wagon = fixture.connected("")?;
    let first = wagon.put_directory(&site, "")?;
    assert_eq!(first.staged.len(), 2);

    let second = wagon.put_directory(&site, "")?;
    assert!(second.staged.is_empty(), "nothing new: {:?}", second.staged);
    assert!(second.changed.is_empty());

    assert_eq!(fixture.commit_count("gh-pages")?, 2);
    assert_eq!(fixture.remote_files("gh-pages")?, ["a.html", "sub/b.html"]);

    wagon.close()?;
    Ok(())
}

#[test]
fn test_overwrite_existing_file() -> Result<()> {
    let fixture = Fixture::new()?;
    let source = fixture.path().join("index.html");

    let mut wagon = fixture.connected("")?;
    write_file(&source, "v1")?;
    wagon.put(&source, "index.html")?;
    write_file(&source, "v2")?;
    let report = wagon.put(&source, "index.html")?;

    assert!(report.staged.is_empty(), "committed through commit -a");
    assert_eq!(report.changed, ["index.html"]);
    assert_eq!(fixture.remote_contents("gh-pages", "index.html")?, "v2");

    wagon.close()?;
    Ok(())
}

#[test]
fn test_file_list_round_trip() -> Result<()> {
    let fixture = Fixture::new()?;
    let site = fixture.site_tree("site")?;

    let mut wagon = fixture.connected("")?;
    assert!(!wagon.resource_exists("docs")?, "fresh branch is empty");

    let report = wagon.put_directory(&site, "docs")?;
    let listed = wagon.file_list("docs")?;
    assert_eq!(listed, report.staged);

    assert_eq!(wagon.file_list("docs/sub/b.html")?, ["b.html"]);
    assert!(wagon.resource_exists("docs/sub")?);
    assert!(!wagon.resource_exists("docs/missing")?);

    let err = wagon.file_list("nowhere").unwrap_err();
    assert!(
        matches!(err, WagonError::ResourceDoesNotExist { .. }),
        "{err}"
    );
    assert_eq!(
        wagon.state(),
        WagonState::Connected,
        "a missing resource does not disconnect"
    );

    wagon.close()?;
    Ok(())
}

#[test]
fn test_module_prefix() -> Result<()> {
    let fixture = Fixture::new()?;
    let site = fixture.site_tree("site")?;

    let mut wagon = fixture.connected("moduleA")?;
    let remote = wagon.remote().expect("connected");
    assert_eq!(remote.url(), format!("file://{}", fixture.remote));
    assert_eq!(remote.relative_prefix(), "moduleA/");

    let report = wagon.put_directory(&site, "v1")?;
    assert_eq!(report.target.as_str(), "moduleA/v1");
    assert_eq!(report.staged, ["a.html", "sub/b.html"]);
    assert_eq!(
        fixture.remote_files("gh-pages")?,
        ["moduleA/v1/a.html", "moduleA/v1/sub/b.html"]
    );

    assert_eq!(wagon.file_list("")?, ["v1/a.html", "v1/sub/b.html"]);

    wagon.close()?;
    Ok(())
}

#[test]
fn test_custom_branch() -> Result<()> {
    let fixture = Fixture::new()?;
    let source = fixture.path().join("index.html");
    write_file(&source, "pages")?;

    let mut wagon = fixture.wagon()?;
    wagon.connect(&format!("{}:pages", fixture.url("")), &Credentials::new())?;
    wagon.put(&source, "index.html")?;
    assert_eq!(fixture.remote_files("pages")?, ["index.html"]);

    wagon.close()?;
    Ok(())
}

#[test]
fn test_get_is_unsupported() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut wagon = fixture.connected("")?;
    let dest = fixture.path().join("out.html");

    let err = wagon.get("index.html", &dest).unwrap_err();
    assert!(err.is_unsupported());
    let err = wagon
        .get_if_newer("index.html", &dest, SystemTime::UNIX_EPOCH)
        .unwrap_err();
    assert!(err.is_unsupported());
    assert!(!dest.exists());
    assert_eq!(wagon.state(), WagonState::Connected);

    wagon.close()?;
    Ok(())
}

#[test]
fn test_close_removes_scratch() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut wagon = fixture.connected("")?;
    let scratch = wagon.scratch_path().expect("connected").to_owned();
    assert!(scratch.is_dir());
    assert!(scratch.file_name().unwrap().starts_with("gitsite-"));

    wagon.close()?;
    assert!(!scratch.exists());
    assert!(wagon.scratch_path().is_none());

    // Closing twice is fine.
    wagon.close()?;
    Ok(())
}

#[test]
fn test_drop_removes_scratch() -> Result<()> {
    let fixture = Fixture::new()?;
    let scratch = {
        let wagon = fixture.connected("")?;
        wagon.scratch_path().expect("connected").to_owned()
    };
    assert!(!scratch.exists());
    Ok(())
}

#[test]
fn test_push_failure_disconnects_and_reports_pull() -> Result<()> {
    let fixture = Fixture::new()?;
    let source = fixture.path().join("index.html");
    write_file(&source, "x")?;

    let mut wagon = fixture.wagon()?;
    let missing = fixture.path().join("missing.git");
    wagon.connect(&format!("gitsite:file://{missing}"), &Credentials::new())?;
    let scratch = wagon.scratch_path().expect("connected").to_owned();

    let err = wagon.put(&source, "index.html").unwrap_err();
    match &err {
        WagonError::CheckIn { pull_failure, .. } => {
            assert!(pull_failure.is_some(), "pull failure attached: {err}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(wagon.state(), WagonState::Disconnected);
    assert!(!scratch.exists(), "scratch directory removed on failure");

    let err = wagon.put(&source, "index.html").unwrap_err();
    assert!(matches!(err, WagonError::NotConnected { .. }));
    Ok(())
}

#[test]
fn test_remote_inside_checkout_is_rejected() -> Result<()> {
    let fixture = Fixture::new()?;
    let checkout = fixture.path().join("checkout");
    let mut wagon = SiteWagon::new(
        WagonConfig::new()
            .with_git(Git::from_env()?)
            .with_checkout_dir(&checkout),
    );
    let inside = checkout.join("remote.git");
    wagon.connect(&format!("gitsite:file://{inside}"), &Credentials::new())?;

    let source = fixture.path().join("index.html");
    write_file(&source, "x")?;
    let err = wagon.put(&source, "index.html").unwrap_err();
    let WagonError::Checkout { error, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    assert!(
        matches!(error, CheckoutError::RemoteIsWorkingDirectory { .. }),
        "{error}"
    );
    assert!(!checkout.exists());
    Ok(())
}
