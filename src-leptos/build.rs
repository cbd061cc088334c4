//! Stamps `GIT_VERSION` into the bindings for `langpref_version()`.
//!
//! `LANGPREF_BUILD_VERSION` wins when set (release pipelines build from a
//! tarball with no `.git`). Otherwise `git describe`, then the crate version.

use std::env;
use std::process::Command;

fn git_describe() -> Option<String> {
    let output = Command::new("git").args(["describe", "--tags", "--always", "--dirty"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_owned()).filter(|v| !v.is_empty())
}

fn main() {
    let version = env::var("LANGPREF_BUILD_VERSION")
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_owned());

    println!("cargo:rustc-env=GIT_VERSION={version}");
    println!("cargo:rerun-if-env-changed=LANGPREF_BUILD_VERSION");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
