//! Build script for the ttsdk CLI.
//!
//! Embeds the short git commit hash printed by `ttsdk version`.

use std::process::Command;

fn main() {
    let commit = git_commit();
    println!("cargo:rustc-env=TTSDK_GIT_COMMIT={commit}");

    if let Some(toplevel) = git_output(&["rev-parse", "--show-toplevel"]) {
        println!("cargo:rerun-if-changed={toplevel}/.git/HEAD");
    }
}

fn git_commit() -> String {
    git_output(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
}

/// Runs git and returns its trimmed stdout, or `None` if git is unavailable,
/// fails, or prints nothing.
fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
