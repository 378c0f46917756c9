//! Version command for the ttsdk CLI.

use anyhow::Result;

/// Prints the CLI version, git commit and host platform.
#[allow(clippy::unnecessary_wraps)]
pub fn execute() -> Result<()> {
    println!("ttsdk {}", env!("CARGO_PKG_VERSION"));
    println!("  Commit:   {}", git_commit());
    println!("  Platform: {}", platform_string());
    Ok(())
}

/// Returns the git commit hash embedded at build time, or a fallback.
fn git_commit() -> &'static str {
    option_env!("TTSDK_GIT_COMMIT").unwrap_or("unknown")
}

fn platform_string() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}
