//! Doctor command for the ttsdk CLI.
//!
//! Reports whether this machine can install the SDK and whether an existing
//! installation is complete. Problems are reported, never fixed.
//!
//! ## Checks Performed
//!
//! - Platform support
//! - 7-Zip tool availability
//! - Install root existence
//! - Native library and binding subtrees present and non-empty
//! - Native library for this platform present

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use ttsdk_installer::archive::{SEVEN_ZIP_TOOLS, locate_seven_zip};
use ttsdk_installer::error::extraction_hint;
use ttsdk_installer::paths::{BINDING_DIR, NATIVE_DIR};
use ttsdk_installer::{InstallRoot, PlatformTarget};

/// Arguments for the doctor command.
#[derive(Args)]
pub struct DoctorArgs {
    /// Install base directory to inspect.
    #[clap(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warning,
    Error,
}

/// Result of a single check.
#[derive(Debug, Clone)]
struct Check {
    name: String,
    status: Status,
    message: String,
}

impl Check {
    fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Status::Ok, message)
    }

    fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Status::Warning, message)
    }

    fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Status::Error, message)
    }

    fn new(name: impl Into<String>, status: Status, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    fn prefix(&self) -> &'static str {
        match self.status {
            Status::Ok => "[OK]",
            Status::Warning => "[WARN]",
            Status::Error => "[FAIL]",
        }
    }
}

/// Executes the doctor command.
///
/// # Errors
///
/// Returns an error if the install base cannot be determined. Failed checks
/// are printed, not returned.
pub fn execute(args: &DoctorArgs) -> Result<()> {
    let root = match &args.root {
        Some(base) => InstallRoot::with_root(base),
        None => InstallRoot::new()?,
    };

    println!("Checking TeamTalk SDK installation...");
    println!();

    let checks = run_all_checks(&root, PlatformTarget::resolve(), std::env::var_os("PATH"));

    let mut has_errors = false;
    let mut has_warnings = false;
    for check in &checks {
        println!("  {} {}: {}", check.prefix(), check.name, check.message);
        match check.status {
            Status::Ok => {}
            Status::Warning => has_warnings = true,
            Status::Error => has_errors = true,
        }
    }

    println!();
    if has_errors {
        println!("Some checks failed. Run 'ttsdk install' to install the SDK.");
    } else if has_warnings {
        println!("Some warnings were found. The SDK may work but could have issues.");
    } else {
        println!("All checks passed. The TeamTalk SDK is ready to use.");
    }
    Ok(())
}

fn run_all_checks(
    root: &InstallRoot,
    platform: Result<PlatformTarget, ttsdk_installer::SdkError>,
    search_path: Option<std::ffi::OsString>,
) -> Vec<Check> {
    let platform_check = match &platform {
        Ok(target) => Check::ok("Platform", format!("{target}")),
        Err(e) => Check::error("Platform", e.to_string()),
    };

    vec![
        platform_check,
        check_seven_zip(search_path),
        check_root(root),
        check_subtree(NATIVE_DIR, &root.native_dir()),
        check_subtree(BINDING_DIR, &root.binding_dir()),
        check_native_library(root, platform.ok()),
    ]
}

fn check_seven_zip(search_path: Option<std::ffi::OsString>) -> Check {
    match locate_seven_zip(search_path) {
        Ok(tool) => Check::ok("7-Zip", format!("Found at {}", tool.display())),
        Err(_) => Check::warning(
            "7-Zip",
            format!(
                "None of {} found. {}",
                SEVEN_ZIP_TOOLS.join(", "),
                extraction_hint()
            ),
        ),
    }
}

fn check_root(root: &InstallRoot) -> Check {
    let base = root.base();
    if base.is_dir() {
        Check::ok("Install root", base.display().to_string())
    } else {
        Check::warning(
            "Install root",
            format!("{} does not exist. Run 'ttsdk install'.", base.display()),
        )
    }
}

fn check_subtree(name: &str, dir: &Path) -> Check {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                Check::ok(name, dir.display().to_string())
            } else {
                Check::error(name, format!("{} is empty", dir.display()))
            }
        }
        Err(_) => Check::error(name, format!("{} not found", dir.display())),
    }
}

fn check_native_library(root: &InstallRoot, platform: Option<PlatformTarget>) -> Check {
    const NAME: &str = "Native library";

    let Some(platform) = platform else {
        return Check::warning(NAME, "Skipped: platform is not supported");
    };
    let library = root.native_library(platform);
    if library.is_file() {
        Check::ok(NAME, library.display().to_string())
    } else {
        Check::error(NAME, format!("{} not found", library.display()))
    }
}
