//! Turning an extracted package into the installed layout.
//!
//! [`relocate`] moves the two SDK subtrees out of the package, replacing whatever
//! was installed before. [`alias`] adds legacy names for professional-edition
//! binaries, [`verify`] checks the result, and [`clean`] removes transient files.

use std::io;
use std::path::{Path, PathBuf};

use crate::archive::ArchiveFormat;
use crate::edition::Edition;
use crate::error::{IoContext, SdkError};
use crate::paths::{
    BINDING_DIR, BINDING_MARKER, InstallRoot, NATIVE_DIR, PACKAGE_LIBRARY_DIR, has_entries,
};

/// Professional binaries and the unqualified names the runtime loads.
pub const PRO_ALIASES: &[(&str, &str)] = &[
    ("TeamTalk5Pro.dll", "TeamTalk5.dll"),
    ("libTeamTalk5Pro.so", "libTeamTalk5.so"),
    ("libTeamTalk5Pro.dylib", "libTeamTalk5.dylib"),
];

/// Returns the single top-level directory of an extraction root.
///
/// # Errors
///
/// Returns [`SdkError::UnexpectedLayout`] unless exactly one directory is present.
pub fn package_root(extraction_root: &Path) -> Result<PathBuf, SdkError> {
    let mut packages = Vec::new();
    for entry in std::fs::read_dir(extraction_root)
        .io_context("Failed to read directory", extraction_root)?
    {
        let entry = entry.io_context("Failed to read directory", extraction_root)?;
        if entry.path().is_dir() {
            packages.push(entry.path());
        }
    }

    match packages.len() {
        1 => Ok(packages.remove(0)),
        0 => Err(SdkError::UnexpectedLayout {
            message: format!("no package directory in {}", extraction_root.display()),
        }),
        n => {
            packages.sort();
            let names: Vec<_> = packages
                .iter()
                .filter_map(|d| d.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            Err(SdkError::UnexpectedLayout {
                message: format!(
                    "expected one package directory in {}, found {n}: {}",
                    extraction_root.display(),
                    names.join(", ")
                ),
            })
        }
    }
}

/// Moves the native and binding subtrees from the extracted package into the
/// installed layout and rewrites the binding marker file.
///
/// Installed subtrees are deleted before the move, including when the package
/// lacks the matching source, so a previous version never survives alongside a
/// new one. Returns the package root that was used.
///
/// # Errors
///
/// Returns [`SdkError::UnexpectedLayout`] if the package root cannot be determined
/// and [`SdkError::Io`] for filesystem failures.
pub fn relocate(extraction_root: &Path, root: &InstallRoot) -> Result<PathBuf, SdkError> {
    let package = package_root(extraction_root)?;
    let library = package.join(PACKAGE_LIBRARY_DIR);

    let layout = root.layout_dir();
    std::fs::create_dir_all(&layout).io_context("Failed to create directory", &layout)?;

    for subtree in [NATIVE_DIR, BINDING_DIR] {
        let src = library.join(subtree);
        let dest = layout.join(subtree);
        remove_dir_if_exists(&dest)?;

        if src.is_dir() {
            std::fs::rename(&src, &dest).map_err(|e| {
                SdkError::io(
                    format!("Failed to move {} to {}", src.display(), dest.display()),
                    e,
                )
            })?;
            tracing::debug!(from = %src.display(), to = %dest.display(), "moved subtree");
        } else {
            tracing::warn!(path = %src.display(), "package has no {subtree} directory");
        }
    }

    let binding = root.binding_dir();
    if binding.is_dir() {
        let marker = binding.join(BINDING_MARKER);
        std::fs::write(&marker, b"").io_context("Failed to write", &marker)?;
    }

    Ok(package)
}

/// Checks that both installed subtrees exist and are non-empty.
///
/// # Errors
///
/// Returns [`SdkError::Layout`] naming the first missing subtree.
pub fn verify(root: &InstallRoot) -> Result<(), SdkError> {
    for (subtree, dir) in [
        (NATIVE_DIR, root.native_dir()),
        (BINDING_DIR, root.binding_dir()),
    ] {
        if !has_entries(&dir) {
            return Err(SdkError::Layout {
                subtree: subtree.to_string(),
            });
        }
    }
    Ok(())
}

/// Copies professional binaries to their legacy names.
///
/// Does nothing for [`Edition::Standard`]. A copy is skipped when its source is
/// absent or its destination already exists. Returns the paths created.
///
/// # Errors
///
/// Returns [`SdkError::Io`] if a copy fails.
pub fn alias(edition: Edition, root: &InstallRoot) -> Result<Vec<PathBuf>, SdkError> {
    if edition != Edition::Professional {
        return Ok(Vec::new());
    }

    let native = root.native_dir();
    let mut created = Vec::new();
    for (pro, legacy) in PRO_ALIASES {
        let src = native.join(pro);
        let dest = native.join(legacy);
        if !src.is_file() || dest.exists() {
            continue;
        }
        std::fs::copy(&src, &dest).map_err(|e| {
            SdkError::io(
                format!("Failed to copy {} to {}", src.display(), dest.display()),
                e,
            )
        })?;
        tracing::debug!(alias = %dest.display(), "created legacy alias");
        created.push(dest);
    }
    Ok(created)
}

/// Removes the downloaded archive, the extraction root, and, unless
/// `keep_test_fixtures` is set, the test fixtures inside the binding subtree.
///
/// Targets that do not exist are skipped. Every target is attempted even if an
/// earlier one fails.
///
/// # Errors
///
/// Returns the first removal failure.
pub fn clean(
    root: &InstallRoot,
    format: ArchiveFormat,
    keep_test_fixtures: bool,
) -> Result<(), SdkError> {
    let mut results = vec![
        remove_file_if_exists(&root.archive_path(format)),
        remove_file_if_exists(&root.partial_archive_path(format)),
        remove_dir_if_exists(&root.extraction_dir()),
    ];
    if !keep_test_fixtures {
        results.push(remove_dir_if_exists(&root.fixtures_dir()));
    }
    results.into_iter().collect()
}

fn remove_file_if_exists(path: &Path) -> Result<(), SdkError> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            Err(SdkError::io(format!("Failed to remove {}", path.display()), e))
        }
        _ => Ok(()),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<(), SdkError> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            Err(SdkError::io(format!("Failed to remove {}", path.display()), e))
        }
        _ => Ok(()),
    }
}
