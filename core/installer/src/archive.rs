//! Archive extraction.
//!
//! SDK releases are published as 7-Zip archives, which are unpacked by an
//! external 7-Zip compatible tool found on `PATH`. ZIP and tar.gz archives are
//! unpacked in-process. Every extraction starts from an empty destination
//! directory and keeps the archive's own top-level directory.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{IoContext, SdkError};

/// Executable names of 7-Zip compatible tools, in order of preference.
pub const SEVEN_ZIP_TOOLS: &[&str] = &["7z", "7zz", "7za", "7zr"];

/// Container format of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArchiveFormat {
    /// 7-Zip, the format the catalog publishes.
    #[default]
    SevenZip,
    /// ZIP.
    Zip,
    /// Gzip-compressed tarball.
    TarGz,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    #[must_use = "returns the extension without side effects"]
    pub fn extension(self) -> &'static str {
        match self {
            Self::SevenZip => "7z",
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }

    /// Detects the format from a file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".7z") {
            Some(Self::SevenZip)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ArchiveFormat {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "7z" => Ok(Self::SevenZip),
            "zip" => Ok(Self::Zip),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            other => Err(SdkError::config(format!(
                "unsupported archive format '{other}' (expected '7z', 'zip' or 'tar.gz')"
            ))),
        }
    }
}

/// Unpacks `archive_path` into a freshly recreated `dest_dir`.
///
/// An existing `dest_dir` is deleted first; contents are never merged.
///
/// # Errors
///
/// Returns [`SdkError::Archive`] if the format is unknown, the archive is corrupt,
/// an entry would escape `dest_dir`, or no 7-Zip tool is available.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<(), SdkError> {
    let format = ArchiveFormat::from_path(archive_path).ok_or_else(|| {
        SdkError::archive(format!(
            "unrecognized archive type: {}",
            archive_path.display()
        ))
    })?;

    if dest_dir.exists() {
        std::fs::remove_dir_all(dest_dir).io_context("Failed to remove directory", dest_dir)?;
    }
    std::fs::create_dir_all(dest_dir).io_context("Failed to create directory", dest_dir)?;

    tracing::debug!(archive = %archive_path.display(), %format, "extracting");
    match format {
        ArchiveFormat::SevenZip => {
            let tool = locate_seven_zip(std::env::var_os("PATH"))?;
            extract_with_tool(&tool, archive_path, dest_dir)
        }
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
    }
}

/// Finds a 7-Zip compatible executable in `search_path`.
///
/// # Errors
///
/// Returns [`SdkError::Archive`] naming the tools that were looked for.
pub fn locate_seven_zip(search_path: Option<OsString>) -> Result<PathBuf, SdkError> {
    for name in SEVEN_ZIP_TOOLS {
        if let Ok(path) = which::which_in(name, search_path.as_ref(), ".") {
            return Ok(path);
        }
    }

    #[cfg(windows)]
    if let Some(program_files) = std::env::var_os("ProgramFiles") {
        let bundled = PathBuf::from(program_files).join("7-Zip").join("7z.exe");
        if bundled.is_file() {
            return Ok(bundled);
        }
    }

    Err(SdkError::archive(format!(
        "no 7-Zip compatible tool found (looked for {})",
        SEVEN_ZIP_TOOLS.join(", ")
    )))
}

/// Runs `tool x` to unpack a 7-Zip archive.
///
/// # Errors
///
/// Returns [`SdkError::Archive`] if the tool cannot be started or exits unsuccessfully.
pub fn extract_with_tool(tool: &Path, archive_path: &Path, dest_dir: &Path) -> Result<(), SdkError> {
    let mut out_flag = OsString::from("-o");
    out_flag.push(dest_dir);

    let output = Command::new(tool)
        .arg("x")
        .arg("-y")
        .arg(out_flag)
        .arg(archive_path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                SdkError::archive(format!("'{}' not found", tool.display()))
            } else {
                SdkError::archive(format!("failed to run '{}': {e}", tool.display()))
            }
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    Err(SdkError::archive(if detail.is_empty() {
        format!("'{}' exited with {}", tool.display(), output.status)
    } else {
        format!("'{}' exited with {}: {detail}", tool.display(), output.status)
    }))
}

/// Unpacks a ZIP archive into `dest_dir`, preserving entry paths.
///
/// # Errors
///
/// Returns [`SdkError::Archive`] for unreadable or unsafe entries and
/// [`SdkError::Io`] for filesystem failures.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), SdkError> {
    let file = std::fs::File::open(archive_path).io_context("Failed to open archive", archive_path)?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        SdkError::archive(format!(
            "failed to read ZIP archive {}: {e}",
            archive_path.display()
        ))
    })?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| SdkError::archive(format!("failed to read archive entry {i}: {e}")))?;

        let entry_path = entry.enclosed_name().ok_or_else(|| {
            SdkError::archive(format!("refusing to extract unsafe path: {}", entry.name()))
        })?;
        ensure_relative(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .io_context("Failed to create directory", &output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).io_context("Failed to create directory", parent)?;
        }

        let mut outfile =
            std::fs::File::create(&output_path).io_context("Failed to create file", &output_path)?;
        io::copy(&mut entry, &mut outfile).map_err(|e| {
            SdkError::archive(format!("failed to extract {}: {e}", output_path.display()))
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode & 0o7777))
                .io_context("Failed to set permissions", &output_path)?;
        }
    }

    Ok(())
}

/// Unpacks a tar.gz archive into `dest_dir`, preserving entry paths.
///
/// # Errors
///
/// Returns [`SdkError::Archive`] for unreadable or unsafe entries and
/// [`SdkError::Io`] for filesystem failures.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), SdkError> {
    let file = std::fs::File::open(archive_path).io_context("Failed to open archive", archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let corrupt = |e: io::Error| {
        SdkError::archive(format!(
            "failed to read tar archive {}: {e}",
            archive_path.display()
        ))
    };

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let entry_path = entry.path().map_err(corrupt)?.into_owned();
        ensure_relative(&entry_path)?;

        let kind = entry.header().entry_type();
        if (kind.is_symlink() || kind.is_hard_link())
            && let Some(target) = entry.link_name().map_err(corrupt)?
        {
            // Symlinks resolve from their own directory, hard links from the archive root.
            let base = if kind.is_symlink() {
                entry_path.parent().unwrap_or(Path::new(""))
            } else {
                Path::new("")
            };
            if !stays_inside(base, &target) {
                return Err(SdkError::archive(format!(
                    "refusing to extract link {} pointing outside the archive: {}",
                    entry_path.display(),
                    target.display()
                )));
            }
        }

        let unpacked = entry.unpack_in(dest_dir).map_err(|e| {
            SdkError::archive(format!("failed to extract {}: {e}", entry_path.display()))
        })?;
        if !unpacked {
            return Err(SdkError::archive(format!(
                "refusing to extract path outside the destination: {}",
                entry_path.display()
            )));
        }
    }

    Ok(())
}

/// Returns `true` if `target`, taken relative to `base`, never climbs above
/// the archive root.
fn stays_inside(base: &Path, target: &Path) -> bool {
    if target.is_absolute() {
        return false;
    }
    let mut depth = base
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Rejects absolute paths and parent directory references.
fn ensure_relative(path: &Path) -> Result<(), SdkError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(SdkError::archive(format!(
            "refusing to extract path with parent directory or absolute reference: {}",
            path.display()
        )));
    }
    Ok(())
}
