//! Source locations and library package naming
//!
//! This module derives the package name from a source location and builds
//! the normalized target path inside the library, so every import of the
//! same dump lands in the same directory.

use crate::error::{ImportError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Library subdirectory holding Super Famicom packages
pub const SYSTEM_DIRECTORY: &str = "Super Famicom";

/// Extension of package directories
pub const PACKAGE_EXTENSION: &str = "sfc";

/// Where a dump came from: a directory of fragments or a single image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    path: PathBuf,
    name: String,
}

impl SourceLocation {
    /// Create a location, extracting and validating its package name
    ///
    /// # Examples
    ///
    /// ```
    /// use cartridge_import::core::validation::SourceLocation;
    ///
    /// let location = SourceLocation::new("/roms/Super Metroid.sfc/").unwrap();
    /// assert_eq!(location.name(), "Super Metroid");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = package_name(&path)?;
        Ok(SourceLocation { path, name })
    }

    /// Location as given
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package name (base name without extension)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding fragments, firmware and save files
    ///
    /// The location itself when it is a directory, otherwise its parent.
    pub fn directory(&self) -> PathBuf {
        if self.path.is_dir() {
            self.path.clone()
        } else {
            self.path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        }
    }

    /// Path of a sibling file in the source directory
    pub fn sibling(&self, file_name: &str) -> PathBuf {
        self.directory().join(file_name)
    }

    /// Save-data sidecar (`<name>.srm`)
    pub fn save_file(&self) -> PathBuf {
        self.sibling(&format!("{}.srm", self.name))
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // No path separators or control characters
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^/\\\x00-\x1f\x7f]+$").expect("static pattern is valid")
    })
}

/// Validate a package name
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ImportError::InvalidPackageName(
            "name cannot be empty".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(ImportError::InvalidPackageName(format!(
            "'{}' is not a directory name",
            name
        )));
    }
    if !name_pattern().is_match(name) {
        return Err(ImportError::InvalidPackageName(format!(
            "'{}' contains path separators or control characters",
            name.escape_default()
        )));
    }
    Ok(())
}

/// Base name of a location with its extension stripped
///
/// Trailing slashes are ignored, so `/roms/Game.sfc/` and `/roms/Game.sfc`
/// both yield `Game`.
pub fn package_name(location: &Path) -> Result<String> {
    let stem = location
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ImportError::InvalidLocation(location.display().to_string()))?;

    validate_package_name(stem)?;
    Ok(stem.to_string())
}

/// Target package directory: `<root>/Super Famicom/<name>.sfc`
///
/// # Examples
///
/// ```
/// use cartridge_import::core::validation::package_path;
/// use std::path::Path;
///
/// let path = package_path(Path::new("/library"), "Game").unwrap();
/// assert_eq!(path, Path::new("/library/Super Famicom/Game.sfc"));
/// ```
pub fn package_path(library_root: &Path, name: &str) -> Result<PathBuf> {
    validate_package_name(name)?;
    Ok(library_root
        .join(SYSTEM_DIRECTORY)
        .join(format!("{}.{}", name, PACKAGE_EXTENSION)))
}
