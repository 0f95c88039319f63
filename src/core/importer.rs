//! Package import
//!
//! The importer drives the whole pipeline for one dump: assemble the buffer,
//! resolve a manifest, scan its segments, then write a normalized package
//! into the library:
//!
//! ```text
//! <Library/Location>/Super Famicom/<name>.sfc/
//!     program.rom
//!     data.rom          (when declared)
//!     <firmware>.rom    (one per coprocessor segment)
//!     manifest.bml      (when CreateManifests is set)
//!     save.ram          (migrated from <name>.srm)
//! ```
//!
//! Validation runs before anything is created, so a rejected import leaves no
//! trace in the library. Writes after that point are not rolled back.

use crate::core::assembler;
use crate::core::database::CartridgeRecords;
use crate::core::digest::sha256_hex;
use crate::core::heuristics::{has_copier_header, COPIER_HEADER_SIZE};
use crate::core::manifest::Manifest;
use crate::core::resolver::Resolver;
use crate::core::scanner::{scan, Segment};
use crate::core::settings::{LibrarySettings, SettingsStore, CREATE_MANIFESTS, LIBRARY_LOCATION};
use crate::core::validation::{package_path, SourceLocation};
use crate::error::{ImportError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Save file name inside a package
pub const SAVE_FILE: &str = "save.ram";

/// Imports dumps into the library
///
/// Holds read-only borrows of the settings and database, so one importer can
/// be shared across threads importing different cartridges.
pub struct Importer<'a, S: ?Sized, D: ?Sized> {
    settings: &'a S,
    database: &'a D,
    firmware_appended: bool,
}

impl<'a, S, D> Importer<'a, S, D>
where
    S: SettingsStore + ?Sized,
    D: CartridgeRecords + ?Sized,
{
    pub fn new(settings: &'a S, database: &'a D) -> Self {
        Importer {
            settings,
            database,
            firmware_appended: true,
        }
    }

    /// Firmware-appended value used when the manifest does not decide it
    ///
    /// Defaults to `true`: database manifests slice every segment from the
    /// buffer.
    pub fn with_firmware_appended(mut self, firmware_appended: bool) -> Self {
        self.firmware_appended = firmware_appended;
        self
    }

    /// Root of the output library
    pub fn library_root(&self) -> PathBuf {
        self.settings
            .text(LIBRARY_LOCATION)
            .map(PathBuf::from)
            .unwrap_or_else(|| LibrarySettings::default().location)
    }

    /// Read the buffer for a location
    ///
    /// Directories are assembled from their fragments; files are read whole.
    pub fn read_location(&self, location: &Path) -> Result<Vec<u8>> {
        if location.is_dir() {
            Ok(assembler::assemble(location))
        } else {
            Ok(fs::read(location)?)
        }
    }

    /// Assemble and import `location`
    pub fn import_location(&self, location: impl AsRef<Path>) -> Result<PathBuf> {
        let location = location.as_ref();
        let buffer = self.read_location(location)?;
        self.import(&buffer, location)
    }

    /// Resolve `location` without writing anything, returning the manifest markup
    pub fn manifest(&self, location: impl AsRef<Path>) -> Result<String> {
        let location = location.as_ref();
        let source = SourceLocation::new(location)?;
        let buffer = self.read_location(location)?;
        let manifest = self.resolve(&buffer, &source)?;
        Ok(manifest.markup())
    }

    fn resolve(&self, buffer: &[u8], source: &SourceLocation) -> Result<Manifest> {
        let digest = sha256_hex(buffer);
        debug!("Digest of {} ({} bytes): {}", source.name(), buffer.len(), digest);

        Resolver::new(self.settings, self.database)
            .resolve_digest(buffer, &digest, source)?
            .ok_or(ImportError::ParseFailure)
    }

    /// Import an already assembled buffer for `location`
    ///
    /// Returns the package directory on success.
    pub fn import(&self, buffer: &[u8], location: impl AsRef<Path>) -> Result<PathBuf> {
        let source = SourceLocation::new(location.as_ref())?;
        let target = package_path(&self.library_root(), source.name())?;

        let manifest = self.resolve(buffer, &source)?;
        let firmware_appended = manifest.firmware_appended_or(self.firmware_appended);
        let segments = scan(&manifest.document);
        debug!(
            "{} segments, firmware_appended={}",
            segments.len(),
            firmware_appended
        );

        validate_segment_names(&segments)?;
        if !firmware_appended {
            validate_firmware(&source, &segments)?;
        }

        fs::create_dir_all(&target).map_err(ImportError::LibraryUnwritable)?;

        migrate_save(&source, &target)?;

        if self.settings.boolean(CREATE_MANIFESTS) {
            fs::write(target.join(Manifest::FILE_NAME), manifest.markup())?;
        }

        write_segments(buffer, &source, &target, &segments, firmware_appended)?;

        info!("Imported {} into {:?}", source.name(), target);
        Ok(target)
    }
}

/// Reject segments whose names would resolve outside the package
fn validate_segment_names(segments: &[Segment]) -> Result<()> {
    match segments.iter().find(|segment| !segment.has_plain_name()) {
        Some(segment) => {
            warn!("Segment name {:?} is not a plain file name", segment.name);
            Err(ImportError::InvalidSegmentName(segment.name.clone()))
        }
        None => Ok(()),
    }
}

/// Check every external firmware file exists with its declared size
fn validate_firmware(source: &SourceLocation, segments: &[Segment]) -> Result<()> {
    for segment in segments.iter().filter(|s| !s.is_program_or_data()) {
        let path = source.sibling(&segment.name);
        let valid = fs::metadata(&path)
            .map(|meta| meta.is_file() && meta.len() == segment.size)
            .unwrap_or(false);
        if !valid {
            warn!("Firmware {:?} missing or not {} bytes", path, segment.size);
            return Err(ImportError::FirmwareInvalid(segment.name.clone()));
        }
    }
    Ok(())
}

/// Copy `<name>.srm` to `save.ram` unless the package already has one
fn migrate_save(source: &SourceLocation, target: &Path) -> Result<()> {
    let save = source.save_file();
    let destination = target.join(SAVE_FILE);
    if !save.is_file() {
        return Ok(());
    }
    if destination.exists() {
        debug!("Keeping existing {:?}", destination);
        return Ok(());
    }
    fs::copy(&save, &destination)?;
    info!("Migrated {:?} to {:?}", save, destination);
    Ok(())
}

/// Byte offset segments are sliced from
pub fn header_offset(len: usize) -> usize {
    if has_copier_header(len) {
        COPIER_HEADER_SIZE
    } else {
        0
    }
}

fn write_segments(
    buffer: &[u8],
    source: &SourceLocation,
    target: &Path,
    segments: &[Segment],
    firmware_appended: bool,
) -> Result<()> {
    let mut offset = header_offset(buffer.len());
    if offset > 0 {
        debug!("Skipping {}-byte copier header", offset);
    }

    for segment in segments {
        let path = target.join(&segment.name);
        if segment.is_program_or_data() || firmware_appended {
            let end = usize::try_from(segment.size)
                .ok()
                .and_then(|size| offset.checked_add(size))
                .filter(|&end| end <= buffer.len())
                .ok_or(ImportError::MissingData)?;
            fs::write(&path, &buffer[offset..end])?;
            debug!("Wrote {} from buffer [0x{:x}, 0x{:x})", segment.name, offset, end);
            offset = end;
        } else {
            fs::copy(source.sibling(&segment.name), &path)?;
            debug!("Copied external firmware {}", segment.name);
        }
    }
    Ok(())
}
