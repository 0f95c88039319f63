//! # Cartridge Import - Super Famicom dump identification and packaging
//!
//! `cartridge-import` turns raw cartridge dumps into normalized library
//! packages. A dump may be a single image file or a directory of split
//! fragments (program, data, boot and slot ROMs). Each import:
//!
//! - **Assembles** the fragments into one buffer in a fixed order
//! - **Identifies** it by SHA-256 against a known-cartridge database, falling
//!   back to decoding the internal header
//! - **Writes** `<library>/Super Famicom/<name>.sfc/` with one file per ROM
//!   segment, an optional `manifest.bml` and any migrated save
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartridge_import::{Library, Result};
//!
//! # fn main() -> Result<()> {
//! let library = Library::builder()
//!     .database_file("Super Famicom.bml")
//!     .location("/home/user/Emulation")
//!     .with_manifests()
//!     .build()?;
//!
//! let package = library.import("/downloads/Super Metroid.sfc")?;
//! println!("imported into {}", package.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-level API
//!
//! [`Importer`] borrows any [`SettingsStore`] and [`CartridgeRecords`], so
//! embedders can supply their own configuration and database:
//!
//! ```rust,no_run
//! use cartridge_import::{CartridgeRecord, Importer};
//! use std::collections::HashMap;
//!
//! let mut settings = HashMap::new();
//! settings.insert("UseDatabase".to_string(), "true".to_string());
//! settings.insert("Library/Location".to_string(), "/library".to_string());
//! let records: Vec<CartridgeRecord> = Vec::new();
//!
//! let importer = Importer::new(&settings, &records);
//! let result = importer.import_location("/roms/Game.sfc");
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    database::{CartridgeRecord, CartridgeRecords, Database},
    digest::sha256_hex,
    heuristics::Region,
    importer::Importer,
    manifest::{Manifest, Provenance},
    markup::{Document, Node, NodeId},
    resolver::{Resolver, Strategy},
    scanner::{scan, Segment},
    settings::{Settings, SettingsStore},
    validation::SourceLocation,
};
pub use crate::error::{ImportError, Result};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of importing one location
///
/// Serializable so front-ends can report batches as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportReport {
    /// Location as given by the caller
    pub location: PathBuf,

    /// Package directory, when the import succeeded
    pub target: Option<PathBuf>,

    /// Failure reason, when it did not
    pub error: Option<String>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.target.is_some()
    }
}

/// Settings and database bundled for repeated imports
#[derive(Debug, Clone)]
pub struct Library {
    settings: Settings,
    database: Database,
}

impl Library {
    pub fn new(settings: Settings, database: Database) -> Self {
        Library { settings, database }
    }

    /// Builder with default settings and an empty database
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Borrowing importer over this library's settings and database
    pub fn importer(&self) -> Importer<'_, Settings, Database> {
        Importer::new(&self.settings, &self.database)
    }

    /// Import a directory of fragments or a single image file
    pub fn import(&self, location: impl AsRef<Path>) -> Result<PathBuf> {
        self.importer().import_location(location)
    }

    /// Resolve a location and return its manifest markup
    pub fn manifest(&self, location: impl AsRef<Path>) -> Result<String> {
        self.importer().manifest(location)
    }

    /// Import every location, collecting one report per location
    pub fn import_all<I, P>(&self, locations: I) -> Vec<ImportReport>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        locations
            .into_iter()
            .map(|location| {
                let location = location.as_ref();
                match self.import(location) {
                    Ok(target) => ImportReport {
                        location: location.to_path_buf(),
                        target: Some(target),
                        error: None,
                    },
                    Err(e) => {
                        debug!("Import of {:?} failed: {}", location, e);
                        ImportReport {
                            location: location.to_path_buf(),
                            target: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    }
}

/// Builder for [`Library`]
///
/// ```rust,no_run
/// use cartridge_import::LibraryBuilder;
///
/// # fn main() -> cartridge_import::Result<()> {
/// let library = LibraryBuilder::new()
///     .settings_file("import.toml")
///     .without_heuristics()
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct LibraryBuilder {
    settings_file: Option<PathBuf>,
    database_file: Option<PathBuf>,
    location: Option<PathBuf>,
    create_manifests: Option<bool>,
    use_heuristics: Option<bool>,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file (defaults otherwise)
    pub fn settings_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Load the known-cartridge database from a BML file
    pub fn database_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_file = Some(path.into());
        self
    }

    /// Override the library root
    pub fn location<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Write `manifest.bml` into each package
    pub fn with_manifests(mut self) -> Self {
        self.create_manifests = Some(true);
        self
    }

    /// Only accept database matches
    pub fn without_heuristics(mut self) -> Self {
        self.use_heuristics = Some(false);
        self
    }

    pub fn build(self) -> Result<Library> {
        let mut settings = match &self.settings_file {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(location) = self.location {
            settings = settings.with_library(location);
        }
        if let Some(create) = self.create_manifests {
            settings.create_manifests = create;
        }
        if let Some(heuristics) = self.use_heuristics {
            settings.use_heuristics = heuristics;
        }

        let database = match &self.database_file {
            Some(path) => Database::load(path)?,
            None => Database::new(),
        };

        info!(
            "Library at {:?} with {} known cartridges",
            settings.library.location,
            database.len()
        );
        Ok(Library::new(settings, database))
    }
}
