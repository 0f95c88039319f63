//! Resolved cartridge manifests
//!
//! A manifest is the metadata document chosen for one dump, together with
//! where it came from. The manifest distinguishes between:
//! - **Database** manifests, copied from a known-cartridge record
//! - **Heuristic** manifests, synthesized from the image's internal header

use crate::core::heuristics::Region;
use crate::core::markup::{Document, Node};

/// How the manifest was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Exact digest match in the known-cartridge database
    Database,
    /// Structural decode of the image
    Heuristics,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Database => "database",
            Provenance::Heuristics => "heuristics",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata document plus provenance for one dump
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Cartridge description (`board`, `information`, ...)
    pub document: Document,

    /// SHA-256 of the assembled buffer
    pub digest: String,

    pub provenance: Provenance,

    /// Whether firmware bytes live inside the buffer
    ///
    /// Only the heuristic decoder determines this; `None` leaves the
    /// importer's default in place.
    pub firmware_appended: Option<bool>,

    /// Region decoded from the header (heuristic manifests only)
    pub region: Option<Region>,
}

impl Manifest {
    /// Manifest file name inside a package
    pub const FILE_NAME: &'static str = "manifest.bml";

    /// Note written into heuristic manifests
    pub const HEURISTIC_NOTE: &'static str = "heuristically generated by cartridge-import";

    /// Manifest copied from a database record
    pub fn from_database(document: Document, digest: impl Into<String>) -> Self {
        Manifest {
            document,
            digest: digest.into(),
            provenance: Provenance::Database,
            firmware_appended: None,
            region: None,
        }
    }

    /// Manifest synthesized by the heuristic decoder
    pub fn from_heuristics(
        document: Document,
        digest: impl Into<String>,
        region: Region,
        firmware_appended: bool,
    ) -> Self {
        Manifest {
            document,
            digest: digest.into(),
            provenance: Provenance::Heuristics,
            firmware_appended: Some(firmware_appended),
            region: Some(region),
        }
    }

    /// Serialized document
    pub fn markup(&self) -> String {
        self.document.to_markup()
    }

    /// The `board` subtree, if present
    pub fn board(&self) -> Option<Node<'_>> {
        self.document.root().find("board")
    }

    /// `information/title`, or "" when absent
    pub fn title(&self) -> &str {
        self.document.root().get("information/title")
    }

    pub fn is_heuristic(&self) -> bool {
        self.provenance == Provenance::Heuristics
    }

    /// Firmware-appended flag, falling back to `default`
    pub fn firmware_appended_or(&self, default: bool) -> bool {
        self.firmware_appended.unwrap_or(default)
    }
}
