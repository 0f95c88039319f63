//! Known-cartridge database
//!
//! The database is a BML file of `cartridge` records, each keyed by the
//! SHA-256 of the assembled image:
//!
//! ```text
//! database revision=2016-08-01
//!
//! cartridge sha256=12b77c4bc9c1832cee8881244659065ee1d84c70c3d29e6eaf92e6798cc2ca72
//!   board type=SHVC-1A3B-13
//!     rom name=program.rom size=0x80000
//!     ram name=save.ram size=0x800
//!   information
//!     title: Super Mario World
//! ```
//!
//! A record's markup is its children, re-serialized as a standalone document.

use crate::core::digest::same_digest;
use crate::core::markup::Document;
use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};

/// One known cartridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeRecord {
    /// SHA-256 of the assembled image, hex
    pub sha256: String,

    /// Metadata document text
    pub markup: String,
}

impl CartridgeRecord {
    pub fn new(sha256: impl Into<String>, markup: impl Into<String>) -> Self {
        CartridgeRecord {
            sha256: sha256.into(),
            markup: markup.into(),
        }
    }

    pub fn matches(&self, digest: &str) -> bool {
        same_digest(&self.sha256, digest)
    }
}

/// Iterable collection of known cartridges
pub trait CartridgeRecords {
    fn records(&self) -> Box<dyn Iterator<Item = &CartridgeRecord> + '_>;

    /// First record whose hash equals `digest`
    fn find(&self, digest: &str) -> Option<&CartridgeRecord> {
        self.records().find(|record| record.matches(digest))
    }
}

impl CartridgeRecords for [CartridgeRecord] {
    fn records(&self) -> Box<dyn Iterator<Item = &CartridgeRecord> + '_> {
        Box::new(self.iter())
    }
}

impl CartridgeRecords for Vec<CartridgeRecord> {
    fn records(&self) -> Box<dyn Iterator<Item = &CartridgeRecord> + '_> {
        Box::new(self.iter())
    }
}

/// In-memory database loaded from BML
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    revision: Option<String>,
    records: Vec<CartridgeRecord>,
}

impl Database {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse database text
    pub fn parse(text: &str) -> Result<Self> {
        let doc = Document::parse(text)?;
        let root = doc.root();

        let revision = root
            .find("database/revision")
            .map(|node| node.text().to_string());

        let mut records = Vec::new();
        for node in root.children().filter(|node| node.name() == "cartridge") {
            let sha256 = node.get("sha256");
            if sha256.is_empty() {
                warn!("Skipping database cartridge without sha256");
                continue;
            }

            let mut markup = Document::new();
            for child in node.children().filter(|child| !child.is_attribute()) {
                let copy = markup.append(Document::ROOT, child.name(), child.value());
                markup.graft(copy, &doc, child.id());
            }
            records.push(CartridgeRecord::new(sha256, markup.to_markup()));
        }

        debug!("Loaded {} database records", records.len());
        Ok(Database { revision, records })
    }

    /// Load a database file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: CartridgeRecord) {
        self.records.push(record);
    }
}

impl CartridgeRecords for Database {
    fn records(&self) -> Box<dyn Iterator<Item = &CartridgeRecord> + '_> {
        Box::new(self.records.iter())
    }
}

impl FromIterator<CartridgeRecord> for Database {
    fn from_iter<I: IntoIterator<Item = CartridgeRecord>>(iter: I) -> Self {
        Database {
            revision: None,
            records: iter.into_iter().collect(),
        }
    }
}
