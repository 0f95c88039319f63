//! Cartridge resolution
//!
//! Turns an assembled buffer into a [`Manifest`] by trying identification
//! strategies in priority order. Each strategy is gated by a setting and
//! returns an optional manifest; the first one to produce a manifest wins
//! and later strategies are not consulted.

use crate::core::database::CartridgeRecords;
use crate::core::digest::sha256_hex;
use crate::core::heuristics;
use crate::core::manifest::Manifest;
use crate::core::markup::Document;
use crate::core::settings::{SettingsStore, USE_DATABASE, USE_HEURISTICS};
use crate::core::validation::SourceLocation;
use crate::error::Result;
use tracing::{debug, info, warn};

/// One identification strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exact digest lookup in the known-cartridge database
    Database,
    /// Structural decode of the image header
    Heuristics,
}

impl Strategy {
    /// Setting that enables this strategy
    pub fn setting(&self) -> &'static str {
        match self {
            Strategy::Database => USE_DATABASE,
            Strategy::Heuristics => USE_HEURISTICS,
        }
    }
}

/// Default priority order
pub const DEFAULT_STRATEGIES: [Strategy; 2] = [Strategy::Database, Strategy::Heuristics];

/// Resolves buffers against injected settings and database
pub struct Resolver<'a, S: ?Sized, D: ?Sized> {
    settings: &'a S,
    database: &'a D,
    strategies: Vec<Strategy>,
}

impl<'a, S, D> Resolver<'a, S, D>
where
    S: SettingsStore + ?Sized,
    D: CartridgeRecords + ?Sized,
{
    pub fn new(settings: &'a S, database: &'a D) -> Self {
        Resolver {
            settings,
            database,
            strategies: DEFAULT_STRATEGIES.to_vec(),
        }
    }

    /// Replace the strategy order
    pub fn with_strategies(mut self, strategies: impl Into<Vec<Strategy>>) -> Self {
        self.strategies = strategies.into();
        self
    }

    /// Hash `buffer` and resolve it
    pub fn resolve(&self, buffer: &[u8], location: &SourceLocation) -> Result<Option<Manifest>> {
        let digest = sha256_hex(buffer);
        self.resolve_digest(buffer, &digest, location)
    }

    /// Resolve with a precomputed digest
    ///
    /// Returns `Ok(None)` when no enabled strategy identifies the image.
    pub fn resolve_digest(
        &self,
        buffer: &[u8],
        digest: &str,
        location: &SourceLocation,
    ) -> Result<Option<Manifest>> {
        for strategy in &self.strategies {
            if !self.settings.boolean(strategy.setting()) {
                debug!("Strategy {:?} disabled", strategy);
                continue;
            }

            let manifest = match strategy {
                Strategy::Database => self.from_database(digest),
                Strategy::Heuristics => self.from_heuristics(buffer, digest, location),
            };

            if let Some(manifest) = manifest {
                info!(
                    "Identified {} via {} (sha256 {})",
                    location.name(),
                    manifest.provenance,
                    digest
                );
                return Ok(Some(manifest));
            }
        }

        debug!("No strategy identified {}", location.name());
        Ok(None)
    }

    /// A record whose markup does not parse counts as a miss
    fn from_database(&self, digest: &str) -> Option<Manifest> {
        let record = self.database.find(digest)?;

        let mut document = match Document::parse(&record.markup) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping database record {}: {}", record.sha256, e);
                return None;
            }
        };
        // Stored hashes may predate this digest scheme; record what was observed
        document.set(Document::ROOT, "information/sha256", digest);
        Some(Manifest::from_database(document, digest))
    }

    fn from_heuristics(
        &self,
        buffer: &[u8],
        digest: &str,
        location: &SourceLocation,
    ) -> Option<Manifest> {
        let has_msu1 = location.sibling("msu1.rom").exists();
        let layout = heuristics::decode(buffer, has_msu1)?;

        let mut document = layout.document;
        let information = document.append(Document::ROOT, "information", "");
        document.append(information, "region", layout.region.as_str());
        document.append(information, "title", location.name());
        document.append(information, "sha256", digest);
        document.append(information, "note", Manifest::HEURISTIC_NOTE);

        Some(Manifest::from_heuristics(
            document,
            digest,
            layout.region,
            layout.firmware_appended,
        ))
    }
}
