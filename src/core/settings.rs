//! Configuration consumed by the resolver and importer
//!
//! Settings are looked up by their well-known key names through the
//! [`SettingsStore`] trait, so embedders can back them with anything. The
//! crate ships a TOML-backed [`Settings`] and an implementation for plain
//! string maps.
//!
//! ```toml
//! UseDatabase = true
//! UseHeuristics = true
//! CreateManifests = false
//!
//! [Library]
//! Location = "/home/user/Emulation"
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Look up identified cartridges in the known-cartridge database
pub const USE_DATABASE: &str = "UseDatabase";
/// Fall back to structural decoding when the database has no match
pub const USE_HEURISTICS: &str = "UseHeuristics";
/// Write `manifest.bml` into each imported package
pub const CREATE_MANIFESTS: &str = "CreateManifests";
/// Root directory of the output library
pub const LIBRARY_LOCATION: &str = "Library/Location";

/// Read-only key lookup
pub trait SettingsStore {
    /// Boolean setting; unknown keys read as false
    fn boolean(&self, key: &str) -> bool;

    /// String setting
    fn text(&self, key: &str) -> Option<String>;
}

/// Library section of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySettings {
    #[serde(rename = "Location")]
    pub location: PathBuf,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        LibrarySettings {
            location: home.unwrap_or_default().join("Emulation"),
        }
    }
}

/// TOML-backed settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "UseDatabase")]
    pub use_database: bool,

    #[serde(rename = "UseHeuristics")]
    pub use_heuristics: bool,

    #[serde(rename = "CreateManifests")]
    pub create_manifests: bool,

    #[serde(rename = "Library")]
    pub library: LibrarySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            use_database: true,
            use_heuristics: true,
            create_manifests: false,
            library: LibrarySettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text; absent keys take their defaults
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Serialize to TOML
    ///
    /// Fails when the library path is not valid UTF-8.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Set the library root
    pub fn with_library(mut self, location: impl Into<PathBuf>) -> Self {
        self.library.location = location.into();
        self
    }
}

impl SettingsStore for Settings {
    fn boolean(&self, key: &str) -> bool {
        match key {
            USE_DATABASE => self.use_database,
            USE_HEURISTICS => self.use_heuristics,
            CREATE_MANIFESTS => self.create_manifests,
            _ => false,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match key {
            LIBRARY_LOCATION => Some(self.library.location.to_string_lossy().into_owned()),
            _ => None,
        }
    }
}

impl SettingsStore for HashMap<String, String> {
    fn boolean(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: SettingsStore + ?Sized> SettingsStore for &T {
    fn boolean(&self, key: &str) -> bool {
        (**self).boolean(key)
    }

    fn text(&self, key: &str) -> Option<String> {
        (**self).text(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.boolean(USE_DATABASE));
        assert!(settings.boolean(USE_HEURISTICS));
        assert!(!settings.boolean(CREATE_MANIFESTS));
        assert!(settings.text(LIBRARY_LOCATION).unwrap().ends_with("Emulation"));
        assert!(!settings.boolean("Unknown"));
    }

    #[test]
    fn test_parse_partial_file() {
        let settings = Settings::parse(
            "UseHeuristics = false\nCreateManifests = true\n\n[Library]\nLocation = \"/srv/library\"\n",
        )
        .unwrap();

        assert!(settings.use_database);
        assert!(!settings.use_heuristics);
        assert!(settings.create_manifests);
        assert_eq!(settings.text(LIBRARY_LOCATION).as_deref(), Some("/srv/library"));
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(Settings::parse("UseDatabase = \"maybe\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings::default().with_library("/tmp/lib");
        let reparsed = Settings::parse(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, settings);
    }

    #[cfg(unix)]
    #[test]
    fn test_to_toml_rejects_non_utf8_library() {
        use crate::error::ImportError;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let settings = Settings::default().with_library(OsStr::from_bytes(b"/tmp/lib\xff"));
        let err = settings.to_toml().unwrap_err();
        assert!(matches!(err, ImportError::SettingsWrite(_)));
    }

    #[test]
    fn test_map_store() {
        let mut map = HashMap::new();
        map.insert(USE_DATABASE.to_string(), "true".to_string());
        map.insert(USE_HEURISTICS.to_string(), "off".to_string());
        map.insert(LIBRARY_LOCATION.to_string(), "/lib".to_string());

        assert!(map.boolean(USE_DATABASE));
        assert!(!map.boolean(USE_HEURISTICS));
        assert!(!map.boolean(CREATE_MANIFESTS));
        assert_eq!(map.text(LIBRARY_LOCATION).as_deref(), Some("/lib"));
    }
}
