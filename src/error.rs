//! Error types for cartridge identification and import

use thiserror::Error;

/// Import operation errors
///
/// Every failure in the pipeline is reported through this enum. The first four
/// variants are the import outcomes callers are expected to surface to users;
/// the rest are ambient failures (I/O, malformed markup, bad settings).
#[derive(Error, Debug)]
pub enum ImportError {
    /// Neither the database nor the heuristic decoder identified the image
    #[error("failed to parse ROM image")]
    ParseFailure,

    /// An external firmware file is absent or has the wrong size
    #[error("firmware ({0}) missing or invalid")]
    FirmwareInvalid(String),

    /// The target package directory could not be created
    #[error("library path unwritable")]
    LibraryUnwritable(#[source] std::io::Error),

    /// The buffer is shorter than the declared segment layout
    #[error("ROM image is missing data")]
    MissingData,

    /// Source location has no usable base name
    #[error("invalid source location: {0}")]
    InvalidLocation(String),

    /// Segment name is not a single file name inside the package
    #[error("invalid segment name: {0}")]
    InvalidSegmentName(String),

    /// Package name cannot be used as a directory name
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    /// Markup document could not be parsed
    #[error("markup error on line {line}: {reason}")]
    Markup { line: usize, reason: String },

    /// Settings file could not be parsed
    #[error("settings error: {0}")]
    Settings(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("settings serialization error: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    pub(crate) fn markup(line: usize, reason: impl Into<String>) -> Self {
        ImportError::Markup {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
