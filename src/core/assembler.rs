//! Byte buffer assembly from cartridge fragment files
//!
//! A dump may arrive as a single `program.rom` or split into boot, program,
//! data and slot fragments. The assembler concatenates whatever is present in
//! a fixed priority order; that order defines the byte offsets the importer
//! later slices segments from, so it must never change.

use crate::core::pattern::FileNamePattern;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One step of the fixed concatenation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    /// A single file with this exact name
    Literal(&'static str),
    /// Every file whose name matches, in sorted order
    Glob(&'static str),
}

/// Concatenation order for fragment files
pub const FRAGMENT_ORDER: [Fragment; 6] = [
    Fragment::Literal("program.rom"),
    Fragment::Literal("data.rom"),
    Fragment::Glob("slot-*.rom"),
    Fragment::Glob("*.boot.rom"),
    Fragment::Glob("*.program.rom"),
    Fragment::Glob("*.data.rom"),
];

/// Sorted names of the regular files in `dir`
///
/// An unreadable directory lists as empty.
pub fn list_files(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Resolve the fragment files present in `dir`, in concatenation order
pub fn fragments(dir: &Path) -> Vec<PathBuf> {
    let names = list_files(dir);
    let mut paths = Vec::new();

    for fragment in FRAGMENT_ORDER {
        match fragment {
            Fragment::Literal(name) => {
                if names.iter().any(|n| n == name) {
                    paths.push(dir.join(name));
                }
            }
            Fragment::Glob(pattern) => {
                let pattern = FileNamePattern::new(pattern);
                for name in pattern.filter(names.iter().map(String::as_str)) {
                    paths.push(dir.join(name));
                }
            }
        }
    }

    paths
}

/// Concatenate every fragment in `dir` into one buffer
///
/// Missing fragments contribute nothing. A fragment that exists but cannot be
/// read is skipped with a warning; an empty buffer is detected downstream.
pub fn assemble(dir: &Path) -> Vec<u8> {
    let mut buffer = Vec::new();

    for path in fragments(dir) {
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!("Appending {:?} ({} bytes) at offset {}", path, bytes.len(), buffer.len());
                buffer.extend_from_slice(&bytes);
            }
            Err(e) => warn!("Skipping unreadable fragment {:?}: {}", path, e),
        }
    }

    debug!("Assembled {} bytes from {:?}", buffer.len(), dir);
    buffer
}
