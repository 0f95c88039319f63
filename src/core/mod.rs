//! Identification and import pipeline
//!
//! - [`assembler`] - concatenates fragment files into one buffer
//! - [`digest`] - SHA-256 of the assembled buffer
//! - [`resolver`] - database lookup, then heuristic decode
//!   - [`database`] - known-cartridge records
//!   - [`heuristics`] - structural header decoder
//! - [`scanner`] - ROM segments declared by a manifest
//! - [`importer`] - validates and writes the library package
//!
//! Supporting modules: [`markup`] (BML documents), [`settings`],
//! [`manifest`], [`validation`] (package naming) and [`pattern`]
//! (file-name globbing).
//!
//! ## Control flow
//!
//! ```text
//! location ──► assembler ──► digest ──► resolver ──► scanner ──► importer
//!                                         │                         │
//!                                 database│heuristics        <library>/Super Famicom/
//!                                                               <name>.sfc/
//! ```

pub mod assembler;
pub mod database;
pub mod digest;
pub mod heuristics;
pub mod importer;
pub mod manifest;
pub mod markup;
pub mod pattern;
pub mod resolver;
pub mod scanner;
pub mod settings;
pub mod validation;
