//! Database-before-heuristics resolution against a parsed database file

use cartridge_import::{
    sha256_hex, Database, Importer, Provenance, Resolver, Settings, SourceLocation,
};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn lorom_image() -> Vec<u8> {
    let mut image = vec![0u8; 0x40000];
    image[0x7fd5] = 0x20;
    image[0x7fd9] = 0x01;
    image[0x7ffd] = 0x80;
    image[0] = 0x78;
    image
}

fn database_for(image: &[u8]) -> Database {
    let text = format!(
        "database revision=2024-01-01\n\
         \n\
         cartridge sha256={}\n\
         \x20 board type=SHVC-1A0N-02\n\
         \x20   rom name=program.rom size=0x40000\n\
         \x20 information\n\
         \x20   title:    Known Game\n\
         \x20   sha256:   0000\n\
         \n\
         cartridge sha256=ffff\n\
         \x20 board type=OTHER\n",
        sha256_hex(image).to_uppercase()
    );
    Database::parse(&text).unwrap()
}

#[test]
fn test_database_record_used_verbatim() {
    let temp = TempDir::new().unwrap();
    let image = lorom_image();
    let database = database_for(&image);
    assert_eq!(database.len(), 2);
    assert_eq!(database.revision(), Some("2024-01-01"));

    let location = SourceLocation::new(temp.path().join("Whatever.sfc")).unwrap();
    let settings = Settings::default();
    let manifest = Resolver::new(&settings, &database)
        .resolve(&image, &location)
        .unwrap()
        .unwrap();

    let root = manifest.document.root();
    assert_eq!(manifest.provenance, Provenance::Database);
    assert_eq!(root.get("board/type"), "SHVC-1A0N-02");
    assert_eq!(root.get("information/title"), "Known Game");
    assert_eq!(root.get("information/sha256"), sha256_hex(&image));
    assert!(root.find("information/note").is_none());
}

#[test]
fn test_heuristics_when_database_disabled() {
    let temp = TempDir::new().unwrap();
    let image = lorom_image();
    let database = database_for(&image);

    let mut settings = HashMap::new();
    settings.insert("UseDatabase".to_string(), "false".to_string());
    settings.insert("UseHeuristics".to_string(), "true".to_string());

    let location = SourceLocation::new(temp.path().join("Fallback.sfc")).unwrap();
    let manifest = Resolver::new(&settings, &database)
        .resolve(&image, &location)
        .unwrap()
        .unwrap();

    assert_eq!(manifest.provenance, Provenance::Heuristics);
    assert_eq!(manifest.document.root().get("board/type"), "LOROM");
    assert_eq!(manifest.document.root().get("information/title"), "Fallback");
}

#[test]
fn test_database_import_keeps_firmware_in_buffer() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("Known.sfc");
    let mut image = lorom_image();
    image.extend(vec![0x5au8; 0x100]);
    fs::write(&source, &image).unwrap();

    let text = format!(
        "cartridge sha256={}\n\
         \x20 board\n\
         \x20   rom name=program.rom size=0x40000\n\
         \x20   icd2\n\
         \x20     rom name=sgb.boot.rom size=0x100\n",
        sha256_hex(&image)
    );
    let database = Database::parse(&text).unwrap();
    let settings = Settings::default().with_library(temp.path().join("library"));

    let package = Importer::new(&settings, &database)
        .import_location(&source)
        .unwrap();

    assert_eq!(fs::read(package.join("program.rom")).unwrap(), &image[..0x40000]);
    assert_eq!(fs::read(package.join("sgb.boot.rom")).unwrap(), vec![0x5au8; 0x100]);
}
