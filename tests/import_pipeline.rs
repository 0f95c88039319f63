//! End-to-end import tests over heuristically identified images

use cartridge_import::{CartridgeRecord, ImportError, Importer, Library, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// LoROM image with a plausible header and the given chipset byte
fn lorom_image(size: usize, rom_type: u8, region: u8) -> Vec<u8> {
    let mut image = vec![0u8; size];
    let header = 0x7fc0;
    image[header..header + 21].copy_from_slice(b"PIPELINE TEST        ");
    image[header + 0x15] = 0x20;
    image[header + 0x16] = rom_type;
    image[header + 0x17] = 0x09;
    image[header + 0x19] = region;
    image[header + 0x1a] = 0x33;
    image[header + 0x3c] = 0x00;
    image[header + 0x3d] = 0x80;
    image[0] = 0x78;
    // Mark every bank so misplaced slices are detectable
    for (bank, chunk) in image.chunks_mut(0x8000).enumerate().skip(1) {
        chunk[0] = bank as u8;
    }
    image
}

fn firmware(size: usize, seed: u8) -> Vec<u8> {
    (0..size).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn settings(library: &Path) -> Settings {
    let mut settings = Settings::default().with_library(library);
    settings.create_manifests = true;
    settings
}

fn target(library: &Path, name: &str) -> PathBuf {
    library.join("Super Famicom").join(format!("{}.sfc", name))
}

#[test]
fn test_plain_lorom_file() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let image = lorom_image(0x40000, 0x02, 0x01);
    let source = temp.path().join("Plain.sfc");
    fs::write(&source, &image).unwrap();

    let settings = settings(&library);
    let records: Vec<CartridgeRecord> = Vec::new();
    let package = Importer::new(&settings, &records)
        .import_location(&source)
        .unwrap();

    assert_eq!(package, target(&library, "Plain"));
    assert_eq!(fs::read(package.join("program.rom")).unwrap(), image);

    let manifest = fs::read_to_string(package.join("manifest.bml")).unwrap();
    assert!(manifest.contains("board type=LOROM region=NTSC"));
    assert!(manifest.contains("title: Plain"));
    assert!(manifest.contains("region: NTSC"));
}

#[test]
fn test_copier_header_stripped() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let image = lorom_image(0x40000, 0x02, 0x02);
    let mut dump = vec![0xaau8; 512];
    dump.extend_from_slice(&image);
    let source = temp.path().join("Headered.smc");
    fs::write(&source, &dump).unwrap();

    let settings = settings(&library);
    let records: Vec<CartridgeRecord> = Vec::new();
    let package = Importer::new(&settings, &records)
        .import_location(&source)
        .unwrap();

    assert_eq!(fs::read(package.join("program.rom")).unwrap(), image);
    let manifest = fs::read_to_string(package.join("manifest.bml")).unwrap();
    assert!(manifest.contains("region: PAL"));
}

#[test]
fn test_dsp1_appended_firmware_sliced() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let image = lorom_image(0x80000, 0x03, 0x01);
    let program = firmware(0x1800, 1);
    let data = firmware(0x800, 2);

    let mut dump = image.clone();
    dump.extend_from_slice(&program);
    dump.extend_from_slice(&data);
    let source = temp.path().join("Pilotwings.sfc");
    fs::write(&source, &dump).unwrap();

    let settings = settings(&library);
    let records: Vec<CartridgeRecord> = Vec::new();
    let package = Importer::new(&settings, &records)
        .import_location(&source)
        .unwrap();

    assert_eq!(fs::read(package.join("program.rom")).unwrap(), image);
    assert_eq!(fs::read(package.join("dsp1b.program.rom")).unwrap(), program);
    assert_eq!(fs::read(package.join("dsp1b.data.rom")).unwrap(), data);
}

#[test]
fn test_split_fragments_assemble_firmware() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let source = temp.path().join("Split.sfc");
    fs::create_dir(&source).unwrap();

    let image = lorom_image(0x80000, 0x03, 0x01);
    let program = firmware(0x1800, 3);
    let data = firmware(0x800, 4);
    fs::write(source.join("program.rom"), &image).unwrap();
    fs::write(source.join("dsp1b.program.rom"), &program).unwrap();
    fs::write(source.join("dsp1b.data.rom"), &data).unwrap();

    let settings = settings(&library);
    let records: Vec<CartridgeRecord> = Vec::new();
    let package = Importer::new(&settings, &records)
        .import_location(&source)
        .unwrap();

    assert_eq!(fs::read(package.join("program.rom")).unwrap(), image);
    assert_eq!(fs::read(package.join("dsp1b.program.rom")).unwrap(), program);
    assert_eq!(fs::read(package.join("dsp1b.data.rom")).unwrap(), data);
}

#[test]
fn test_external_firmware_beside_image() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let roms = temp.path().join("roms");
    fs::create_dir(&roms).unwrap();

    let image = lorom_image(0x80000, 0x03, 0x01);
    let source = roms.join("Pilotwings.sfc");
    fs::write(&source, &image).unwrap();

    let settings = settings(&library);
    let records: Vec<CartridgeRecord> = Vec::new();
    let importer = Importer::new(&settings, &records);

    let err = importer.import_location(&source).unwrap_err();
    assert!(matches!(err, ImportError::FirmwareInvalid(ref name) if name == "dsp1b.program.rom"));
    assert!(!library.exists());

    let program = firmware(0x1800, 5);
    let data = firmware(0x800, 6);
    fs::write(roms.join("dsp1b.program.rom"), &program).unwrap();
    fs::write(roms.join("dsp1b.data.rom"), &data).unwrap();

    let package = importer.import_location(&source).unwrap();
    assert_eq!(fs::read(package.join("program.rom")).unwrap(), image);
    assert_eq!(fs::read(package.join("dsp1b.program.rom")).unwrap(), program);
    assert_eq!(fs::read(package.join("dsp1b.data.rom")).unwrap(), data);
}

#[test]
fn test_unknown_region_recorded() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let source = temp.path().join("Odd.sfc");
    fs::write(&source, lorom_image(0x40000, 0x02, 0x0e)).unwrap();

    let library = Library::new(settings(&library), Default::default());
    let markup = library.manifest(&source).unwrap();

    assert!(markup.contains("region: unknown"));
    assert!(markup.starts_with("board type=LOROM\n"));
}

#[test]
fn test_msu1_not_imported_as_segment() {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    let source = temp.path().join("Msu.sfc");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("program.rom"), lorom_image(0x40000, 0x02, 0x01)).unwrap();
    fs::write(source.join("msu1.rom"), b"S-MSU1").unwrap();

    let settings = settings(&library);
    let records: Vec<CartridgeRecord> = Vec::new();
    let package = Importer::new(&settings, &records)
        .import_location(&source)
        .unwrap();

    let manifest = fs::read_to_string(package.join("manifest.bml")).unwrap();
    assert!(manifest.contains("msu1"));
    assert!(!package.join("msu1.rom").exists());
}

#[test]
fn test_empty_directory_fails_to_parse() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("Empty.sfc");
    fs::create_dir(&source).unwrap();

    let settings = settings(&temp.path().join("library"));
    let records: Vec<CartridgeRecord> = Vec::new();
    let err = Importer::new(&settings, &records)
        .import_location(&source)
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to parse ROM image");
}
