//! Board description synthesis
//!
//! Segment order matters: ROM nodes are emitted in the same order their
//! bytes appear in the assembled image (game ROM first, then coprocessor
//! program and data ROMs).

use super::{BoardKind, Dsp1Map, SuperFamicomCartridge};
use crate::core::markup::{Document, NodeId};

fn hex(value: usize) -> String {
    format!("0x{:x}", value)
}

fn element(doc: &mut Document, parent: NodeId, name: &str, attributes: &[(&str, &str)]) -> NodeId {
    let id = doc.append(parent, name, "");
    for (key, value) in attributes {
        doc.append_attribute(id, *key, *value);
    }
    id
}

fn rom(doc: &mut Document, parent: NodeId, name: &str, size: usize) -> NodeId {
    let size = hex(size);
    element(doc, parent, "rom", &[("name", name), ("size", size.as_str())])
}

fn ram(doc: &mut Document, parent: NodeId, name: Option<&str>, size: usize) -> NodeId {
    let size = hex(size);
    match name {
        Some(name) => element(doc, parent, "ram", &[("name", name), ("size", size.as_str())]),
        None => element(doc, parent, "ram", &[("size", size.as_str())]),
    }
}

fn map(doc: &mut Document, parent: NodeId, address: &str, extra: &[(&str, &str)]) {
    let id = element(doc, parent, "map", &[("address", address)]);
    for (key, value) in extra {
        doc.append_attribute(id, *key, *value);
    }
}

pub(super) fn synthesize(cart: &SuperFamicomCartridge) -> Document {
    let mut doc = Document::new();
    let board = element(&mut doc, Document::ROOT, "board", &[("type", cart.kind.name())]);
    if cart.region.is_known() {
        doc.append_attribute(board, "region", cart.region.as_str());
    }

    base_board(&mut doc, board, cart);
    coprocessors(&mut doc, board, cart);

    if cart.has_msu1 {
        let msu1 = element(&mut doc, Document::ROOT, "msu1", &[]);
        map(&mut doc, msu1, "00-3f,80-bf:2000-2007", &[]);
        element(&mut doc, msu1, "rom", &[("name", "msu1.rom")]);
    }

    doc
}

/// Whether a coprocessor owns the battery-backed RAM instead of the board
fn chip_owns_save_ram(cart: &SuperFamicomCartridge) -> bool {
    cart.chips.obc1 || cart.chips.st010
}

fn save_ram(doc: &mut Document, parent: NodeId, cart: &SuperFamicomCartridge) -> Option<NodeId> {
    if cart.ram_size == 0 || chip_owns_save_ram(cart) {
        return None;
    }
    Some(ram(doc, parent, Some("save.ram"), cart.ram_size))
}

fn base_board(doc: &mut Document, board: NodeId, cart: &SuperFamicomCartridge) {
    match cart.kind {
        BoardKind::LoRom | BoardKind::ExLoRom => {
            let program = rom(doc, board, "program.rom", cart.rom_size);
            map(doc, program, "00-7d,80-ff:8000-ffff", &[("mask", "0x8000")]);
            if let Some(save) = save_ram(doc, board, cart) {
                let range = if cart.rom_size > 0x200000 || cart.ram_size > 0x8000 {
                    "70-7d,f0-ff:0000-7fff"
                } else {
                    "70-7d,f0-ff:0000-ffff"
                };
                map(doc, save, range, &[("mask", "0x8000")]);
            }
        }
        BoardKind::HiRom => {
            let program = rom(doc, board, "program.rom", cart.rom_size);
            map(doc, program, "00-3f,80-bf:8000-ffff", &[]);
            map(doc, program, "40-7d,c0-ff:0000-ffff", &[]);
            if let Some(save) = save_ram(doc, board, cart) {
                map(doc, save, "20-3f,a0-bf:6000-7fff", &[("mask", "0xe000")]);
            }
        }
        BoardKind::ExHiRom => {
            let program = rom(doc, board, "program.rom", cart.rom_size);
            map(doc, program, "00-3f:8000-ffff", &[("base", "0x400000")]);
            map(doc, program, "40-7d:0000-ffff", &[("base", "0x400000")]);
            map(doc, program, "80-bf:8000-ffff", &[("mask", "0xc00000")]);
            map(doc, program, "c0-ff:0000-ffff", &[("mask", "0xc00000")]);
            if let Some(save) = save_ram(doc, board, cart) {
                map(doc, save, "20-3f,a0-bf:6000-7fff", &[("mask", "0xe000")]);
                map(doc, save, "70-7d:0000-7fff", &[]);
            }
        }
        BoardKind::SuperFx => {
            let gsu = element(doc, board, "superfx", &[]);
            map(doc, gsu, "00-3f,80-bf:3000-34ff", &[]);
            let program = rom(doc, gsu, "program.rom", cart.rom_size);
            map(doc, program, "00-3f,80-bf:8000-ffff", &[("mask", "0x8000")]);
            map(doc, program, "40-5f,c0-df:0000-ffff", &[]);
            if let Some(save) = save_ram(doc, gsu, cart) {
                map(doc, save, "00-3f,80-bf:6000-7fff", &[("size", "0x2000")]);
                map(doc, save, "70-71,f0-f1:0000-ffff", &[]);
            }
        }
        BoardKind::Sa1 => {
            let sa1 = element(doc, board, "sa1", &[]);
            map(doc, sa1, "00-3f,80-bf:2200-23ff", &[]);
            let program = rom(doc, sa1, "program.rom", cart.rom_size);
            map(doc, program, "00-3f,80-bf:8000-ffff", &[("mask", "0x408000")]);
            map(doc, program, "c0-ff:0000-ffff", &[]);
            if let Some(save) = save_ram(doc, sa1, cart) {
                map(doc, save, "00-3f,80-bf:6000-7fff", &[("size", "0x2000")]);
                map(doc, save, "40-4f:0000-ffff", &[]);
            }
            let internal = element(doc, sa1, "ram", &[("id", "internal"), ("size", "0x800")]);
            map(doc, internal, "00-3f,80-bf:3000-37ff", &[("size", "0x800")]);
        }
        BoardKind::Sdd1 => {
            let sdd1 = element(doc, board, "sdd1", &[]);
            map(doc, sdd1, "00-3f,80-bf:4800-480f", &[]);
            let program = rom(doc, sdd1, "program.rom", cart.rom_size);
            map(doc, program, "00-3f,80-bf:8000-ffff", &[]);
            map(doc, program, "c0-ff:0000-ffff", &[]);
            if let Some(save) = save_ram(doc, board, cart) {
                map(doc, save, "70-7d:0000-7fff", &[("mask", "0x8000")]);
            }
        }
        BoardKind::Spc7110 => {
            let spc7110 = element(doc, board, "spc7110", &[]);
            map(doc, spc7110, "00-3f,80-bf:4800-483f", &[]);
            let program = rom(doc, spc7110, "program.rom", cart.rom_size);
            map(doc, program, "00-0f,80-bf:8000-ffff", &[("mask", "0x800000")]);
            map(doc, program, "c0-cf:0000-ffff", &[]);
            if cart.data_size > 0 {
                rom(doc, spc7110, "data.rom", cart.data_size);
            }
            if let Some(save) = save_ram(doc, spc7110, cart) {
                map(doc, save, "00-3f,80-bf:6000-7fff", &[("mask", "0xe000")]);
            }
        }
        BoardKind::SatellaviewBios => {
            let program = rom(doc, board, "program.rom", cart.rom_size);
            map(doc, program, "00-7d,80-ff:8000-ffff", &[("mask", "0x8000")]);
            if let Some(save) = save_ram(doc, board, cart) {
                map(doc, save, "10-17:5000-5fff", &[("mask", "0xf000")]);
            }
            let download = element(doc, board, "ram", &[("id", "download"), ("size", "0x80000")]);
            map(doc, download, "00-3f,80-bf:6000-7fff", &[]);
            let slot = element(doc, board, "bsmemory", &[]);
            map(doc, slot, "c0-ef:0000-ffff", &[]);
        }
        BoardKind::SufamiTurboBios => {
            let program = rom(doc, board, "program.rom", cart.rom_size);
            map(doc, program, "00-1f,80-9f:8000-ffff", &[("mask", "0x8000")]);
            for (slot, rom_range, ram_range) in [
                ("A", "20-3f,a0-bf:8000-ffff", "60-6f,e0-ef:0000-ffff"),
                ("B", "40-5f,c0-df:8000-ffff", "70-7d,f0-ff:0000-ffff"),
            ] {
                let node = element(doc, board, "sufamiturbo", &[("slot", slot)]);
                let pack = element(doc, node, "rom", &[]);
                map(doc, pack, rom_range, &[("mask", "0x8000")]);
                let save = element(doc, node, "ram", &[]);
                map(doc, save, ram_range, &[]);
            }
        }
        BoardKind::SuperGameBoy { revision } => {
            let program = rom(doc, board, "program.rom", cart.rom_size);
            map(doc, program, "00-7d,80-ff:8000-ffff", &[("mask", "0x8000")]);
            let revision = revision.to_string();
            let icd2 = element(doc, board, "icd2", &[("revision", revision.as_str())]);
            map(doc, icd2, "00-3f,80-bf:6000-67ff,7000-7fff", &[]);
            rom(doc, icd2, &format!("sgb{}.boot.rom", revision), 0x100);
        }
    }
}

/// `necdsp` node carrying program and data firmware
fn necdsp(
    doc: &mut Document,
    board: NodeId,
    model: &str,
    frequency: &str,
    firmware: &str,
    sizes: (usize, usize),
    address: &str,
) -> NodeId {
    let dsp = element(doc, board, "necdsp", &[("model", model), ("frequency", frequency)]);
    map(doc, dsp, address, &[("mask", "0x3fff")]);
    rom(doc, dsp, &format!("{}.program.rom", firmware), sizes.0);
    rom(doc, dsp, &format!("{}.data.rom", firmware), sizes.1);
    dsp
}

fn coprocessors(doc: &mut Document, board: NodeId, cart: &SuperFamicomCartridge) {
    let chips = &cart.chips;

    if let Some(dsp1_map) = chips.dsp1 {
        let address = match dsp1_map {
            Dsp1Map::LoRom1Mb => "20-3f,a0-bf:8000-ffff",
            Dsp1Map::LoRom2Mb => "60-6f,e0-ef:0000-7fff",
            Dsp1Map::HiRom => "00-1f,80-9f:6000-7fff",
        };
        let dsp = necdsp(doc, board, "uPD7725", "8000000", "dsp1b", (0x1800, 0x800), address);
        ram(doc, dsp, None, 0x200);
    }
    for (present, firmware, address) in [
        (chips.dsp2, "dsp2", "20-3f,a0-bf:8000-ffff"),
        (chips.dsp3, "dsp3", "20-3f,a0-bf:8000-ffff"),
        (chips.dsp4, "dsp4", "30-3f,b0-bf:8000-ffff"),
    ] {
        if present {
            let dsp = necdsp(doc, board, "uPD7725", "8000000", firmware, (0x1800, 0x800), address);
            ram(doc, dsp, None, 0x200);
        }
    }

    if chips.st010 {
        let dsp = necdsp(
            doc,
            board,
            "uPD96050",
            "11000000",
            "st010",
            (0xc000, 0x1000),
            "60-67,e0-e7:0000-3fff",
        );
        ram(doc, dsp, Some("save.ram"), 0x1000);
    }
    if chips.st011 {
        let dsp = necdsp(
            doc,
            board,
            "uPD96050",
            "15000000",
            "st011",
            (0xc000, 0x1000),
            "60-67,e0-e7:0000-3fff",
        );
        ram(doc, dsp, None, 0x1000);
    }

    if chips.st018 {
        let arm = element(doc, board, "armdsp", &[("frequency", "21477272")]);
        map(doc, arm, "00-3f,80-bf:3800-38ff", &[]);
        rom(doc, arm, "st018.program.rom", 0x20000);
        rom(doc, arm, "st018.data.rom", 0x8000);
        ram(doc, arm, None, 0x4000);
    }

    if chips.cx4 {
        let cx4 = element(
            doc,
            board,
            "hitachidsp",
            &[("model", "HG51B169"), ("frequency", "20000000")],
        );
        map(doc, cx4, "00-3f,80-bf:6c00-6fff,7c00-7fff", &[]);
        rom(doc, cx4, "cx4.data.rom", 0xc00);
        ram(doc, cx4, None, 0xc00);
    }

    if chips.obc1 {
        let obc1 = element(doc, board, "obc1", &[]);
        map(doc, obc1, "00-3f,80-bf:6000-7fff", &[("mask", "0xe000")]);
        ram(doc, obc1, Some("save.ram"), 0x2000);
    }

    if chips.sharp_rtc {
        let rtc = element(doc, board, "sharprtc", &[]);
        map(doc, rtc, "00-3f,80-bf:2800-2801", &[]);
        ram(doc, rtc, Some("rtc.ram"), 0x10);
    }

    if chips.epson_rtc {
        let rtc = element(doc, board, "epsonrtc", &[]);
        map(doc, rtc, "00-3f,80-bf:4840-4842", &[]);
        ram(doc, rtc, Some("rtc.ram"), 0x10);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Chips, Region};
    use super::*;

    fn cart(kind: BoardKind) -> SuperFamicomCartridge {
        SuperFamicomCartridge {
            kind,
            region: Region::Ntsc,
            title: "TEST".to_string(),
            rom_size: 0x80000,
            data_size: 0,
            ram_size: 0x2000,
            chips: Chips::default(),
            firmware_appended: false,
            has_msu1: false,
        }
    }

    fn rom_names(doc: &Document) -> Vec<String> {
        doc.descendants(Document::ROOT)
            .into_iter()
            .map(|id| doc.node(id))
            .filter(|node| node.name() == "rom" && !node.get("name").is_empty())
            .map(|node| node.get("name").to_string())
            .collect()
    }

    #[test]
    fn test_lorom_board() {
        let doc = synthesize(&cart(BoardKind::LoRom));
        let root = doc.root();

        assert_eq!(root.get("board/type"), "LOROM");
        assert_eq!(root.get("board/region"), "NTSC");
        assert_eq!(root.get("board/rom/size"), "0x80000");
        assert_eq!(root.get("board/ram/name"), "save.ram");
        assert_eq!(root.get("board/ram/map/address"), "70-7d,f0-ff:0000-ffff");
        assert!(root.find("msu1").is_none());
    }

    #[test]
    fn test_unknown_region_omitted() {
        let mut cart = cart(BoardKind::HiRom);
        cart.region = Region::Unknown(0x42);
        let doc = synthesize(&cart);
        assert!(doc.root().find("board/region").is_none());
    }

    #[test]
    fn test_firmware_follows_program() {
        let mut cart = cart(BoardKind::LoRom);
        cart.chips.dsp1 = Some(Dsp1Map::LoRom2Mb);
        cart.chips.cx4 = true;
        let doc = synthesize(&cart);

        assert_eq!(
            rom_names(&doc),
            vec!["program.rom", "dsp1b.program.rom", "dsp1b.data.rom", "cx4.data.rom"]
        );
    }

    #[test]
    fn test_spc7110_data_rom() {
        let mut cart = cart(BoardKind::Spc7110);
        cart.rom_size = 0x100000;
        cart.data_size = 0x300000;
        cart.chips.epson_rtc = true;
        let doc = synthesize(&cart);

        assert_eq!(rom_names(&doc), vec!["program.rom", "data.rom"]);
        assert_eq!(doc.root().get("board/epsonrtc/ram/name"), "rtc.ram");
    }

    #[test]
    fn test_super_game_boy_boot_rom() {
        let doc = synthesize(&cart(BoardKind::SuperGameBoy { revision: 2 }));
        assert_eq!(rom_names(&doc), vec!["program.rom", "sgb2.boot.rom"]);
        assert_eq!(doc.root().get("board/icd2/revision"), "2");
    }

    #[test]
    fn test_save_ram_owned_by_chip() {
        let mut cart = cart(BoardKind::LoRom);
        cart.chips.obc1 = true;
        let doc = synthesize(&cart);
        let saves = doc
            .descendants(Document::ROOT)
            .into_iter()
            .filter(|&id| doc.node(id).get("name") == "save.ram")
            .count();
        assert_eq!(saves, 1);
        assert_eq!(doc.root().get("board/obc1/ram/name"), "save.ram");
    }
}
