//! Structural identification of Super Famicom images
//!
//! When an image is not in the database, its layout is inferred from the
//! internal header: memory map, coprocessors, RAM size and region. The result
//! is a synthesized metadata document describing the board.
//!
//! ## Appended firmware
//!
//! Coprocessor carts need the chip's program/data ROM. Dumps often carry it
//! concatenated after the game ROM (and the assembler concatenates separate
//! firmware files the same way), which shows up as a size remainder matching
//! the firmware size exactly. When that remainder is present the firmware is
//! reported as appended and excluded from the program ROM size.

mod board;
pub mod header;

use crate::core::markup::Document;
use header::Header;
use tracing::debug;

/// Legacy copier header prepended by some dump tools
pub const COPIER_HEADER_SIZE: usize = 512;

/// Smallest image the decoder accepts (after removing a copier header)
pub const MIN_IMAGE_SIZE: usize = 0x8000;

const GAME_BOY_LOGO: [u8; 8] = [0xce, 0xed, 0x66, 0x66, 0xcc, 0x0d, 0x00, 0x0b];

/// True when `len` leaves a 512-byte remainder over 32 KiB banks
pub fn has_copier_header(len: usize) -> bool {
    len % 0x8000 == COPIER_HEADER_SIZE
}

/// Video region decoded from the header's destination code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
    /// Destination code outside the known tables
    Unknown(u8),
}

impl Region {
    pub fn from_code(code: u8) -> Self {
        match code {
            // Japan, North America, Korea, Canada, Brazil
            0x00 | 0x01 | 0x0d | 0x0f | 0x10 => Region::Ntsc,
            // Europe and Scandinavia through Indonesia, Australia
            0x02..=0x0c | 0x11 => Region::Pal,
            other => Region::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Ntsc => "NTSC",
            Region::Pal => "PAL",
            Region::Unknown(_) => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Region::Unknown(_))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base board family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    LoRom,
    HiRom,
    ExLoRom,
    ExHiRom,
    SuperFx,
    Sa1,
    Sdd1,
    Spc7110,
    SatellaviewBios,
    SufamiTurboBios,
    SuperGameBoy { revision: u8 },
}

impl BoardKind {
    pub fn name(&self) -> &'static str {
        match self {
            BoardKind::LoRom => "LOROM",
            BoardKind::HiRom => "HIROM",
            BoardKind::ExLoRom => "EXLOROM",
            BoardKind::ExHiRom => "EXHIROM",
            BoardKind::SuperFx => "SUPERFX",
            BoardKind::Sa1 => "SA1",
            BoardKind::Sdd1 => "SDD1",
            BoardKind::Spc7110 => "SPC7110",
            BoardKind::SatellaviewBios => "BSX-BIOS",
            BoardKind::SufamiTurboBios => "SUFAMI-TURBO-BIOS",
            BoardKind::SuperGameBoy { .. } => "SGB",
        }
    }
}

/// Memory map used by the DSP1, which shipped on three different boards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dsp1Map {
    LoRom1Mb,
    LoRom2Mb,
    HiRom,
}

/// Coprocessors found on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chips {
    pub dsp1: Option<Dsp1Map>,
    pub dsp2: bool,
    pub dsp3: bool,
    pub dsp4: bool,
    pub cx4: bool,
    pub obc1: bool,
    pub st010: bool,
    pub st011: bool,
    pub st018: bool,
    pub sharp_rtc: bool,
    pub epson_rtc: bool,
}

impl Chips {
    /// Size of the firmware image the detected chip needs, if any
    fn firmware_size(&self, kind: BoardKind) -> Option<(usize, usize)> {
        // (size, alignment the remainder is measured against)
        if self.dsp1.is_some() || self.dsp2 || self.dsp3 || self.dsp4 {
            Some((0x2000, 0x8000))
        } else if self.st010 || self.st011 {
            Some((0xd000, 0x10000))
        } else if self.st018 {
            Some((0x28000, 0x40000))
        } else if self.cx4 {
            Some((0xc00, 0x8000))
        } else if matches!(kind, BoardKind::SuperGameBoy { .. }) {
            Some((0x100, 0x8000))
        } else {
            None
        }
    }
}

/// Everything the decoder learned about an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperFamicomCartridge {
    pub kind: BoardKind,
    pub region: Region,
    pub title: String,
    /// Program ROM size, firmware excluded
    pub rom_size: usize,
    /// Data ROM size (SPC7110 only)
    pub data_size: usize,
    /// Battery-backed RAM size
    pub ram_size: usize,
    pub chips: Chips,
    pub firmware_appended: bool,
    pub has_msu1: bool,
}

impl SuperFamicomCartridge {
    /// Analyze a raw image
    ///
    /// Returns `None` for images that are too small, Game Boy images, Sufami
    /// Turbo game packs, and anything whose header cannot be located.
    pub fn analyze(image: &[u8], has_msu1: bool) -> Option<Self> {
        let image = if has_copier_header(image.len()) {
            &image[COPIER_HEADER_SIZE..]
        } else {
            image
        };
        if image.len() < MIN_IMAGE_SIZE {
            debug!("Image too small for heuristics: {} bytes", image.len());
            return None;
        }
        if image.get(0x104..0x10c) == Some(&GAME_BOY_LOGO[..]) {
            debug!("Image is a Game Boy cartridge");
            return None;
        }

        let header = header::locate(image)?;
        let kind = Self::board_kind(image, &header)?;
        let chips = Self::chips(image.len(), &header);

        let mut cartridge = SuperFamicomCartridge {
            kind,
            region: Region::from_code(header.region()),
            title: header.title(),
            rom_size: image.len(),
            data_size: 0,
            ram_size: Self::ram_size(kind, &header),
            chips,
            firmware_appended: false,
            has_msu1,
        };

        if let Some((size, alignment)) = chips.firmware_size(kind) {
            if cartridge.rom_size % alignment == size {
                cartridge.firmware_appended = true;
                cartridge.rom_size -= size;
            }
        }

        match kind {
            BoardKind::Spc7110 if cartridge.rom_size > 0x100000 => {
                cartridge.data_size = cartridge.rom_size - 0x100000;
                cartridge.rom_size = 0x100000;
            }
            BoardKind::SufamiTurboBios | BoardKind::SuperGameBoy { .. } => {
                cartridge.ram_size = 0;
            }
            _ => {}
        }

        debug!(
            "Heuristics: board={} region={} rom=0x{:x} ram=0x{:x} firmware_appended={}",
            cartridge.kind.name(),
            cartridge.region,
            cartridge.rom_size,
            cartridge.ram_size,
            cartridge.firmware_appended
        );
        Some(cartridge)
    }

    fn board_kind(image: &[u8], header: &Header<'_>) -> Option<BoardKind> {
        if image.starts_with(b"BANDAI SFC-ADX") {
            // Only the BIOS carries "SFC-ADX BACKUP"; game packs need the BIOS to run
            if image.get(16..30) == Some(&b"SFC-ADX BACKUP"[..]) {
                return Some(BoardKind::SufamiTurboBios);
            }
            debug!("Image is a Sufami Turbo game pack");
            return None;
        }

        let title = header.title_bytes();
        if title.starts_with(b"Satellaview BS-X") {
            return Some(BoardKind::SatellaviewBios);
        }
        if title.starts_with(b"Super GAMEBOY2") {
            return Some(BoardKind::SuperGameBoy { revision: 2 });
        }
        if title.starts_with(b"Super GAMEBOY") {
            return Some(BoardKind::SuperGameBoy { revision: 1 });
        }

        let mapper = header.mapper();
        let rom_type = header.rom_type();
        let kind = match (mapper, rom_type) {
            (0x20, 0x13 | 0x14 | 0x15 | 0x1a) => BoardKind::SuperFx,
            (0x23, 0x32 | 0x34 | 0x35) => BoardKind::Sa1,
            (0x32, 0x43 | 0x45) => BoardKind::Sdd1,
            (0x3a, 0xf5 | 0xf9) => BoardKind::Spc7110,
            _ => match header.offset() {
                header::LOROM if image.len() >= 0x401000 => BoardKind::ExLoRom,
                header::LOROM => BoardKind::LoRom,
                header::HIROM => BoardKind::HiRom,
                _ => BoardKind::ExHiRom,
            },
        };
        Some(kind)
    }

    fn chips(image_len: usize, header: &Header<'_>) -> Chips {
        let mapper = header.mapper();
        let rom_type = header.rom_type();
        let company = header.company();
        let mut chips = Chips::default();

        let dsp1 = matches!((mapper, rom_type), (0x20 | 0x21, 0x03) | (0x31, 0x03 | 0x05))
            || (mapper == 0x30 && rom_type == 0x05 && company != 0xb2);
        if dsp1 {
            chips.dsp1 = Some(match mapper & 0x2f {
                0x20 if image_len <= 0x100000 => Dsp1Map::LoRom1Mb,
                0x20 => Dsp1Map::LoRom2Mb,
                _ => Dsp1Map::HiRom,
            });
        }

        chips.dsp2 = mapper == 0x20 && rom_type == 0x05;
        chips.dsp3 = mapper == 0x30 && rom_type == 0x05 && company == 0xb2;
        chips.dsp4 = mapper == 0x30 && rom_type == 0x03;
        chips.cx4 = mapper == 0x20 && rom_type == 0xf3;
        chips.obc1 = mapper == 0x30 && rom_type == 0x25;
        chips.st010 = mapper == 0x30 && rom_type == 0xf6 && header.rom_size() >= 10;
        chips.st011 = mapper == 0x30 && rom_type == 0xf6 && header.rom_size() < 10;
        chips.st018 = mapper == 0x30 && rom_type == 0xf5;
        chips.sharp_rtc = mapper == 0x35 && rom_type == 0x55;
        chips.epson_rtc = mapper == 0x3a && rom_type == 0xf9;
        chips
    }

    fn ram_size(kind: BoardKind, header: &Header<'_>) -> usize {
        let exponent = match kind {
            BoardKind::SuperFx => header.expansion_ram_size(),
            _ => header.ram_size(),
        };
        let size = if exponent == 0 || exponent > 0x0c {
            0
        } else {
            1024usize << exponent
        };
        match kind {
            // Early GSU boards predate the extended header but all carry 32 KiB
            BoardKind::SuperFx if size == 0 => 0x8000,
            BoardKind::SatellaviewBios => 0x8000,
            _ => size,
        }
    }

    /// Build the board description
    pub fn document(&self) -> Document {
        board::synthesize(self)
    }
}

/// Decoder output consumed by the resolver
#[derive(Debug, Clone)]
pub struct HeuristicLayout {
    pub document: Document,
    pub region: Region,
    pub firmware_appended: bool,
}

/// Decode `image` into a board description, or `None` if unrecognized
pub fn decode(image: &[u8], has_msu1: bool) -> Option<HeuristicLayout> {
    let cartridge = SuperFamicomCartridge::analyze(image, has_msu1)?;
    Some(HeuristicLayout {
        document: cartridge.document(),
        region: cartridge.region,
        firmware_appended: cartridge.firmware_appended,
    })
}
