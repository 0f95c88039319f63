//! Internal cartridge header location and scoring
//!
//! Super Famicom images carry a 64-byte header at one of three fixed
//! offsets depending on the memory map. Nothing in the image says which one
//! is real, and many dumps duplicate or corrupt it, so each candidate is
//! scored on how plausible its fields look and the best one wins.

/// Header offset for LoROM images
pub const LOROM: usize = 0x7fc0;
/// Header offset for HiROM images
pub const HIROM: usize = 0xffc0;
/// Header offset for ExHiROM images (> 32 Mbit)
pub const EXHIROM: usize = 0x40ffc0;

/// Size of the header block
pub const HEADER_SIZE: usize = 0x40;

// Field offsets relative to the header start
const TITLE: usize = 0x00;
const TITLE_LEN: usize = 21;
const MAPPER: usize = 0x15;
const ROM_TYPE: usize = 0x16;
const ROM_SIZE: usize = 0x17;
const RAM_SIZE: usize = 0x18;
const REGION: usize = 0x19;
const COMPANY: usize = 0x1a;
const VERSION: usize = 0x1b;
const COMPLEMENT: usize = 0x1c;
const CHECKSUM: usize = 0x1e;
const RESET_VECTOR: usize = 0x3c;

/// Company byte marking an extended header
pub const EXTENDED_HEADER: u8 = 0x33;

/// View of one candidate header inside an image
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    image: &'a [u8],
    offset: usize,
}

impl<'a> Header<'a> {
    /// Header at `offset`, if the image is large enough to contain it
    pub fn at(image: &'a [u8], offset: usize) -> Option<Self> {
        let end = offset.checked_add(HEADER_SIZE)?;
        (end <= image.len()).then_some(Header { image, offset })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn byte(&self, field: usize) -> u8 {
        self.image[self.offset + field]
    }

    fn word(&self, field: usize) -> u16 {
        u16::from_le_bytes([self.byte(field), self.byte(field + 1)])
    }

    /// Raw title bytes
    pub fn title_bytes(&self) -> &'a [u8] {
        &self.image[self.offset + TITLE..self.offset + TITLE + TITLE_LEN]
    }

    /// Title as text, trimmed
    pub fn title(&self) -> String {
        String::from_utf8_lossy(self.title_bytes())
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string()
    }

    /// Map mode byte, including the FastROM bit (0x10)
    pub fn mapper(&self) -> u8 {
        self.byte(MAPPER)
    }

    /// Chipset byte
    pub fn rom_type(&self) -> u8 {
        self.byte(ROM_TYPE)
    }

    /// Declared ROM size exponent
    pub fn rom_size(&self) -> u8 {
        self.byte(ROM_SIZE)
    }

    /// Declared RAM size exponent
    pub fn ram_size(&self) -> u8 {
        self.byte(RAM_SIZE)
    }

    pub fn region(&self) -> u8 {
        self.byte(REGION)
    }

    pub fn company(&self) -> u8 {
        self.byte(COMPANY)
    }

    pub fn version(&self) -> u8 {
        self.byte(VERSION)
    }

    pub fn checksum(&self) -> u16 {
        self.word(CHECKSUM)
    }

    pub fn complement(&self) -> u16 {
        self.word(COMPLEMENT)
    }

    pub fn reset_vector(&self) -> u16 {
        self.word(RESET_VECTOR)
    }

    /// Expansion RAM exponent from the extended header (SuperFX boards)
    pub fn expansion_ram_size(&self) -> u8 {
        // Extended header sits immediately before the standard one
        self.offset
            .checked_sub(3)
            .map(|at| self.image[at])
            .unwrap_or(0)
    }

    /// First opcode executed at reset, read from the bank holding the header
    pub fn reset_opcode(&self) -> Option<u8> {
        let at = (self.offset & !0x7fff) | (usize::from(self.reset_vector()) & 0x7fff);
        self.image.get(at).copied()
    }

    /// Plausibility score; higher is more likely to be the real header
    pub fn score(&self) -> u32 {
        // $00:0000-7fff is RAM and I/O, so reset must land in ROM
        if self.reset_vector() < 0x8000 {
            return 0;
        }

        let mut score: i32 = 0;
        if let Some(opcode) = self.reset_opcode() {
            score += opcode_weight(opcode);
        }

        let checksum = self.checksum();
        let complement = self.complement();
        if u32::from(checksum) + u32::from(complement) == 0xffff
            && checksum != 0
            && complement != 0
        {
            score += 4;
        }

        let mapper = self.mapper() & !0x10;
        match (self.offset, mapper) {
            (LOROM, 0x20) | (HIROM, 0x21) | (LOROM, 0x22) | (EXHIROM, 0x25) => score += 2,
            _ => {}
        }

        if self.company() == EXTENDED_HEADER {
            score += 2;
        }
        if self.rom_type() < 0x08 {
            score += 1;
        }
        if self.rom_size() < 0x10 {
            score += 1;
        }
        if self.ram_size() < 0x08 {
            score += 1;
        }
        if self.region() < 14 {
            score += 1;
        }

        score.max(0) as u32
    }
}

/// Weight of the first opcode executed at reset
fn opcode_weight(opcode: u8) -> i32 {
    match opcode {
        // sei, clc, sec, stz abs, jmp abs, jml long
        0x78 | 0x18 | 0x38 | 0x9c | 0x4c | 0x5c => 8,
        // rep, sep, lda/ldx/ldy abs, lda long, lda/ldx/ldy imm, jsr, jsl
        0xc2 | 0xe2 | 0xad | 0xae | 0xac | 0xaf | 0xa9 | 0xa2 | 0xa0 | 0x20 | 0x22 => 4,
        // rti, rts, rtl, cmp/cpx/cpy abs
        0x40 | 0x60 | 0x6b | 0xcd | 0xec | 0xcc => -4,
        // brk, cop, stp, wdm, sbc long,x
        0x00 | 0x02 | 0xdb | 0x42 | 0xff => -8,
        _ => 0,
    }
}

/// Score of the candidate at `offset`; 0 when out of bounds
pub fn score_at(image: &[u8], offset: usize) -> u32 {
    Header::at(image, offset).map(|h| h.score()).unwrap_or(0)
}

/// Pick the most plausible header
///
/// Ties favor LoROM, then HiROM. A nonzero ExHiROM score gets a bonus since
/// only images larger than 32 Mbit can contain that header at all.
pub fn locate(image: &[u8]) -> Option<Header<'_>> {
    let lo = score_at(image, LOROM);
    let hi = score_at(image, HIROM);
    let mut ex = score_at(image, EXHIROM);
    if ex > 0 {
        ex += 4;
    }

    let offset = if lo >= hi && lo >= ex {
        LOROM
    } else if hi >= ex {
        HIROM
    } else {
        EXHIROM
    };
    Header::at(image, offset)
}
