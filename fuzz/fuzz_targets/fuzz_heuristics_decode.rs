#![no_main]
use cartridge_import::core::heuristics;
use cartridge_import::scan;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(layout) = heuristics::decode(data, data.len() % 2 == 0) {
        // Synthesized boards always declare the program ROM first
        let segments = scan(&layout.document);
        assert_eq!(segments.first().map(|s| s.name.as_str()), Some("program.rom"));
    }
});
