#![no_main]
use cartridge_import::Document;
use libfuzzer_sys::fuzz_target;

// Malformed markup must be rejected without panicking, and anything accepted
// must serialize to markup that parses again
fuzz_target!(|data: &[u8]| {
    let text = match std::str::from_utf8(data) {
        Ok(text) => text,
        Err(_) => return,
    };

    let doc = match Document::parse(text) {
        Ok(doc) => doc,
        Err(_) => return,
    };

    let reparsed = Document::parse(&doc.to_markup()).expect("writer output parses");
    assert_eq!(reparsed.len(), doc.len());
});
