#![no_main]
use jxml::{json_to_xml, IndentStyle, Options};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = json_to_xml(s, &Options::default());
        let _ = json_to_xml(s, &Options::default().indent(IndentStyle::Tab));
    }
});
