#![no_main]

use issueline_core::model::Issue;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Issue::from_json(text);
    }
});
