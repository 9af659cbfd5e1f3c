//! Fuzz target for the tag grammar walk.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    if let Ok(config) = std::str::from_utf8(data) {
        let _ = labelconf::validation::grammar::fuzz_check_config(config);
    }
});
