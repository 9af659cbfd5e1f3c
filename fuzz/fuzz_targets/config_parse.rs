//! Fuzz target for labeling config parsing.
//!
//! Feeds arbitrary text to the config parser and, when it parses, runs
//! validation and the derived exports, checking for panics or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelconf::LabelInterface;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    let Ok(config) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(li) = LabelInterface::parse(config) {
        let _ = li.validate();
        let _ = li.parsed_config();
        let _ = li.to_json_schema();
    }
});
