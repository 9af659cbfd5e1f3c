#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use labelconf::LabelInterface;
use serde_json::Value;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("read fixture")
}

pub fn interface(name: &str) -> LabelInterface {
    LabelInterface::parse(&read_fixture(name)).expect("parse fixture config")
}

pub fn json_fixture(name: &str) -> Value {
    serde_json::from_str(&read_fixture(name)).expect("parse fixture json")
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}
