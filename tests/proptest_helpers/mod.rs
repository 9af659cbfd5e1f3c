#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Label vocabulary used by the generated configs.
pub const LABELS: [&str; 4] = ["Cat", "Dog", "Bird", "Fish"];

pub fn rectangle_config() -> String {
    let labels: String = LABELS
        .iter()
        .map(|l| format!(r#"<Label value="{}"/>"#, l))
        .collect();
    format!(
        r#"<View><Image name="image" value="$image"/><RectangleLabels name="box" toName="image">{}</RectangleLabels></View>"#,
        labels
    )
}

/// A coordinate in percent, inside `[0, 100]`.
pub fn arb_percent() -> impl Strategy<Value = f64> {
    0.0f64..=100.0
}

/// A coordinate outside `[0, 100]`.
pub fn arb_out_of_bounds() -> impl Strategy<Value = f64> {
    prop_oneof![-1000.0f64..-0.001, 100.001f64..1000.0]
}

/// A well-formed RLE: (value, run length) pairs with positive runs.
pub fn arb_valid_rle() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec((0i64..=255, 1i64..10_000), 0..32)
        .prop_map(|pairs| pairs.into_iter().flat_map(|(v, n)| [v, n]).collect())
}

/// A non-empty subset of [`LABELS`].
pub fn arb_declared_labels() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(LABELS.to_vec(), 1..=LABELS.len())
        .prop_map(|labels| labels.into_iter().map(str::to_string).collect())
}

/// A label that is not in [`LABELS`].
pub fn arb_undeclared_label() -> impl Strategy<Value = String> {
    "[a-z]{1,12}".prop_filter("must not be declared", |l| {
        !LABELS.iter().any(|known| known == l)
    })
}
