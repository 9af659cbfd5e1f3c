//! Fuzz target for result validation.
//!
//! Arbitrary JSON is checked against a fixed config covering the common
//! control kinds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelconf::LabelInterface;

const CONFIG: &str = r#"<View>
  <Image name="image" value="$image"/>
  <Text name="text" value="$text"/>
  <RectangleLabels name="box" toName="image"><Label value="Car"/></RectangleLabels>
  <BrushLabels name="mask" toName="image"><Label value="Road"/></BrushLabels>
  <Choices name="choice" toName="text"><Choice value="A"/></Choices>
  <Taxonomy name="topic" toName="text"><Choice value="A"><Choice value="B"/></Choice></Taxonomy>
  <Labels name="ner" toName="text"><Label value="PER"/></Labels>
  <Rating name="stars" toName="text"/>
</View>"#;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(li) = LabelInterface::parse(CONFIG) {
        let _ = li.check_prediction(&payload);
    }
});
