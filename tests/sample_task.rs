mod common;

use labelconf::{LabelInterface, SampleMode};

#[test]
fn sample_task_covers_every_variable() {
    let li = common::interface("image_bbox.xml");
    let task = li
        .generate_sample_task(SampleMode::Upload, false)
        .expect("sample");

    let keys: Vec<_> = task.keys().cloned().collect();
    let expected: Vec<_> = li.data_keys().into_iter().collect();
    assert_eq!(keys, expected);
}

#[test]
fn sample_task_feeds_load_task() {
    let li = common::interface("ner_text.xml");
    let task = li
        .generate_sample_task(SampleMode::Upload, false)
        .expect("sample");
    let loaded = li
        .load_task(&serde_json::Value::Object(task))
        .expect("load sample task");
    assert!(loaded
        .get_object(Some("text"))
        .expect("text")
        .loaded_data()
        .is_some());
}

#[test]
fn sample_predictions_validate_for_fixtures() {
    for name in ["image_bbox.xml", "ner_text.xml", "sentiment.xml"] {
        let li = common::interface(name);
        let prediction = li.generate_sample_prediction().expect("prediction");
        let report = li.check_prediction(&prediction);
        assert!(report.is_ok(), "{}:\n{}", name, report);

        let annotation = li.generate_sample_annotation().expect("annotation");
        assert!(li.validate_annotation(&annotation), "{}", name);
    }
}

#[test]
fn catalog_is_shared_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                LabelInterface::parse(r#"<View><Image name="i" value="$image"/></View>"#)
                    .expect("parse")
                    .generate_sample_task(SampleMode::Upload, false)
                    .expect("sample")
            })
        })
        .collect();

    let tasks: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    assert!(tasks.windows(2).all(|w| w[0] == w[1]));
}
