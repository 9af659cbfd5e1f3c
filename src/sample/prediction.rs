//! Sample annotations and predictions that satisfy the config.

use serde_json::{json, Map, Value};

use crate::config::LabelInterface;
use crate::error::LabelConfigError;
use crate::region::Region;
use crate::tags::{ControlKind, ControlTag};

impl LabelInterface {
    /// A prediction with one sample region per control that targets a
    /// resolved object.
    pub fn generate_sample_prediction(&self) -> Result<Value, LabelConfigError> {
        self.create_prediction(&self.sample_regions(), None, Some("sample"))
    }

    /// Like [`generate_sample_prediction`](Self::generate_sample_prediction),
    /// shaped as an annotation.
    pub fn generate_sample_annotation(&self) -> Result<Value, LabelConfigError> {
        self.create_annotation(&self.sample_regions())
    }

    fn sample_regions(&self) -> Vec<Region> {
        self.controls()
            .iter()
            .filter_map(|control| {
                let target = control.objects.first()?;
                let value = sample_value(control)?;
                Some(control.region_for(target.clone(), value))
            })
            .collect()
    }
}

/// A value that passes the control's own value check, or `None` when the
/// control has no sample (no declared labels, relations, unknown kinds).
fn sample_value(control: &ControlTag) -> Option<Value> {
    let mut value = match control.variant {
        ControlKind::Choices | ControlKind::Taxonomy => Map::new(),
        ControlKind::Labels => object(json!({"start": 0, "end": 5})),
        ControlKind::Rectangle | ControlKind::RectangleLabels => {
            object(json!({"x": 10, "y": 10, "width": 30, "height": 20, "rotation": 0}))
        }
        ControlKind::Polygon | ControlKind::PolygonLabels => {
            object(json!({"points": [[10, 10], [40, 10], [25, 35]], "closed": true}))
        }
        ControlKind::Ellipse | ControlKind::EllipseLabels => {
            object(json!({"x": 50, "y": 50, "radiusX": 10, "radiusY": 5, "rotation": 0}))
        }
        ControlKind::KeyPoint | ControlKind::KeyPointLabels => {
            object(json!({"x": 50, "y": 50, "width": 1}))
        }
        ControlKind::Brush | ControlKind::BrushLabels => {
            object(json!({"format": "rle", "rle": [0, 4, 255, 4]}))
        }
        ControlKind::HyperTextLabels => object(json!({
            "start": "/div[1]/p[1]/text()[1]",
            "end": "/div[1]/p[1]/text()[1]",
            "startOffset": 0,
            "endOffset": 6
        })),
        ControlKind::ParagraphLabels => {
            object(json!({"start": 0, "end": 0, "startOffset": 0, "endOffset": 2}))
        }
        ControlKind::TimeSeriesLabels => {
            object(json!({"start": 0, "end": 10, "instant": false}))
        }
        ControlKind::VideoRectangle => object(json!({
            "sequence": [{
                "frame": 1, "enabled": true, "time": 0.0,
                "x": 10, "y": 10, "width": 30, "height": 20, "rotation": 0
            }],
            "framesCount": 1,
            "duration": 1.0
        })),
        ControlKind::Number => object(json!({"number": sample_number(control)})),
        ControlKind::DateTime => object(json!({"datetime": "2024-01-01T00:00"})),
        ControlKind::Pairwise => object(json!({"selected": "left"})),
        ControlKind::Ranker => object(json!({"ranker": []})),
        ControlKind::Rating => object(json!({"rating": control.max_rating().min(1)})),
        ControlKind::TextArea => object(json!({"text": ["Sample text"]})),
        ControlKind::Relations | ControlKind::Generic => return None,
    };

    if let Some(field) = control.variant.label_attr() {
        let label = control.labels.first()?;
        let labels = match control.variant {
            ControlKind::Taxonomy => json!([[label]]),
            _ => json!([label]),
        };
        value.insert(field.to_string(), labels);
    }

    Some(Value::Object(value))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The lowest accepted number, or 0 when unbounded below.
fn sample_number(control: &ControlTag) -> f64 {
    match (control.numeric_attr("min"), control.numeric_attr("max")) {
        (Some(min), _) => min,
        (None, Some(max)) if max < 0.0 => max,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"<View>
      <Image name="image" value="$image"/>
      <Text name="text" value="$text"/>
      <RectangleLabels name="box" toName="image"><Label value="Car"/></RectangleLabels>
      <BrushLabels name="mask" toName="image"><Label value="Road"/></BrushLabels>
      <Choices name="sentiment" toName="text"><Choice value="Positive"/></Choices>
      <Taxonomy name="topic" toName="text"><Choice value="Science"/></Taxonomy>
      <Labels name="ner" toName="text"><Label value="PER"/></Labels>
      <Number name="score" toName="text" min="3" max="7"/>
      <Rating name="stars" toName="text" maxRating="10"/>
      <TextArea name="summary" toName="text"/>
      <Choices name="dynamic" toName="text" value="$options"/>
      <Relations><Relation value="refers"/></Relations>
    </View>"#;

    #[test]
    fn sample_prediction_validates() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let prediction = li.generate_sample_prediction().expect("prediction");
        let report = li.check_prediction(&prediction);
        assert!(report.is_ok(), "{}", report);
        assert_eq!(prediction["model_version"], json!("sample"));
    }

    #[test]
    fn controls_without_labels_are_skipped() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        let annotation = li.generate_sample_annotation().expect("annotation");
        let from_names: Vec<_> = annotation["result"]
            .as_array()
            .expect("result")
            .iter()
            .map(|r| r["from_name"].as_str().expect("from_name").to_string())
            .collect();
        assert!(!from_names.contains(&"dynamic".to_string()));
        assert!(from_names.contains(&"box".to_string()));
        assert_eq!(from_names.len(), 8);
    }

    #[test]
    fn number_sample_respects_bounds() {
        let li = LabelInterface::parse(CONFIG).expect("parse");
        assert_eq!(sample_number(li.get_control(Some("score")).expect("score")), 3.0);
    }
}
