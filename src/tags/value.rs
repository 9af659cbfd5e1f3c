//! Result value shapes for every control variant.
//!
//! A value is accepted when (1) the variant's label key is present and its
//! labels are declared by the control, and (2) the payload deserializes into
//! the variant's shape struct and every numeric invariant holds. Geometry is in
//! percent of the object's size, so coordinates live in `[0, 100]`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{ControlKind, ControlTag};

/// Reasons a result value is rejected.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("value must be a JSON object")]
    NotAnObject,

    #[error("missing '{field}' in value")]
    MissingLabels { field: &'static str },

    #[error("'{field}' must be a list of strings")]
    LabelsNotStrings { field: &'static str },

    #[error("labels {labels:?} are not declared by the control (allowed: {allowed:?})")]
    UnknownLabels {
        labels: Vec<String>,
        allowed: Vec<String>,
    },

    #[error("value does not match the {kind} shape: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} = {value} is out of bounds [{min}, {max}]")]
    OutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: String, value: f64 },

    #[error("span start {start} is after end {end}")]
    InvertedSpan { start: f64, end: f64 },

    #[error("brush format must be 'rle', got '{0}'")]
    BrushFormat(String),

    #[error("RLE must have an even number of entries, got {0}")]
    RleOddLength(usize),

    #[error("RLE run count at index {index} must be > 0, got {count}")]
    RleEmptyRun { index: usize, count: i64 },

    #[error("polygon must have at least one point")]
    EmptyPolygon,

    #[error("taxonomy path {index} is empty")]
    EmptyTaxonomyPath { index: usize },

    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },

    #[error("selected must be 'left' or 'right', got '{0}'")]
    PairwiseSelection(String),
}

pub(crate) fn check_value(control: &ControlTag, value: &Value) -> Result<(), ValueError> {
    let object = value.as_object().ok_or(ValueError::NotAnObject)?;

    if let Some(field) = control.variant.label_attr() {
        let raw = object
            .get(field)
            .ok_or(ValueError::MissingLabels { field })?;
        let labels = collect_labels(control.variant, field, raw)?;
        let unknown = control.undeclared_labels(&labels);
        if !unknown.is_empty() {
            return Err(ValueError::UnknownLabels {
                labels: unknown,
                allowed: control.labels.clone(),
            });
        }
    }

    check_shape(control, value)
}

/// Flattens the label payload; taxonomy values are lists of paths.
fn collect_labels(
    variant: ControlKind,
    field: &'static str,
    raw: &Value,
) -> Result<Vec<String>, ValueError> {
    let items = raw
        .as_array()
        .ok_or(ValueError::LabelsNotStrings { field })?;

    let mut out = Vec::new();
    for item in items {
        match (variant, item) {
            (ControlKind::Taxonomy, Value::Array(path)) => {
                for node in path {
                    let label = node.as_str().ok_or(ValueError::LabelsNotStrings { field })?;
                    out.push(label.to_string());
                }
            }
            (ControlKind::Taxonomy, _) => return Err(ValueError::LabelsNotStrings { field }),
            (_, Value::String(label)) => out.push(label.clone()),
            _ => return Err(ValueError::LabelsNotStrings { field }),
        }
    }
    Ok(out)
}

fn parse<T: DeserializeOwned>(kind: ControlKind, value: &Value) -> Result<T, ValueError> {
    serde_json::from_value(value.clone()).map_err(|source| ValueError::Shape {
        kind: kind.name(),
        source,
    })
}

fn check_shape(control: &ControlTag, value: &Value) -> Result<(), ValueError> {
    let kind = control.variant;
    match kind {
        ControlKind::Choices => parse::<ChoicesValue>(kind, value).map(drop),
        ControlKind::Labels => parse::<SpanValue>(kind, value)?.check(),
        ControlKind::HyperTextLabels => parse::<HyperTextSpanValue>(kind, value)?.check(),
        ControlKind::ParagraphLabels => parse::<ParagraphSpanValue>(kind, value)?.check(),
        ControlKind::TimeSeriesLabels => parse::<TimeSeriesSpanValue>(kind, value)?.check(),
        ControlKind::Rectangle | ControlKind::RectangleLabels => {
            parse::<RectangleValue>(kind, value)?.check()
        }
        ControlKind::Polygon | ControlKind::PolygonLabels => {
            parse::<PolygonValue>(kind, value)?.check()
        }
        ControlKind::Ellipse | ControlKind::EllipseLabels => {
            parse::<EllipseValue>(kind, value)?.check()
        }
        ControlKind::KeyPoint | ControlKind::KeyPointLabels => {
            parse::<KeyPointValue>(kind, value)?.check()
        }
        ControlKind::Brush | ControlKind::BrushLabels => parse::<BrushValue>(kind, value)?.check(),
        ControlKind::VideoRectangle => parse::<VideoRectangleValue>(kind, value)?.check(),
        ControlKind::Number => parse::<NumberValue>(kind, value)?.check(control),
        ControlKind::DateTime => parse::<DateTimeValue>(kind, value)?.check(),
        ControlKind::Pairwise => parse::<PairwiseValue>(kind, value)?.check(),
        ControlKind::Ranker => parse::<RankerValue>(kind, value).map(drop),
        ControlKind::Rating => parse::<RatingValue>(kind, value)?.check(control),
        ControlKind::Taxonomy => parse::<TaxonomyValue>(kind, value)?.check(),
        ControlKind::TextArea => parse::<TextAreaValue>(kind, value).map(drop),
        ControlKind::Relations | ControlKind::Generic => Ok(()),
    }
}

fn in_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValueError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ValueError::OutOfBounds {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}

fn percent(field: &str, value: f64) -> Result<(), ValueError> {
    in_range(field, value, 0.0, 100.0)
}

fn degrees(field: &str, value: f64) -> Result<(), ValueError> {
    in_range(field, value, 0.0, 360.0)
}

fn non_negative(field: &str, value: f64) -> Result<(), ValueError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValueError::Negative {
            field: field.to_string(),
            value,
        })
    }
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChoicesValue {
    #[allow(dead_code)]
    choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyValue {
    taxonomy: Vec<Vec<String>>,
}

impl TaxonomyValue {
    fn check(&self) -> Result<(), ValueError> {
        match self.taxonomy.iter().position(Vec::is_empty) {
            Some(index) => Err(ValueError::EmptyTaxonomyPath { index }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextAreaText {
    One(#[allow(dead_code)] String),
    Many(#[allow(dead_code)] Vec<String>),
}

#[derive(Debug, Deserialize)]
struct TextAreaValue {
    #[allow(dead_code)]
    text: TextAreaText,
}

#[derive(Debug, Deserialize)]
struct NumberValue {
    number: f64,
}

impl NumberValue {
    fn check(&self, control: &ControlTag) -> Result<(), ValueError> {
        let min = control.numeric_attr("min").unwrap_or(f64::MIN);
        let max = control.numeric_attr("max").unwrap_or(f64::MAX);
        in_range("number", self.number, min, max)
    }
}

#[derive(Debug, Deserialize)]
struct DateTimeValue {
    datetime: String,
}

impl DateTimeValue {
    fn check(&self) -> Result<(), ValueError> {
        if self.datetime.trim().is_empty() {
            return Err(ValueError::Empty { field: "datetime" });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PairwiseValue {
    selected: String,
}

impl PairwiseValue {
    fn check(&self) -> Result<(), ValueError> {
        match self.selected.as_str() {
            "left" | "right" => Ok(()),
            other => Err(ValueError::PairwiseSelection(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RankerItems {
    Flat(#[allow(dead_code)] Vec<String>),
    Buckets(#[allow(dead_code)] BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Deserialize)]
struct RankerValue {
    #[allow(dead_code)]
    ranker: RankerItems,
}

#[derive(Debug, Deserialize)]
struct RatingValue {
    rating: i64,
}

impl RatingValue {
    fn check(&self, control: &ControlTag) -> Result<(), ValueError> {
        in_range(
            "rating",
            self.rating as f64,
            0.0,
            control.max_rating() as f64,
        )
    }
}

// ============================================================================
// Spans
// ============================================================================

/// A span endpoint: a character/sample offset or an XPath-like string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpanPoint {
    Offset(f64),
    Path(#[allow(dead_code)] String),
}

impl SpanPoint {
    fn offset(&self) -> Option<f64> {
        match self {
            SpanPoint::Offset(v) => Some(*v),
            SpanPoint::Path(_) => None,
        }
    }
}

fn check_span(start: &SpanPoint, end: &SpanPoint) -> Result<(), ValueError> {
    if let Some(start) = start.offset() {
        non_negative("start", start)?;
    }
    if let Some(end) = end.offset() {
        non_negative("end", end)?;
    }
    if let (Some(start), Some(end)) = (start.offset(), end.offset()) {
        if start > end {
            return Err(ValueError::InvertedSpan { start, end });
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SpanValue {
    start: SpanPoint,
    end: SpanPoint,
    #[serde(default)]
    #[allow(dead_code)]
    text: Option<String>,
}

impl SpanValue {
    fn check(&self) -> Result<(), ValueError> {
        check_span(&self.start, &self.end)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HyperTextSpanValue {
    #[allow(dead_code)]
    start: String,
    #[allow(dead_code)]
    end: String,
    start_offset: f64,
    end_offset: f64,
}

impl HyperTextSpanValue {
    fn check(&self) -> Result<(), ValueError> {
        non_negative("startOffset", self.start_offset)?;
        non_negative("endOffset", self.end_offset)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParagraphSpanValue {
    start: SpanPoint,
    end: SpanPoint,
    #[serde(default)]
    start_offset: Option<f64>,
    #[serde(default)]
    end_offset: Option<f64>,
}

impl ParagraphSpanValue {
    fn check(&self) -> Result<(), ValueError> {
        if let Some(v) = self.start_offset {
            non_negative("startOffset", v)?;
        }
        if let Some(v) = self.end_offset {
            non_negative("endOffset", v)?;
        }
        // Paragraph indices can legitimately be given out of order when the
        // selection spans backwards, so only the sign is checked here.
        if let Some(v) = self.start.offset() {
            non_negative("start", v)?;
        }
        if let Some(v) = self.end.offset() {
            non_negative("end", v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TimeSeriesSpanValue {
    start: SpanPoint,
    end: SpanPoint,
    #[serde(default)]
    #[allow(dead_code)]
    instant: Option<bool>,
}

impl TimeSeriesSpanValue {
    fn check(&self) -> Result<(), ValueError> {
        match (self.start.offset(), self.end.offset()) {
            (Some(start), Some(end)) if start > end => {
                Err(ValueError::InvertedSpan { start, end })
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Deserialize)]
struct RectangleValue {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    rotation: f64,
}

impl RectangleValue {
    fn check(&self) -> Result<(), ValueError> {
        percent("x", self.x)?;
        percent("y", self.y)?;
        percent("width", self.width)?;
        percent("height", self.height)?;
        degrees("rotation", self.rotation)
    }
}

#[derive(Debug, Deserialize)]
struct PolygonValue {
    points: Vec<[f64; 2]>,
    #[serde(default)]
    #[allow(dead_code)]
    closed: Option<bool>,
}

impl PolygonValue {
    fn check(&self) -> Result<(), ValueError> {
        if self.points.is_empty() {
            return Err(ValueError::EmptyPolygon);
        }
        for (idx, [x, y]) in self.points.iter().enumerate() {
            percent(&format!("points[{idx}].x"), *x)?;
            percent(&format!("points[{idx}].y"), *y)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EllipseValue {
    x: f64,
    y: f64,
    radius_x: f64,
    radius_y: f64,
    #[serde(default)]
    rotation: f64,
}

impl EllipseValue {
    fn check(&self) -> Result<(), ValueError> {
        percent("x", self.x)?;
        percent("y", self.y)?;
        percent("radiusX", self.radius_x)?;
        percent("radiusY", self.radius_y)?;
        degrees("rotation", self.rotation)
    }
}

#[derive(Debug, Deserialize)]
struct KeyPointValue {
    x: f64,
    y: f64,
    #[serde(default)]
    width: Option<f64>,
}

impl KeyPointValue {
    fn check(&self) -> Result<(), ValueError> {
        percent("x", self.x)?;
        percent("y", self.y)?;
        if let Some(width) = self.width {
            non_negative("width", width)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct BrushValue {
    format: String,
    rle: Vec<i64>,
}

impl BrushValue {
    fn check(&self) -> Result<(), ValueError> {
        if self.format != "rle" {
            return Err(ValueError::BrushFormat(self.format.clone()));
        }
        if self.rle.len() % 2 != 0 {
            return Err(ValueError::RleOddLength(self.rle.len()));
        }
        // Entries alternate (value, run length); every run must be non-empty.
        for (index, &count) in self.rle.iter().enumerate().skip(1).step_by(2) {
            if count <= 0 {
                return Err(ValueError::RleEmptyRun { index, count });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct VideoFrame {
    frame: u64,
    #[serde(default)]
    #[allow(dead_code)]
    enabled: Option<bool>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    time: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRectangleValue {
    sequence: Vec<VideoFrame>,
    #[serde(default)]
    #[allow(dead_code)]
    frames_count: Option<u64>,
    #[serde(default)]
    duration: Option<f64>,
}

impl VideoRectangleValue {
    fn check(&self) -> Result<(), ValueError> {
        for frame in &self.sequence {
            let at = |field: &str| format!("sequence[frame={}].{field}", frame.frame);
            percent(&at("x"), frame.x)?;
            percent(&at("y"), frame.y)?;
            percent(&at("width"), frame.width)?;
            percent(&at("height"), frame.height)?;
            degrees(&at("rotation"), frame.rotation)?;
            if let Some(time) = frame.time {
                non_negative(&at("time"), time)?;
            }
        }
        if let Some(duration) = self.duration {
            non_negative("duration", duration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn control(kind: &str, labels: &[&str], extra: &[(&str, &str)]) -> ControlTag {
        let mut attrs: BTreeMap<String, String> = BTreeMap::new();
        attrs.insert("name".into(), "ctl".into());
        attrs.insert("toName".into(), "obj".into());
        for (k, v) in extra {
            attrs.insert(k.to_string(), v.to_string());
        }
        let variant = ControlKind::from_tag_name(&kind.to_lowercase()).unwrap_or(ControlKind::Generic);
        let mut tag = ControlTag::from_attributes(kind, variant, attrs);
        tag.labels = labels.iter().map(|l| l.to_string()).collect();
        tag
    }

    #[test]
    fn brush_rle_even_length_is_valid() {
        let tag = control("Brush", &[], &[]);
        assert!(tag.validate_value(&json!({"format": "rle", "rle": [2, 3, 3, 2]})));
    }

    #[test]
    fn brush_rle_odd_length_is_invalid() {
        let tag = control("Brush", &[], &[]);
        let err = tag
            .check_value(&json!({"format": "rle", "rle": [1, 2, 3]}))
            .expect_err("odd length");
        assert!(matches!(err, ValueError::RleOddLength(3)));
    }

    #[test]
    fn brush_rle_zero_run_is_invalid() {
        let tag = control("Brush", &[], &[]);
        let err = tag
            .check_value(&json!({"format": "rle", "rle": [5, 0]}))
            .expect_err("empty run");
        assert!(matches!(err, ValueError::RleEmptyRun { index: 1, count: 0 }));
    }

    #[test]
    fn brush_labels_requires_declared_label() {
        let tag = control("BrushLabels", &["Road"], &[]);
        assert!(tag.validate_value(&json!({"format": "rle", "rle": [1, 1], "brushlabels": ["Road"]})));
        assert!(!tag.validate_value(&json!({"format": "rle", "rle": [1, 1], "brushlabels": ["Sky"]})));
        assert!(!tag.validate_value(&json!({"format": "rle", "rle": [1, 1]})));
    }

    #[test]
    fn rectangle_out_of_bounds_names_the_field() {
        let tag = control("RectangleLabels", &["Car"], &[]);
        let err = tag
            .check_value(&json!({
                "x": 150, "y": 10, "width": 10, "height": 10,
                "rectanglelabels": ["Car"]
            }))
            .expect_err("x out of bounds");
        assert_eq!(err.to_string(), "x = 150 is out of bounds [0, 100]");
    }

    #[test]
    fn rectangle_rotation_is_bounded() {
        let tag = control("Rectangle", &[], &[]);
        assert!(tag.validate_value(&json!({"x": 1, "y": 1, "width": 5, "height": 5, "rotation": 359.5})));
        assert!(!tag.validate_value(&json!({"x": 1, "y": 1, "width": 5, "height": 5, "rotation": 400})));
    }

    #[test]
    fn rectangle_missing_field_is_shape_error() {
        let tag = control("Rectangle", &[], &[]);
        let err = tag
            .check_value(&json!({"x": 1, "y": 1, "width": 5}))
            .expect_err("missing height");
        assert!(matches!(err, ValueError::Shape { kind: "Rectangle", .. }));
    }

    #[test]
    fn taxonomy_paths_subset_of_labels() {
        let tag = control("Taxonomy", &["A", "B"], &[]);
        assert!(tag.validate_value(&json!({"taxonomy": [["A"], ["A", "B"]]})));
        assert!(!tag.validate_value(&json!({"taxonomy": [["Invalid"]]})));
    }

    #[test]
    fn taxonomy_rejects_empty_path() {
        let tag = control("Taxonomy", &["A"], &[]);
        let err = tag
            .check_value(&json!({"taxonomy": [["A"], []]}))
            .expect_err("empty path");
        assert!(matches!(err, ValueError::EmptyTaxonomyPath { index: 1 }));
    }

    #[test]
    fn rating_respects_max_rating() {
        let tag = control("Rating", &[], &[("maxRating", "10")]);
        assert!(tag.validate_value(&json!({"rating": 10})));
        assert!(!tag.validate_value(&json!({"rating": 11})));
        assert!(!tag.validate_value(&json!({"rating": -1})));
        assert!(!tag.validate_value(&json!({"rating": 2.5})));
    }

    #[test]
    fn number_respects_min_max() {
        let tag = control("Number", &[], &[("min", "0"), ("max", "10")]);
        assert!(tag.validate_value(&json!({"number": 3.5})));
        assert!(!tag.validate_value(&json!({"number": 11})));
    }

    #[test]
    fn labels_span_rejects_inverted_offsets() {
        let tag = control("Labels", &["PER"], &[]);
        assert!(tag.validate_value(&json!({"start": 0, "end": 5, "labels": ["PER"], "text": "Alice"})));
        assert!(!tag.validate_value(&json!({"start": 6, "end": 5, "labels": ["PER"]})));
        assert!(!tag.validate_value(&json!({"start": -1, "end": 5, "labels": ["PER"]})));
    }

    #[test]
    fn dynamic_choices_skip_label_subset() {
        let tag = control("Choices", &[], &[("value", "$options")]);
        assert!(tag.validate_value(&json!({"choices": ["anything"]})));
    }

    #[test]
    fn static_choices_reject_unknown_label() {
        let tag = control("Choices", &["Positive", "Negative"], &[]);
        assert!(tag.validate_value(&json!({"choices": ["Positive"]})));
        let err = tag
            .check_value(&json!({"choices": ["Maybe"]}))
            .expect_err("unknown label");
        assert!(matches!(err, ValueError::UnknownLabels { .. }));
    }

    #[test]
    fn pairwise_and_textarea_shapes() {
        let pairwise = control("Pairwise", &[], &[]);
        assert!(pairwise.validate_value(&json!({"selected": "left"})));
        assert!(!pairwise.validate_value(&json!({"selected": "up"})));

        let textarea = control("TextArea", &[], &[]);
        assert!(textarea.validate_value(&json!({"text": "one"})));
        assert!(textarea.validate_value(&json!({"text": ["one", "two"]})));
        assert!(!textarea.validate_value(&json!({"text": 5})));
    }

    #[test]
    fn polygon_points_in_bounds() {
        let tag = control("Polygon", &[], &[]);
        assert!(tag.validate_value(&json!({"points": [[1, 2], [30, 40], [50, 2]]})));
        assert!(!tag.validate_value(&json!({"points": [[1, 2], [101, 40]]})));
        assert!(!tag.validate_value(&json!({"points": []})));
    }

    #[test]
    fn video_rectangle_sequence_is_checked() {
        let tag = control("VideoRectangle", &[], &[]);
        let ok = json!({
            "framesCount": 100,
            "sequence": [{"frame": 1, "enabled": true, "x": 1, "y": 1, "width": 10, "height": 10, "time": 0.04}]
        });
        let bad = json!({
            "sequence": [{"frame": 1, "x": 1, "y": 1, "width": 120, "height": 10}]
        });
        assert!(tag.validate_value(&ok));
        assert!(!tag.validate_value(&bad));
    }

    #[test]
    fn generic_control_accepts_any_object() {
        let tag = control("CustomWidget", &[], &[]);
        assert!(tag.validate_value(&json!({"whatever": [1, 2, 3]})));
        assert!(!tag.validate_value(&json!("not an object")));
    }
}
